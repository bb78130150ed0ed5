//! Moltbook API Client
//!
//! Communicates with the Moltbook REST API using bearer-token auth.
//! Response shapes vary between endpoints (some wrap payloads, some
//! don't), so parsing goes through `serde_json::Value` with fallbacks.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::types::{FeedComment, FeedPost, PlatformClient, Profile};

/// Moltbook API client. One long-lived instance per run.
pub struct MoltbookClient {
    pub api_url: String,
    api_token: String,
    http: Client,
}

impl MoltbookClient {
    pub fn new(api_url: String, api_token: String) -> Self {
        Self {
            api_url,
            api_token,
            http: Client::new(),
        }
    }

    /// Internal helper: send an HTTP request to the Moltbook API and
    /// return JSON. Non-2xx responses become errors carrying the status
    /// and body so failure records stay informative.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.api_url, path);

        let mut builder = match method {
            "GET" => self.http.get(&url),
            "POST" => self.http.post(&url),
            "DELETE" => self.http.delete(&url),
            _ => self.http.get(&url),
        };

        builder = builder
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_token));

        if let Some(b) = body {
            builder = builder.json(&b);
        }

        let resp = builder
            .send()
            .await
            .with_context(|| format!("Moltbook request failed: {} {}", method, path))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "Moltbook API error: {} {} -> {}: {}",
                method,
                path,
                status.as_u16(),
                text
            );
        }

        if status.as_u16() == 204 {
            return Ok(serde_json::json!({ "success": true }));
        }

        let json: Value = resp
            .json()
            .await
            .with_context(|| format!("Moltbook returned non-JSON: {} {}", method, path))?;
        Ok(json)
    }
}

#[async_trait]
impl PlatformClient for MoltbookClient {
    async fn get_feed(&self, limit: u32) -> Result<Vec<FeedPost>> {
        let result = self
            .request("GET", &format!("/posts?sort=hot&limit={}", limit), None)
            .await?;

        let posts = if result.is_array() {
            result.as_array().cloned().unwrap_or_default()
        } else {
            result["posts"].as_array().cloned().unwrap_or_default()
        };

        Ok(posts.iter().map(parse_post).collect())
    }

    async fn get_post(&self, post_id: &str) -> Result<FeedPost> {
        let result = self
            .request("GET", &format!("/posts/{}", post_id), None)
            .await?;

        let post = if result["post"].is_object() {
            &result["post"]
        } else {
            &result
        };
        Ok(parse_post(post))
    }

    async fn get_comments(&self, post_id: &str) -> Result<Vec<FeedComment>> {
        let result = self
            .request("GET", &format!("/posts/{}/comments", post_id), None)
            .await?;

        let comments = if result.is_array() {
            result.as_array().cloned().unwrap_or_default()
        } else {
            result["comments"].as_array().cloned().unwrap_or_default()
        };

        Ok(comments.iter().map(parse_comment).collect())
    }

    /// Create a post; returns the new post id.
    async fn create_post(&self, title: &str, content: &str, submolt: &str) -> Result<String> {
        let body = serde_json::json!({
            "title": title,
            "content": content,
            "submolt": submolt,
        });

        let result = self.request("POST", "/posts", Some(body)).await?;

        let post_id = result["post"]["id"]
            .as_str()
            .or_else(|| result["id"].as_str())
            .unwrap_or("created")
            .to_string();
        Ok(post_id)
    }

    async fn create_comment(&self, post_id: &str, content: &str) -> Result<()> {
        let body = serde_json::json!({ "content": content });
        self.request("POST", &format!("/posts/{}/comments", post_id), Some(body))
            .await?;
        Ok(())
    }

    async fn upvote_post(&self, post_id: &str) -> Result<()> {
        self.request("POST", &format!("/posts/{}/upvote", post_id), None)
            .await?;
        Ok(())
    }

    async fn follow_agent(&self, handle: &str) -> Result<()> {
        self.request("POST", &format!("/agents/{}/follow", handle), None)
            .await?;
        Ok(())
    }

    async fn get_profile(&self) -> Result<Profile> {
        let result = self.request("GET", "/agents/me", None).await?;

        let agent = if result["agent"].is_object() {
            &result["agent"]
        } else {
            &result
        };

        Ok(Profile {
            name: agent["name"].as_str().unwrap_or("").to_string(),
            karma: agent["karma"].as_i64().unwrap_or(0),
            follower_count: agent["follower_count"]
                .as_u64()
                .or_else(|| agent["followerCount"].as_u64())
                .unwrap_or(0),
        })
    }
}

/// Parse a post object. The author arrives either as a nested object
/// with a `name` field or as a bare string.
fn parse_post(p: &Value) -> FeedPost {
    let author = p["author"]["name"]
        .as_str()
        .or_else(|| p["author"].as_str())
        .unwrap_or("?")
        .to_string();

    FeedPost {
        id: p["id"].as_str().unwrap_or("").to_string(),
        title: p["title"].as_str().unwrap_or("").to_string(),
        author,
        upvotes: p["upvotes"].as_u64().unwrap_or(0),
        comment_count: p["comment_count"]
            .as_u64()
            .or_else(|| p["commentCount"].as_u64())
            .unwrap_or(0),
        content: p["content"].as_str().unwrap_or("").to_string(),
    }
}

fn parse_comment(c: &Value) -> FeedComment {
    let author = c["author"]["name"]
        .as_str()
        .or_else(|| c["author"].as_str())
        .unwrap_or("?")
        .to_string();

    FeedComment {
        author,
        content: c["content"].as_str().unwrap_or("").to_string(),
    }
}
