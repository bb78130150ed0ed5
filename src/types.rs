//! Moltbot - Type Definitions
//!
//! Shared types for the autonomous posting agent: actions, decisions,
//! governance verdicts, and the collaborator traits for the platform
//! and inference clients.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ─── Actions ─────────────────────────────────────────────────────

/// The five things the agent can do in a cycle.
///
/// Anything the model emits outside this set deserializes to `Wait`,
/// so an off-script decision can never become an off-script API call.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Post,
    Comment,
    Upvote,
    Follow,
    #[serde(other)]
    Wait,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Post => "post",
            ActionKind::Comment => "comment",
            ActionKind::Upvote => "upvote",
            ActionKind::Follow => "follow",
            ActionKind::Wait => "wait",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the action ledger: what was attempted and how it went.
/// Immutable once appended. Insertion order is the only temporal signal
/// the governor consults; the timestamp exists for external reporting.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub kind: ActionKind,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl ActionRecord {
    pub fn success(kind: ActionKind, target: Option<&str>, excerpt: Option<&str>) -> Self {
        Self {
            kind,
            success: true,
            target: target.map(|t| t.to_string()),
            excerpt: excerpt.map(|e| truncate_chars(e, 50)),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn failure(kind: ActionKind, target: Option<&str>, error: &str) -> Self {
        Self {
            kind,
            success: false,
            target: target.map(|t| t.to_string()),
            excerpt: None,
            error: Some(truncate_chars(error, 50)),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Truncate to at most `max` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// ─── Decisions ───────────────────────────────────────────────────

/// The model's decision for one cycle. Optional fields are only
/// meaningful for the action kinds that need them; `PlannedAction`
/// is where presence gets enforced.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    #[serde(default)]
    pub reasoning: String,
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submolt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_handle: Option<String>,
}

/// A decision normalized against its required fields.
///
/// A `Decision` whose fields do not match its action kind collapses to
/// `Wait` here rather than erroring; a half-formed decision is treated
/// the same as no decision at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlannedAction {
    Post {
        title: String,
        content: String,
        submolt: String,
    },
    Comment {
        post_id: String,
        content: String,
    },
    Upvote {
        post_id: String,
    },
    Follow {
        handle: String,
    },
    Wait,
}

impl PlannedAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            PlannedAction::Post { .. } => ActionKind::Post,
            PlannedAction::Comment { .. } => ActionKind::Comment,
            PlannedAction::Upvote { .. } => ActionKind::Upvote,
            PlannedAction::Follow { .. } => ActionKind::Follow,
            PlannedAction::Wait => ActionKind::Wait,
        }
    }
}

/// Token counts reported by the inference call, logged per cycle.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// One structured decision plus its usage metrics.
#[derive(Clone, Debug)]
pub struct DecisionResponse {
    pub decision: Decision,
    pub usage: TokenUsage,
    pub model: String,
}

// ─── Governance ──────────────────────────────────────────────────

/// Outcome of a governor check. Blocking is a routine result, not an
/// error: a blocked action becomes a failure record and the cycle
/// proceeds to sleep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    Allowed,
    Blocked(String),
}

/// Boolean safety/validity outcome plus an optional reason.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Verdict {
    pub fn pass() -> Self {
        Self { ok: true, reason: None }
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

/// Why a cycle produced no successful action. Every variant is a
/// recoverable, expected outcome; none of them aborts the loop.
#[derive(Debug, thiserror::Error)]
pub enum CycleFailure {
    #[error("content blocked: {0}")]
    Validation(String),
    #[error("{0}")]
    Governance(String),
    #[error("platform error: {0}")]
    Transport(String),
    #[error("decision error: {0}")]
    Decision(String),
}

// ─── Feed ────────────────────────────────────────────────────────

/// Per-item safety verdict attached to the feed shown to the model.
/// Computed fresh on every fetch; flagged items are shown, not hidden.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAnnotation {
    pub safe: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A post as returned by the platform API.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    pub id: String,
    pub title: String,
    pub author: String,
    pub upvotes: u64,
    pub comment_count: u64,
    pub content: String,
}

/// A comment as returned by the platform API.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedComment {
    pub author: String,
    pub content: String,
}

/// A feed post as presented to the decision step: trimmed fields plus
/// the safety annotation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub author: String,
    pub upvotes: u64,
    pub comments: u64,
    pub preview: String,
    pub safety: SafetyAnnotation,
}

/// The agent's own profile on the platform.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub karma: i64,
    pub follower_count: u64,
}

// ─── Run Summary ─────────────────────────────────────────────────

/// Totals emitted when a run terminates, by either exit path.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub iterations: u64,
    pub successful_actions: u64,
    pub failed_actions: u64,
    pub posts: u64,
    pub comments: u64,
    pub upvotes: u64,
    pub follows: u64,
    pub waits: u64,
}

impl RunSummary {
    pub fn count_for(&self, kind: ActionKind) -> u64 {
        match kind {
            ActionKind::Post => self.posts,
            ActionKind::Comment => self.comments,
            ActionKind::Upvote => self.upvotes,
            ActionKind::Follow => self.follows,
            ActionKind::Wait => self.waits,
        }
    }
}

// ─── Configuration ───────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoltbotConfig {
    pub agent_name: String,
    pub api_url: String,
    pub api_token: String,
    pub inference_api_url: String,
    pub inference_api_key: String,
    pub inference_model: String,
    pub max_tokens: u32,
    pub interval_secs: u64,
    pub feed_limit: u32,
    pub default_submolt: String,
    pub log_level: LogLevel,
    pub version: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Returns a default `MoltbotConfig`. Fields with no sensible default
/// (tokens, keys) are empty strings so callers can override them.
pub fn default_config() -> MoltbotConfig {
    MoltbotConfig {
        agent_name: "moltbot".to_string(),
        api_url: "https://www.moltbook.com/api/v1".to_string(),
        api_token: String::new(),
        inference_api_url: "https://api.openai.com".to_string(),
        inference_api_key: String::new(),
        inference_model: "gpt-4o".to_string(),
        max_tokens: 4096,
        interval_secs: 120,
        feed_limit: 5,
        default_submolt: "general".to_string(),
        log_level: LogLevel::Info,
        version: "0.1.0".to_string(),
    }
}

// ─── Platform Client Interface ───────────────────────────────────

/// The social platform the agent acts on. One long-lived client per
/// run, exclusively owned by the loop.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn get_feed(&self, limit: u32) -> anyhow::Result<Vec<FeedPost>>;
    async fn get_post(&self, post_id: &str) -> anyhow::Result<FeedPost>;
    async fn get_comments(&self, post_id: &str) -> anyhow::Result<Vec<FeedComment>>;

    /// Create a post; returns the new post id.
    async fn create_post(
        &self,
        title: &str,
        content: &str,
        submolt: &str,
    ) -> anyhow::Result<String>;

    async fn create_comment(&self, post_id: &str, content: &str) -> anyhow::Result<()>;
    async fn upvote_post(&self, post_id: &str) -> anyhow::Result<()>;
    async fn follow_agent(&self, handle: &str) -> anyhow::Result<()>;
    async fn get_profile(&self) -> anyhow::Result<Profile>;
}

// ─── Decision Client Interface ───────────────────────────────────

/// The model collaborator: one structured decision per cycle.
#[async_trait]
pub trait DecisionClient: Send + Sync {
    async fn decide(
        &self,
        system_prompt: &str,
        context: &str,
    ) -> anyhow::Result<DecisionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_action_deserializes_to_wait() {
        let kind: ActionKind = serde_json::from_str("\"downvote\"").unwrap();
        assert_eq!(kind, ActionKind::Wait);
    }

    #[test]
    fn test_known_actions_round_trip() {
        for (s, k) in [
            ("\"post\"", ActionKind::Post),
            ("\"comment\"", ActionKind::Comment),
            ("\"upvote\"", ActionKind::Upvote),
            ("\"follow\"", ActionKind::Follow),
            ("\"wait\"", ActionKind::Wait),
        ] {
            let kind: ActionKind = serde_json::from_str(s).unwrap();
            assert_eq!(kind, k);
            assert_eq!(serde_json::to_string(&kind).unwrap(), s);
        }
    }

    #[test]
    fn test_decision_tolerates_missing_optionals() {
        let d: Decision =
            serde_json::from_str(r#"{"reasoning":"quiet feed","action":"wait"}"#).unwrap();
        assert_eq!(d.action, ActionKind::Wait);
        assert!(d.title.is_none());
        assert!(d.post_id.is_none());
    }

    #[test]
    fn test_record_truncates_excerpt_and_error() {
        let long = "x".repeat(200);
        let rec = ActionRecord::success(ActionKind::Post, Some("p1"), Some(&long));
        assert_eq!(rec.excerpt.as_ref().unwrap().chars().count(), 50);

        let rec = ActionRecord::failure(ActionKind::Post, None, &long);
        assert_eq!(rec.error.as_ref().unwrap().chars().count(), 50);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 50), "short");
    }
}
