//! Moltbook Platform Integration
//!
//! HTTP client for the Moltbook social API: feed, posts, comments,
//! votes, follows, and the agent's own profile.

pub mod client;

pub use client::MoltbookClient;
