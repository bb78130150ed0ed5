//! Inference Integration
//!
//! OpenAI-compatible chat-completions client producing exactly one
//! structured `Decision` per cycle.

pub mod client;

pub use client::InferenceHttpClient;
