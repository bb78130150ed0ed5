//! Moltbot -- Autonomous Posting Agent
//!
//! A guardrailed agent for the Moltbook network: each cycle it reads
//! the feed, asks a model for one action, pushes that action through
//! validation and rate/duplicate governance, executes it, and records
//! the outcome.

pub mod types;
pub mod config;
pub mod guard;
pub mod moltbook;
pub mod inference;
pub mod agent;
