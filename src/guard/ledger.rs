//! Action History Ledger
//!
//! Append-only, in-memory record of every action the agent attempted
//! this session. The loop is the only writer; the governor and the
//! context builder read from it. Windows are positional (last N
//! entries), not wall-clock.

use std::collections::HashSet;

use crate::types::{ActionKind, ActionRecord, RunSummary};

/// The session's action history. Records are never mutated or removed;
/// a `(kind, target)` index keeps full-history duplicate checks cheap.
#[derive(Default)]
pub struct ActionLedger {
    records: Vec<ActionRecord>,
    targeted: HashSet<(ActionKind, String)>,
}

impl ActionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a concluded action attempt. The record is immutable from
    /// here on.
    pub fn append(&mut self, record: ActionRecord) {
        if let Some(ref target) = record.target {
            self.targeted.insert((record.kind, target.clone()));
        }
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    /// The last `n` records, oldest first.
    pub fn recent(&self, n: usize) -> &[ActionRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Count entries of `kind` within the last `window` entries.
    /// Positional recency only; entry timestamps play no part.
    pub fn count_recent(&self, kind: ActionKind, window: usize, success_only: bool) -> usize {
        self.recent(window)
            .iter()
            .filter(|r| r.kind == kind && (!success_only || r.success))
            .count()
    }

    /// Whether any attempt of `kind` against `target` exists anywhere
    /// in the history. Failed attempts count too: an attempt that died
    /// in transport may still have landed server-side, so repeating it
    /// is not safe.
    pub fn already_targeted(&self, kind: ActionKind, target: &str) -> bool {
        self.targeted.contains(&(kind, target.to_string()))
    }

    /// Aggregate totals for the end-of-run report.
    pub fn summarize(&self, iterations: u64) -> RunSummary {
        let mut summary = RunSummary {
            iterations,
            ..RunSummary::default()
        };
        for record in &self.records {
            if record.success {
                summary.successful_actions += 1;
            } else {
                summary.failed_actions += 1;
            }
            match record.kind {
                ActionKind::Post => summary.posts += 1,
                ActionKind::Comment => summary.comments += 1,
                ActionKind::Upvote => summary.upvotes += 1,
                ActionKind::Follow => summary.follows += 1,
                ActionKind::Wait => summary.waits += 1,
            }
        }
        summary
    }
}
