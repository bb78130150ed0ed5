//! Rate/Duplicate Governor
//!
//! Decides whether a proposed action may execute, based on the ledger.
//! Two stages: `plan` normalizes a raw model decision into a
//! `PlannedAction` (half-formed decisions collapse to wait), and
//! `check` applies the per-kind rate and duplicate policy. Blocking is
//! expressed as a `Gate::Blocked(reason)` value, never an error.

use crate::types::{ActionKind, Decision, Gate, PlannedAction};

use super::ledger::ActionLedger;

/// Window and limit per action kind. Windows are counted over ledger
/// entries, not wall-clock time; duplicate checks span the entire
/// session history.
const POST_WINDOW: usize = 5;
const MAX_RECENT_POSTS: usize = 2;

const COMMENT_WINDOW: usize = 5;
const MAX_RECENT_COMMENTS: usize = 3;

const UPVOTE_WINDOW: usize = 10;
const MAX_RECENT_UPVOTES: usize = 5;

const FOLLOW_WINDOW: usize = 10;
const MAX_RECENT_FOLLOWS: usize = 3;

/// Normalize a model decision into an executable action.
///
/// Field presence must match the action kind: a `post` without title
/// or content, a `comment` without a post id, and so on, all become
/// `Wait`. A missing submolt falls back to `default_submolt`.
pub fn plan(decision: &Decision, default_submolt: &str) -> PlannedAction {
    fn filled(field: &Option<String>) -> Option<String> {
        field
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    match decision.action {
        ActionKind::Post => match (filled(&decision.title), filled(&decision.content)) {
            (Some(title), Some(content)) => PlannedAction::Post {
                title,
                content,
                submolt: filled(&decision.submolt)
                    .unwrap_or_else(|| default_submolt.to_string()),
            },
            _ => PlannedAction::Wait,
        },
        ActionKind::Comment => match (filled(&decision.post_id), filled(&decision.content)) {
            (Some(post_id), Some(content)) => PlannedAction::Comment { post_id, content },
            _ => PlannedAction::Wait,
        },
        ActionKind::Upvote => match filled(&decision.post_id) {
            Some(post_id) => PlannedAction::Upvote { post_id },
            None => PlannedAction::Wait,
        },
        ActionKind::Follow => match filled(&decision.agent_handle) {
            Some(handle) => PlannedAction::Follow { handle },
            None => PlannedAction::Wait,
        },
        ActionKind::Wait => PlannedAction::Wait,
    }
}

/// Apply the rate and duplicate policy for `action` against `ledger`.
pub fn check(action: &PlannedAction, ledger: &ActionLedger) -> Gate {
    match action {
        PlannedAction::Post { .. } => {
            if ledger.count_recent(ActionKind::Post, POST_WINDOW, true) >= MAX_RECENT_POSTS {
                return Gate::Blocked("rate limited: too many recent posts".to_string());
            }
            Gate::Allowed
        }
        PlannedAction::Comment { .. } => {
            if ledger.count_recent(ActionKind::Comment, COMMENT_WINDOW, true)
                >= MAX_RECENT_COMMENTS
            {
                return Gate::Blocked("rate limited: too many recent comments".to_string());
            }
            Gate::Allowed
        }
        PlannedAction::Upvote { post_id } => {
            if ledger.already_targeted(ActionKind::Upvote, post_id) {
                return Gate::Blocked("already voted on this post".to_string());
            }
            if ledger.count_recent(ActionKind::Upvote, UPVOTE_WINDOW, true) >= MAX_RECENT_UPVOTES
            {
                return Gate::Blocked("rate limited: too many recent upvotes".to_string());
            }
            Gate::Allowed
        }
        PlannedAction::Follow { handle } => {
            if ledger.already_targeted(ActionKind::Follow, handle) {
                return Gate::Blocked("already following this agent".to_string());
            }
            if ledger.count_recent(ActionKind::Follow, FOLLOW_WINDOW, true) >= MAX_RECENT_FOLLOWS
            {
                return Gate::Blocked("rate limited: too many recent follows".to_string());
            }
            Gate::Allowed
        }
        PlannedAction::Wait => Gate::Allowed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionRecord;

    fn decision(action: ActionKind) -> Decision {
        Decision {
            reasoning: "test".to_string(),
            action,
            title: None,
            content: None,
            submolt: None,
            post_id: None,
            agent_handle: None,
        }
    }

    fn planned_post() -> PlannedAction {
        PlannedAction::Post {
            title: "Yield curve notes".to_string(),
            content: "Some careful observations about the curve.".to_string(),
            submolt: "finance".to_string(),
        }
    }

    #[test]
    fn test_post_without_content_plans_as_wait() {
        let mut d = decision(ActionKind::Post);
        d.title = Some("A title".to_string());
        assert_eq!(plan(&d, "general"), PlannedAction::Wait);
    }

    #[test]
    fn test_post_with_blank_content_plans_as_wait() {
        let mut d = decision(ActionKind::Post);
        d.title = Some("A title".to_string());
        d.content = Some("   ".to_string());
        assert_eq!(plan(&d, "general"), PlannedAction::Wait);
    }

    #[test]
    fn test_post_defaults_submolt() {
        let mut d = decision(ActionKind::Post);
        d.title = Some("A title".to_string());
        d.content = Some("Body text".to_string());
        match plan(&d, "general") {
            PlannedAction::Post { submolt, .. } => assert_eq!(submolt, "general"),
            other => panic!("expected post, got {:?}", other),
        }
    }

    #[test]
    fn test_upvote_without_post_id_plans_as_wait() {
        assert_eq!(plan(&decision(ActionKind::Upvote), "general"), PlannedAction::Wait);
    }

    #[test]
    fn test_follow_with_handle_plans_as_follow() {
        let mut d = decision(ActionKind::Follow);
        d.agent_handle = Some("quantbot".to_string());
        assert_eq!(
            plan(&d, "general"),
            PlannedAction::Follow {
                handle: "quantbot".to_string()
            }
        );
    }

    #[test]
    fn test_one_recent_post_allows_another() {
        let mut ledger = ActionLedger::new();
        ledger.append(ActionRecord::success(ActionKind::Post, Some("p1"), None));
        assert_eq!(check(&planned_post(), &ledger), Gate::Allowed);
    }

    #[test]
    fn test_two_recent_posts_block_a_third() {
        let mut ledger = ActionLedger::new();
        ledger.append(ActionRecord::success(ActionKind::Post, Some("p1"), None));
        ledger.append(ActionRecord::success(ActionKind::Post, Some("p2"), None));
        match check(&planned_post(), &ledger) {
            Gate::Blocked(reason) => assert!(reason.contains("rate limited")),
            Gate::Allowed => panic!("third post should be blocked"),
        }
    }

    #[test]
    fn test_failed_posts_do_not_consume_the_window() {
        let mut ledger = ActionLedger::new();
        ledger.append(ActionRecord::failure(ActionKind::Post, None, "api down"));
        ledger.append(ActionRecord::failure(ActionKind::Post, None, "api down"));
        assert_eq!(check(&planned_post(), &ledger), Gate::Allowed);
    }

    #[test]
    fn test_posts_outside_window_do_not_count() {
        let mut ledger = ActionLedger::new();
        ledger.append(ActionRecord::success(ActionKind::Post, Some("p1"), None));
        ledger.append(ActionRecord::success(ActionKind::Post, Some("p2"), None));
        for _ in 0..5 {
            ledger.append(ActionRecord::success(ActionKind::Wait, None, None));
        }
        assert_eq!(check(&planned_post(), &ledger), Gate::Allowed);
    }

    #[test]
    fn test_duplicate_upvote_blocked_anywhere_in_history() {
        let mut ledger = ActionLedger::new();
        ledger.append(ActionRecord::success(ActionKind::Upvote, Some("p1"), None));
        for _ in 0..20 {
            ledger.append(ActionRecord::success(ActionKind::Wait, None, None));
        }
        let action = PlannedAction::Upvote {
            post_id: "p1".to_string(),
        };
        match check(&action, &ledger) {
            Gate::Blocked(reason) => assert!(reason.contains("already voted")),
            Gate::Allowed => panic!("duplicate upvote should be blocked"),
        }
    }

    #[test]
    fn test_upvote_rate_limit() {
        let mut ledger = ActionLedger::new();
        for i in 0..5 {
            ledger.append(ActionRecord::success(
                ActionKind::Upvote,
                Some(&format!("p{}", i)),
                None,
            ));
        }
        let action = PlannedAction::Upvote {
            post_id: "fresh".to_string(),
        };
        match check(&action, &ledger) {
            Gate::Blocked(reason) => assert!(reason.contains("rate limited")),
            Gate::Allowed => panic!("sixth upvote in window should be blocked"),
        }
    }

    #[test]
    fn test_duplicate_follow_blocked() {
        let mut ledger = ActionLedger::new();
        ledger.append(ActionRecord::success(
            ActionKind::Follow,
            Some("quantbot"),
            None,
        ));
        let action = PlannedAction::Follow {
            handle: "quantbot".to_string(),
        };
        match check(&action, &ledger) {
            Gate::Blocked(reason) => assert!(reason.contains("already following")),
            Gate::Allowed => panic!("duplicate follow should be blocked"),
        }
    }

    #[test]
    fn test_wait_is_always_allowed() {
        let mut ledger = ActionLedger::new();
        for _ in 0..100 {
            ledger.append(ActionRecord::success(ActionKind::Wait, None, None));
        }
        assert_eq!(check(&PlannedAction::Wait, &ledger), Gate::Allowed);
    }
}
