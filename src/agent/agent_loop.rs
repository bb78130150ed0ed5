//! The Decision Loop
//!
//! One cycle: fetch context -> decide -> govern and validate ->
//! execute -> record -> sleep. The cycle body is total: every outcome
//! becomes exactly one ledger record, and no error class escapes a
//! cycle. The loop ends when the iteration budget is spent or a
//! shutdown signal arrives; both paths run the same teardown.

use std::sync::Arc;

use chrono::Utc;
use colored::Colorize;
use rand::Rng;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};
use uuid::Uuid;

use crate::guard::{self, sanitize, validate, ActionLedger};
use crate::types::{
    truncate_chars, ActionKind, ActionRecord, CycleFailure, DecisionClient, Gate, MoltbotConfig,
    PlannedAction, PlatformClient, RunSummary, Verdict,
};

use super::context::fetch_annotated_feed;
use super::prompt::{build_cycle_context, build_system_prompt};

/// Options for running the decision loop.
pub struct AgentLoopOptions {
    pub config: MoltbotConfig,
    pub platform: Arc<dyn PlatformClient>,
    pub inference: Arc<dyn DecisionClient>,
    pub max_iterations: Option<u64>,
    pub shutdown: watch::Receiver<bool>,
}

/// Run the decision loop to completion and return the run summary.
///
/// The shutdown receiver is observed at the top of each cycle and
/// during the inter-cycle sleep; an interrupt during a suspended
/// platform or inference call lets that call resolve or fail first.
pub async fn run_agent_loop(options: AgentLoopOptions) -> RunSummary {
    let AgentLoopOptions {
        config,
        platform,
        inference,
        max_iterations,
        mut shutdown,
    } = options;

    let run_id = Uuid::new_v4().to_string()[..8].to_string();
    let system_prompt = build_system_prompt(&config);
    let mut ledger = ActionLedger::new();
    let mut iteration: u64 = 0;
    let mut interrupted = false;

    info!(
        run_id = %run_id,
        interval_secs = config.interval_secs,
        max_iterations = ?max_iterations,
        "{} starting", config.agent_name
    );

    loop {
        if *shutdown.borrow() {
            interrupted = true;
            break;
        }

        iteration += 1;
        println!(
            "{}",
            format!("── cycle #{} @ {} ──", iteration, Utc::now().format("%H:%M:%S")).bold()
        );

        let record = run_cycle(&config, &*platform, &*inference, &ledger, &system_prompt).await;

        if record.success {
            info!(
                run_id = %run_id,
                iteration,
                action = %record.kind,
                target = record.target.as_deref().unwrap_or(""),
                "action completed"
            );
            println!("   {} {}", "✓".green(), record.kind);
        } else {
            let error = record.error.as_deref().unwrap_or("");
            warn!(
                run_id = %run_id,
                iteration,
                action = %record.kind,
                error,
                "action did not complete"
            );
            println!("   {} {} - {}", "✗".red(), record.kind, error);
        }

        ledger.append(record);

        if let Some(max) = max_iterations {
            if iteration >= max {
                break;
            }
        }

        let delay = jittered_interval(config.interval_secs);
        println!("   next cycle in {:.0}s", delay.as_secs_f64());
        tokio::select! {
            _ = sleep(delay) => {}
            changed = shutdown.changed() => {
                if changed.is_ok() && *shutdown.borrow() {
                    interrupted = true;
                    break;
                }
            }
        }
    }

    // Shared teardown for both exit paths: summarize, release the
    // platform client, log final status.
    let summary = ledger.summarize(iteration);
    drop(platform);

    if interrupted {
        info!(run_id = %run_id, iterations = summary.iterations, "stopped by interrupt");
    } else {
        info!(run_id = %run_id, iterations = summary.iterations, "iteration budget reached");
    }
    info!(
        run_id = %run_id,
        successful = summary.successful_actions,
        failed = summary.failed_actions,
        posts = summary.posts,
        comments = summary.comments,
        upvotes = summary.upvotes,
        follows = summary.follows,
        waits = summary.waits,
        "run summary"
    );

    summary
}

/// One full cycle. Always returns exactly one record; never errors.
async fn run_cycle(
    config: &MoltbotConfig,
    platform: &dyn PlatformClient,
    inference: &dyn DecisionClient,
    ledger: &ActionLedger,
    system_prompt: &str,
) -> ActionRecord {
    // FETCH_CONTEXT
    let feed = fetch_annotated_feed(platform, config.feed_limit, &config.agent_name).await;
    let context = build_cycle_context(ledger, &feed);

    // DECIDE
    let response = match inference.decide(system_prompt, &context).await {
        Ok(response) => response,
        Err(err) => {
            let failure = CycleFailure::Decision(err.to_string());
            warn!(error = %failure, "decision failed, treating as wait");
            return ActionRecord::failure(ActionKind::Wait, None, &failure.to_string());
        }
    };

    info!(
        model = %response.model,
        action = %response.decision.action,
        prompt_tokens = response.usage.prompt_tokens,
        completion_tokens = response.usage.completion_tokens,
        "decision"
    );
    println!(
        "   {} {} - {}",
        "decision:".cyan(),
        response.decision.action,
        truncate_chars(&response.decision.reasoning, 120)
    );

    // GOVERN_AND_VALIDATE + EXECUTE
    let planned = guard::plan(&response.decision, &config.default_submolt);
    execute_action(config, platform, ledger, planned).await
}

/// Validate, govern, and execute one planned action.
async fn execute_action(
    config: &MoltbotConfig,
    platform: &dyn PlatformClient,
    ledger: &ActionLedger,
    planned: PlannedAction,
) -> ActionRecord {
    if let Some(blocked) = validate_planned(&planned) {
        return blocked;
    }

    if let Gate::Blocked(reason) = guard::check(&planned, ledger) {
        let failure = CycleFailure::Governance(reason);
        return ActionRecord::failure(planned.kind(), target_of(&planned), &failure.to_string());
    }

    match planned {
        PlannedAction::Post {
            title,
            content,
            submolt,
        } => {
            // Outbound text is always the sanitized form, even after
            // validation passed.
            let title = sanitize(&title);
            let content = sanitize(&content);
            match platform.create_post(&title, &content, &submolt).await {
                Ok(post_id) => {
                    ActionRecord::success(ActionKind::Post, Some(&post_id), Some(&title))
                }
                Err(err) => transport_failure(ActionKind::Post, None, err),
            }
        }

        PlannedAction::Comment { post_id, content } => {
            // The thread itself may be steering us; screen it before
            // replying.
            let thread_verdict = screen_thread(platform, &post_id, &config.agent_name).await;
            if !thread_verdict.ok {
                let failure =
                    CycleFailure::Validation(thread_verdict.reason.unwrap_or_default());
                return ActionRecord::failure(
                    ActionKind::Comment,
                    Some(&post_id),
                    &failure.to_string(),
                );
            }

            let content = sanitize(&content);
            match platform.create_comment(&post_id, &content).await {
                Ok(()) => {
                    ActionRecord::success(ActionKind::Comment, Some(&post_id), Some(&content))
                }
                Err(err) => transport_failure(ActionKind::Comment, Some(&post_id), err),
            }
        }

        PlannedAction::Upvote { post_id } => match platform.upvote_post(&post_id).await {
            Ok(()) => ActionRecord::success(ActionKind::Upvote, Some(&post_id), None),
            Err(err) => transport_failure(ActionKind::Upvote, Some(&post_id), err),
        },

        PlannedAction::Follow { handle } => match platform.follow_agent(&handle).await {
            Ok(()) => ActionRecord::success(ActionKind::Follow, Some(&handle), None),
            Err(err) => transport_failure(ActionKind::Follow, Some(&handle), err),
        },

        PlannedAction::Wait => ActionRecord::success(ActionKind::Wait, None, None),
    }
}

/// Content validation for the free-text action kinds. Upvote and
/// follow carry no text to validate.
fn validate_planned(planned: &PlannedAction) -> Option<ActionRecord> {
    match planned {
        PlannedAction::Post { title, content, .. } => {
            let title_verdict = validate(title);
            if !title_verdict.ok {
                let failure = CycleFailure::Validation(format!(
                    "title: {}",
                    title_verdict.reason.unwrap_or_default()
                ));
                return Some(ActionRecord::failure(
                    ActionKind::Post,
                    None,
                    &failure.to_string(),
                ));
            }
            let content_verdict = validate(content);
            if !content_verdict.ok {
                let failure =
                    CycleFailure::Validation(content_verdict.reason.unwrap_or_default());
                return Some(ActionRecord::failure(
                    ActionKind::Post,
                    None,
                    &failure.to_string(),
                ));
            }
            None
        }
        PlannedAction::Comment { post_id, content } => {
            let verdict = validate(content);
            if !verdict.ok {
                let failure = CycleFailure::Validation(verdict.reason.unwrap_or_default());
                return Some(ActionRecord::failure(
                    ActionKind::Comment,
                    Some(post_id),
                    &failure.to_string(),
                ));
            }
            None
        }
        _ => None,
    }
}

/// The target identifier known before execution. A post's id only
/// exists after the API call, so posts have no pre-execution target.
fn target_of(planned: &PlannedAction) -> Option<&str> {
    match planned {
        PlannedAction::Comment { post_id, .. } | PlannedAction::Upvote { post_id } => {
            Some(post_id)
        }
        PlannedAction::Follow { handle } => Some(handle),
        _ => None,
    }
}

fn transport_failure(kind: ActionKind, target: Option<&str>, err: anyhow::Error) -> ActionRecord {
    let failure = CycleFailure::Transport(err.to_string());
    ActionRecord::failure(kind, target, &failure.to_string())
}

/// Re-screen a thread before commenting into it: the root post plus
/// any replies that manipulate and reference this agent. Fetch errors
/// leave the corresponding part of the screen empty rather than
/// blocking the comment.
async fn screen_thread(platform: &dyn PlatformClient, post_id: &str, handle: &str) -> Verdict {
    let item_text = match platform.get_post(post_id).await {
        Ok(post) => format!("{} {}", post.title, post.content),
        Err(_) => String::new(),
    };
    let replies: Vec<String> = platform
        .get_comments(post_id)
        .await
        .map(|comments| comments.into_iter().map(|c| c.content).collect())
        .unwrap_or_default();

    guard::engagement_check(&item_text, &replies, handle)
}

/// Base interval ± 20% jitter.
fn jittered_interval(base_secs: u64) -> Duration {
    let base = base_secs as f64;
    let jitter = base * 0.2;
    let delta = if jitter > 0.0 {
        rand::thread_rng().gen_range(-jitter..=jitter)
    } else {
        0.0
    };
    Duration::from_secs_f64((base + delta).max(0.0))
}
