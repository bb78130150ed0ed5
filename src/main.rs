//! Moltbot Runtime
//!
//! The entry point for the autonomous posting agent. Handles CLI args,
//! logging setup, signal handling, and wiring the platform and
//! inference clients into the decision loop.

use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tokio::signal;
use tokio::sync::watch;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use moltbot::agent::agent_loop::{run_agent_loop, AgentLoopOptions};
use moltbot::config::{get_config_path, load_or_default};
use moltbot::inference::InferenceHttpClient;
use moltbot::moltbook::MoltbookClient;
use moltbot::types::{LogLevel, MoltbotConfig, RunSummary};

const VERSION: &str = "0.1.0";

/// Moltbot -- Autonomous Posting Agent
#[derive(Parser, Debug)]
#[command(
    name = "moltbot",
    version = VERSION,
    about = "Moltbot -- Autonomous posting agent for Moltbook",
    long_about = "Autonomous posting agent. Reads the feed, decides on one action per \
                  cycle, and runs every action through a guardrail engine before it \
                  touches the network."
)]
struct Cli {
    /// Seconds between cycles (overrides config)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Maximum number of cycles before exiting
    #[arg(short = 'n', long)]
    max_iterations: Option<u64>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Show current configuration and exit
    #[arg(long)]
    status: bool,
}

// ---- Status Command ---------------------------------------------------------

/// Display the current configuration, secrets elided.
fn show_status(config: &MoltbotConfig) {
    println!(
        r#"
=== MOLTBOT STATUS ===
Agent:      {}
API:        {}
Token:      {}
Inference:  {}
Model:      {}
Interval:   {}s
Feed limit: {}
Submolt:    {}
Config:     {}
Version:    {}
======================
"#,
        config.agent_name,
        config.api_url,
        if config.api_token.is_empty() { "(not set)" } else { "(set)" },
        config.inference_api_url,
        config.inference_model,
        config.interval_secs,
        config.feed_limit,
        config.default_submolt,
        get_config_path().display(),
        config.version,
    );
}

// ---- Main Run ---------------------------------------------------------------

/// Wire everything together and run the loop to completion.
async fn run(cli: Cli, mut config: MoltbotConfig) {
    if let Some(interval) = cli.interval {
        config.interval_secs = interval;
    }
    let max_iterations = if cli.once { Some(1) } else { cli.max_iterations };

    println!(
        "{}",
        format!("Moltbot v{} starting as {}", VERSION, config.agent_name).bold()
    );
    if config.api_token.is_empty() {
        eprintln!("Warning: MOLTBOOK_API_TOKEN is not set; platform calls will fail.");
    }
    if config.inference_api_key.is_empty() {
        eprintln!("Warning: INFERENCE_API_KEY is not set; decisions will fail.");
    }

    let platform = Arc::new(MoltbookClient::new(
        config.api_url.clone(),
        config.api_token.clone(),
    ));
    let inference = Arc::new(InferenceHttpClient::new(
        config.inference_api_url.clone(),
        config.inference_api_key.clone(),
        config.inference_model.clone(),
        config.max_tokens,
    ));

    // SIGINT/SIGTERM flip the shutdown flag; the loop observes it at
    // the top of each cycle and during the inter-cycle sleep.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let ctrl_c = signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to register SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    println!("\n{}", "Received SIGINT, finishing current cycle...".yellow());
                }
                _ = sigterm.recv() => {
                    println!("\n{}", "Received SIGTERM, finishing current cycle...".yellow());
                }
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.expect("Failed to register Ctrl+C handler");
            println!("\n{}", "Received shutdown signal...".yellow());
        }
        let _ = shutdown_tx.send(true);
    });

    let summary = run_agent_loop(AgentLoopOptions {
        config,
        platform,
        inference,
        max_iterations,
        shutdown: shutdown_rx,
    })
    .await;

    print_summary(&summary);
}

fn print_summary(summary: &RunSummary) {
    println!("{}", "=== RUN SUMMARY ===".bold());
    println!(
        "Cycles: {} | {} succeeded, {} failed",
        summary.iterations,
        summary.successful_actions.to_string().green(),
        summary.failed_actions.to_string().red(),
    );
    println!(
        "posts: {} | comments: {} | upvotes: {} | follows: {} | waits: {}",
        summary.posts, summary.comments, summary.upvotes, summary.follows, summary.waits
    );
}

// ---- Entry Point -----------------------------------------------------------

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = load_or_default();
    let level = match config.log_level {
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    if cli.status {
        show_status(&config);
        return;
    }

    // Both the budget-exhausted and interrupted paths return normally,
    // so either way the process exits cleanly.
    run(cli, config).await;
}
