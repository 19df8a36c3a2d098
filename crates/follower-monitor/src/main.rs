//! Follower monitor CLI - scheduled X follower count tracking.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use follower_monitor::notifier::{ChangeNotifier, NotifyOutcome};
use follower_monitor::pipeline::{Pipeline, PipelineConfig};
use follower_monitor::sampler::{BrowserSampler, SamplerConfig};
use follower_monitor::store::StateStore;
use follower_monitor::Credential;
use notify::{signed, Notifier};

/// Follower monitor - sample an X profile's follower count and report changes.
#[derive(Parser)]
#[command(name = "follower-monitor")]
#[command(about = "Track X follower counts and notify on changes")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true, alias = "debug")]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one sample-diff-notify cycle (for cron use)
    Run(RunArgs),

    /// Show stored snapshots with per-step deltas
    History {
        /// State file path
        #[arg(long, env = "FOLLOWERS_STATE", default_value = "followers_data.json")]
        state: PathBuf,

        /// Limit results
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Extract the follower count from a saved HTML page
    Parse {
        /// HTML file, e.g. one written by `run --dump-html`
        file: PathBuf,

        /// Profile the page belongs to
        #[arg(long, env = "X_USERNAME")]
        username: String,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Profile to monitor (without @)
    #[arg(long, env = "X_USERNAME")]
    username: String,

    /// Exported cookie file; takes precedence over X_COOKIES
    #[arg(long, env = "X_COOKIES_FILE", default_value = "cookies.json")]
    cookies_file: PathBuf,

    /// Session cookie blob (JSON array or Cookie header)
    #[arg(long, env = "X_COOKIES", hide_env_values = true)]
    cookies: Option<String>,

    /// State file path
    #[arg(long, env = "FOLLOWERS_STATE", default_value = "followers_data.json")]
    state: PathBuf,

    /// Directory for timestamped snapshot files
    #[arg(long, env = "FOLLOWERS_HISTORY_DIR", default_value = "followers_history")]
    history_dir: PathBuf,

    /// Discord webhook URL
    #[arg(long, env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
    discord_webhook_url: Option<String>,

    /// Slack webhook URL
    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    slack_webhook_url: Option<String>,

    /// Disable all notifications
    #[arg(long, env = "NOTIFY_DISABLED")]
    notify_disabled: bool,

    /// Send an alert to the channels when the run fails
    #[arg(long, env = "ALERT_ON_FAILURE")]
    alert_on_failure: bool,

    /// Seconds to let the profile page render
    #[arg(long, env = "X_SETTLE_SECS", default_value = "5")]
    settle_secs: u64,

    /// Write the fetched HTML to this file
    #[arg(long)]
    dump_html: Option<PathBuf>,

    /// Platform origin
    #[arg(long, env = "X_BASE_URL", default_value = "https://x.com")]
    base_url: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over the verbosity flag
    let default_filter = if cli.verbose {
        "follower_monitor=debug,notify=debug,info"
    } else {
        "follower_monitor=info,notify=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    match cli.command {
        Commands::Run(args) => {
            tracing::info!(
                username = %args.username,
                state = %args.state.display(),
                history_dir = %args.history_dir.display(),
                "Starting follower monitor"
            );
            run_monitor(args).await
        }
        Commands::History { state, limit } => run_history(state, limit),
        Commands::Parse { file, username } => run_parse(&file, &username),
    }
}

async fn run_monitor(args: RunArgs) -> Result<()> {
    let username = args.username.trim().trim_start_matches('@').to_string();
    anyhow::ensure!(!username.is_empty(), "X_USERNAME must not be empty");

    let credential = Credential::resolve(&args.cookies_file, args.cookies)?;

    let sampler = BrowserSampler::new(SamplerConfig {
        username: username.clone(),
        base_url: args.base_url,
        settle: Duration::from_secs(args.settle_secs),
        dump_html: args.dump_html,
        ..SamplerConfig::default()
    });

    let notifier = Notifier::from_urls(
        args.discord_webhook_url,
        args.slack_webhook_url,
        args.notify_disabled,
    );

    let config = PipelineConfig {
        username: username.clone(),
        alert_on_failure: args.alert_on_failure,
    };

    let store = StateStore::new(args.state, args.history_dir);
    let pipeline = Pipeline::new(
        config,
        credential,
        Arc::new(sampler),
        ChangeNotifier::new(&username, notifier),
    );

    let report = pipeline
        .run(&store)
        .await
        .with_context(|| format!("Monitor run for @{username} failed"))?;

    // Print summary
    println!("\n📊 Follower Summary for @{username}");
    println!("   Current: {}", report.new_count);
    match report.previous_count {
        Some(previous) => {
            println!("   Previous: {previous}");
            println!("   Change: {}", signed(report.delta));
        }
        None => println!("   Baseline recorded (first run)"),
    }
    println!("   Snapshots: {}", report.history_len);
    println!("   Archived: {}", report.archive_path.display());

    match &report.notification {
        NotifyOutcome::Sent { channels } => println!("   Notified: {channels} channel(s)"),
        NotifyOutcome::Failed { errors } => {
            for err in errors {
                eprintln!("   Notification failed: {err}");
            }
        }
        NotifyOutcome::Unchanged | NotifyOutcome::NoChannels => {}
    }

    Ok(())
}

fn run_history(state: PathBuf, limit: usize) -> Result<()> {
    // History listing never touches the snapshot directory
    let store = StateStore::new(&state, PathBuf::new());
    let history = store.load()?;

    if history.is_empty() {
        println!("No snapshots recorded in {}", state.display());
        return Ok(());
    }

    let who = history
        .username
        .as_deref()
        .map_or_else(String::new, |u| format!(" for @{u}"));
    println!("📋 Follower history{who}\n");

    for (snapshot, delta) in history.recent_with_deltas(limit) {
        let change = delta.map_or_else(|| "baseline".to_string(), signed);
        println!(
            "   {}  {:>10}  {}",
            snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            snapshot.count,
            change
        );
    }

    println!(
        "\nShowing {} of {} snapshots",
        limit.min(history.len()),
        history.len()
    );

    Ok(())
}

fn run_parse(file: &Path, username: &str) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let username = username.trim_start_matches('@');
    let count = BrowserSampler::inspect_page(username, None, &html)?;
    println!("@{username}: {count} followers");

    Ok(())
}
