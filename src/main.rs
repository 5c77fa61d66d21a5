use clap::{Parser, Subcommand};
use hotfix_sweeper::cleanup::{build_preview, CleanupExecutor};
use hotfix_sweeper::config::SweeperConfig;
use hotfix_sweeper::host::GitLabClient;
use hotfix_sweeper::scheduler::{self, DailyAt};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::EnvFilter;

/// Remove stale hotfix branches from GitLab projects
#[derive(Parser)]
#[command(name = "hotfix-sweeper", version)]
#[command(about = "Hotfix Sweeper - Remove stale hotfix branches on a daily schedule", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean up every day at local midnight until interrupted (default command)
    Serve,
    /// Run a single cleanup pass now and exit
    Run {
        /// Report the branches that would be deleted without deleting them
        #[arg(long)]
        dry_run: bool,

        /// Print the resulting branches as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show filtered projects, their hotfix branches and what a cleanup would delete
    Preview,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        2 => "trace",
        _ => "trace,hyper=debug,reqwest=debug",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 3)
        .with_line_number(cli.verbose >= 3)
        .init();

    debug!("hotfix-sweeper started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let config = match SweeperConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_serve(config).await,
        Commands::Run { dry_run, json } => run_once(config, dry_run, json).await,
        Commands::Preview => run_preview(config).await,
    };

    if let Err(e) = result {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn build_executor(config: &SweeperConfig) -> anyhow::Result<Arc<CleanupExecutor>> {
    let token = SecretString::new(config.token.expose_secret().into());
    let client = GitLabClient::new(config.base_url.clone(), token)?;
    Ok(Arc::new(CleanupExecutor::new(
        Arc::new(client),
        config.cleanup_settings(),
    )))
}

async fn run_serve(config: SweeperConfig) -> anyhow::Result<()> {
    let executor = build_executor(&config)?;

    if let Some(id) = &config.project_override {
        info!(
            "GitLab branch cleaner started in TEST mode for project ID: {}",
            id
        );
    } else {
        info!("GitLab branch cleaner started. Waiting for midnight to clean hotfix branches across all projects...");
        if !config.group_filter.is_empty() {
            info!("Group filter active for: {}", config.group_filter);
        }
    }

    scheduler::serve(
        executor,
        DailyAt::midnight(),
        config.run_immediately,
        shutdown_signal(),
    )
    .await;
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigint, mut sigterm) =
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to install signal handlers: {}", e);
                wait_for_ctrl_c().await;
                return;
            }
        };

    tokio::select! {
        _ = sigint.recv() => {
            info!("Received SIGINT, initiating graceful shutdown");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
        Err(e) => {
            // Without a signal source the process runs until killed
            warn!("Failed to listen for Ctrl+C signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

async fn run_once(config: SweeperConfig, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let executor = build_executor(&config)?;
    let branches = executor.run_cleanup(dry_run).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&branches)?);
        return Ok(());
    }

    let verb = if dry_run { "Would delete" } else { "Deleted" };
    if branches.is_empty() {
        println!("No hotfix branches to delete.");
    }
    for branch in &branches {
        println!("{} {} from {}", verb, branch.name, branch.project);
    }
    Ok(())
}

async fn run_preview(config: SweeperConfig) -> anyhow::Result<()> {
    let executor = build_executor(&config)?;
    let report = build_preview(&executor).await?;
    println!("{report}");
    Ok(())
}
