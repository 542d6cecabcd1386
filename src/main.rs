use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uptime_monitor::config::Config;
use uptime_monitor::models::{TargetId, DEFAULT_INTERVAL_SECS};

mod commands;

#[derive(Parser)]
#[command(
    name = "uptime-monitor",
    version,
    about = "HTTP uptime monitor with per-target probe scheduling",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (defaults to environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler and the HTTP API
    Serve {
        /// Address to bind, e.g. 0.0.0.0:8000
        #[arg(short, long)]
        bind: Option<std::net::SocketAddr>,
    },

    /// Probe a single URL once and print the outcome
    Check {
        /// URL to probe
        url: String,

        /// Request timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Manage targets directly in the store
    Targets {
        #[command(subcommand)]
        action: TargetCommands,
    },
}

#[derive(Subcommand)]
enum TargetCommands {
    /// Register a new target
    Add {
        /// Absolute http(s) URL
        url: String,

        /// Probe interval in seconds
        #[arg(short, long, default_value_t = DEFAULT_INTERVAL_SECS)]
        interval: u64,

        /// Register the target disabled
        #[arg(long, default_value = "false")]
        disabled: bool,
    },

    /// List targets with their latest check
    List,

    /// Delete a target (its history is kept)
    Remove {
        /// Target id
        id: TargetId,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    if let Some(format) = &cli.log_format {
        config.logging.format = format.to_lowercase();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    // Initialize tracing/logging
    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            commands::serve(config).await?;
        }
        Commands::Check { url, timeout } => {
            let timeout = timeout.unwrap_or(config.scheduler.http_timeout_secs);
            let ok = commands::check(&url, timeout, &config.scheduler.user_agent).await?;
            if !ok {
                std::process::exit(1);
            }
        }
        Commands::Targets { action } => {
            let db_path = &config.storage.db_path;
            match action {
                TargetCommands::Add {
                    url,
                    interval,
                    disabled,
                } => commands::add_target(db_path, &url, interval, !disabled)?,
                TargetCommands::List => commands::list_targets(db_path)?,
                TargetCommands::Remove { id } => commands::remove_target(db_path, id)?,
            }
        }
    }

    Ok(())
}

/// Set up tracing/logging
///
/// `RUST_LOG` wins over the configured level when set.
fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => {
            tracing_subscriber::EnvFilter::try_new(directives)?
        }
        _ if verbose => tracing_subscriber::EnvFilter::new("uptime_monitor=debug,tower_http=debug,info"),
        _ => tracing_subscriber::EnvFilter::try_new(format!(
            "uptime_monitor={level},tower_http={level},warn"
        ))?,
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}
