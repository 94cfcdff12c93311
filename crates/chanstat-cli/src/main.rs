use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod run;

#[derive(Debug, Parser)]
#[command(name = "chanstat")]
#[command(about = "Channel statistics collector")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect recent posts and print them
    Collect {
        /// Channel username or t.me link; falls back to CHANSTAT_DEFAULT_CHANNEL
        channel: Option<String>,

        /// Maximum number of messages to fetch
        #[arg(long, value_parser = parse_limit)]
        limit: Option<usize>,

        /// Print every record as JSON instead of a one-line summary
        #[arg(long)]
        json: bool,
    },
    /// Collect and write the dataset as CSV
    Export {
        channel: Option<String>,

        #[arg(long, value_parser = parse_limit)]
        limit: Option<usize>,

        /// Output file; defaults to telegram_stats_<timestamp>.csv in the current directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Collect and print channel totals plus a comment digest as JSON
    Summary {
        channel: Option<String>,

        #[arg(long, value_parser = parse_limit)]
        limit: Option<usize>,
    },
    /// Ask the model for insights on one collected post
    Analyze {
        channel: Option<String>,

        /// 0-based position of the post in the collected dataset
        #[arg(long)]
        post: usize,

        #[arg(long, value_parser = parse_limit)]
        limit: Option<usize>,
    },
    /// Ask the model to summarise audience reaction across collected comments
    Comments {
        channel: Option<String>,

        #[arg(long, value_parser = parse_limit)]
        limit: Option<usize>,
    },
}

fn parse_limit(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("limit must be at least 1".to_string()),
        Ok(limit) => Ok(limit),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = chanstat_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?config, "configuration loaded");

    match command {
        Commands::Collect {
            channel,
            limit,
            json,
        } => run::run_collect(&config, channel.as_deref(), limit, json).await,
        Commands::Export {
            channel,
            limit,
            out,
        } => run::run_export(&config, channel.as_deref(), limit, out.as_deref()).await,
        Commands::Summary { channel, limit } => {
            run::run_summary(&config, channel.as_deref(), limit).await
        }
        Commands::Analyze {
            channel,
            post,
            limit,
        } => run::run_analyze(&config, channel.as_deref(), post, limit).await,
        Commands::Comments { channel, limit } => {
            run::run_comments(&config, channel.as_deref(), limit).await
        }
    }
}
