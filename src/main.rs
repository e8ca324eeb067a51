use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use slerfhub::config::Config;
use slerfhub::wallet::{StaticWalletProvider, WalletAddress};

mod cli;

#[derive(Parser)]
#[command(name = "slerfhub")]
#[command(about = "SlerfHub rewards tracker - daily missions, weekly quests, reward claims")]
#[command(version)]
struct Cli {
    /// Working directory to look for .slerfhub/config.toml (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Path to the config file (defaults to .slerfhub/config.toml, then ~/.slerfhub/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rewards HTTP API
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,

        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },

    /// Write a starter config file (default: ~/.slerfhub/config.toml)
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,

        /// Generate an API token instead of leaving auth disabled
        #[arg(long)]
        token: bool,
    },

    /// List missions and quests in the catalog
    Catalog {
        /// Only show this kind: "mission" or "quest"
        #[arg(long)]
        kind: Option<String>,
    },

    /// Show balance, stats and progress for a wallet
    Status {
        /// Wallet address (EVM 0x... or Solana base58)
        #[arg(long)]
        wallet: String,
    },

    /// Show time left until the next daily and weekly reset
    Countdown,
}

fn load_config(cli_config: Option<PathBuf>, work_dir: &std::path::Path) -> Result<Config> {
    match cli_config {
        Some(path) => Config::from_file(&path),
        None => Config::from_dir(work_dir),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let work_dir = cli.path.unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Some(Commands::Init { force, token }) => {
            cli::init::init_command(cli.config, force, token)?;
        }
        Some(Commands::Serve { port, bind }) => {
            let config = load_config(cli.config, &work_dir)?;
            cli::serve::serve_command(config, bind, port)?;
        }
        Some(Commands::Catalog { kind }) => {
            let config = load_config(cli.config, &work_dir)?;
            cli::catalog::catalog_command(&config, kind)?;
        }
        Some(Commands::Status { wallet }) => {
            let config = load_config(cli.config, &work_dir)?;
            let provider = StaticWalletProvider::new(WalletAddress::parse(&wallet)?);
            cli::status::status_command(&config, &provider)?;
        }
        Some(Commands::Countdown) => {
            cli::countdown::countdown_command();
        }
        None => {
            // Default: run the API
            let config = load_config(cli.config, &work_dir)?;
            cli::serve::serve_command(config, None, None)?;
        }
    }

    Ok(())
}
