use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "betarb")]
#[command(about = "Cross-exchange arbitrage and market-making bot for Betfair/Betdaq", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tick engine against the bundled simulated venues
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Betarb.toml")]
        config: String,
        /// Stop after this many ticks (overrides the config)
        #[arg(long)]
        ticks: Option<u64>,
        /// Seed the simulated venues with a synthetic arbitrage book
        #[arg(long)]
        demo: bool,
    },
    /// Load, resolve, and print the configuration
    CheckConfig {
        /// Config file path
        #[arg(short, long, default_value = "config/Betarb.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            ticks,
            demo,
        } => commands::run(&config, ticks, demo).await,
        Commands::CheckConfig { config } => commands::check_config(&config),
    }
}
