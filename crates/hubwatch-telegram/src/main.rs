//! Hubwatch Telegram bot binary.
//!
//! Start the bot with:
//! ```bash
//! GITHUB_TOKEN=ghp_xxx TELEGRAM_BOT_TOKEN=xxx cargo run -p hubwatch-telegram
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use hubwatch_core::{config, Config, GitHubClient};
use hubwatch_telegram::HubwatchBot;
use tracing_subscriber::EnvFilter;

/// Hubwatch - GitHub commit notifications and file downloads on Telegram
#[derive(Parser, Debug)]
#[command(name = "hubwatch")]
#[command(about = "Telegram bot that posts new GitHub commits and fetches repository files")]
struct Args {
    /// Seconds between update checks (overrides HUBWATCH_POLL_INTERVAL_SECS)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load secrets from the config directory, then .env.local / .env
    config::load_env_files();

    // Initialize logging based on verbosity
    let filter = match args.verbose {
        0 => "hubwatch_telegram=info,hubwatch_core=info,teloxide=warn",
        1 => "hubwatch_telegram=debug,hubwatch_core=debug,teloxide=info",
        2 => "hubwatch_telegram=trace,hubwatch_core=trace,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // A missing GitHub token is fatal.
    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    if let Some(secs) = args.interval {
        config.poll_interval = Duration::from_secs(secs);
    }

    if config.telegram_token.is_none() {
        tracing::error!("TELEGRAM_BOT_TOKEN is not set; not starting the bot");
        return Ok(());
    }

    let host = Arc::new(GitHubClient::with_api_url(
        &config.github_token,
        &config.github_api_url,
    )?);
    let bot = HubwatchBot::new(&config, host)?;

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[robot] Hubwatch");
            println!("   Bot: @{}", username);
            println!("   Poll interval: {}s", config.poll_interval.as_secs());
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("\n[phone] Open Telegram and send /start to begin");
    println!("   Press Ctrl+C to stop\n");

    bot.run().await?;

    Ok(())
}
