//! Chatdesk Console - headless admin console client.
//!
//! Connects to the backend, keeps the conversation roster and an optionally
//! selected conversation fresh, and logs activity. Useful for watching a
//! deployment from a terminal and as the reference driver for the client
//! library.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatdesk_console::{ConsoleConfig, ConsoleSession};

#[derive(Parser)]
#[command(name = "chatdesk-console")]
#[command(about = "Headless client for the Chatdesk WhatsApp admin console")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Phone number of a conversation to open and follow
    #[arg(long)]
    phone: Option<String>,

    /// Fetch the roster once, print it, and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = ConsoleConfig::load()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    tracing::info!("Starting Chatdesk console against {}", config.base_url);
    let mut session = ConsoleSession::new(config);

    session.refresh_roster().await?;
    for summary in session.store().roster() {
        tracing::info!(
            "{} ({}) [{} unread] - {}",
            summary.display_name,
            summary.phone_number,
            summary.unread_count,
            summary.last_message
        );
    }

    if cli.once {
        return Ok(());
    }

    if let Some(phone) = cli.phone {
        session.select_conversation(&phone).await?;
        if let Some(conversation) = session.store().current() {
            tracing::info!(
                "Opened {} with {} messages (has_more: {})",
                conversation.display_name,
                conversation.messages.len(),
                conversation.has_more()
            );
        }
    }

    session
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    Ok(())
}
