//! vkbot CLI entry point.
//!
//! Provides `serve`, `send`, and `check-config` subcommands for running the
//! Callback API webhook, sending a single message, or validating configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use vkbot::api::VkClient;
use vkbot::bot;
use vkbot::config::Config;
use vkbot::webhook::{self, WebhookSettings};

/// vkbot — VK community bot adapter.
#[derive(Parser)]
#[command(name = "vkbot", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run the Callback API webhook server and drain incoming events.
    Serve {
        /// Reply to every new message with its own text.
        #[arg(long)]
        echo: bool,
    },
    /// Send one message and exit.
    Send {
        /// Recipient user id.
        user_id: i64,
        /// Message fragments, joined with `<br>`.
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Validate configuration and print it with credentials redacted.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: failed to load .env: {e}");
        }
    }

    let config_path = Config::config_path();
    let config = Config::load().context("failed to load configuration")?;

    // Logging settings live in the config; nothing is logged before this point.
    let _logging_guard = match (&cli.command, &config.logging.logs_dir) {
        (Command::Serve { .. }, Some(dir)) => {
            Some(vkbot::logging::init_production(dir, &config.logging.level)?)
        }
        _ => {
            vkbot::logging::init_cli(&config.logging.level);
            None
        }
    };
    info!(
        path = %config_path.display(),
        file_found = config_path.exists(),
        "configuration loaded"
    );

    match cli.command {
        Command::Serve { echo } => handle_serve(config, echo).await,
        Command::Send { user_id, text } => handle_send(config, user_id, text).await,
        Command::CheckConfig => handle_check_config(&config),
    }
}

/// Run the webhook server until Ctrl+C.
async fn handle_serve(config: Config, echo: bool) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;

    let client = VkClient::new(&config.bot).context("failed to build API client")?;
    let settings = WebhookSettings::from_config(&config.bot, &config.webhook);
    let (router, events) = webhook::listen(settings).context("failed to register webhook")?;

    let consumer = tokio::spawn(async move {
        bot::run_consumer(events, echo.then_some(&client)).await
    });

    let listener = tokio::net::TcpListener::bind(config.webhook.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.webhook.bind_address))?;

    webhook::serve(listener, router, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("received shutdown signal");
    })
    .await
    .context("webhook server failed")?;

    // The router owned the only sender; the consumer exits once the queue drains.
    match consumer.await {
        Ok(stats) => info!(
            received = stats.received,
            echoed = stats.echoed,
            failed = stats.failed,
            "event consumer finished"
        ),
        Err(e) => warn!(error = %e, "event consumer task failed"),
    }
    info!("vkbot shut down");
    Ok(())
}

/// Send a single message and print the API result.
async fn handle_send(config: Config, user_id: i64, text: Vec<String>) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;

    let client = VkClient::new(&config.bot).context("failed to build API client")?;
    let result = client
        .send(user_id, &text)
        .await
        .with_context(|| format!("failed to send message to {user_id}"))?;

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

/// Validate configuration and print the redacted result.
fn handle_check_config(config: &Config) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;
    println!("{config:#?}");
    Ok(())
}
