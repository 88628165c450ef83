#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::Parser;
use tokio::task::JoinError;
use tracing::{error, info};

mod bridge;
mod cli;
mod config;
mod db;
mod notion;
mod parsers;
mod telegram;
mod utils;
mod web;

use cli::Cli;
use config::Config;
use notion::{NotionApi, NotionClient};
use telegram::TelegramBot;
use web::WebServer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_from_file(&cli.config)?;
    utils::logging::init_tracing(&config.logging);
    info!(
        "telegram-notion bridge starting up config={}",
        cli.config.display()
    );

    let db_manager = Arc::new(db::DatabaseManager::new(&config.database).await?);
    db_manager.migrate().await?;

    if cli.check {
        info!("configuration and database are valid");
        return Ok(());
    }

    let notion: Arc<dyn NotionApi> = Arc::new(NotionClient::new(&config.notion)?);
    let bridge = Arc::new(bridge::BridgeCore::new(db_manager, notion));

    let web_handle = if config.web.enabled {
        let web_server = WebServer::new(config.web.clone(), bridge.clone());
        Some(tokio::spawn(async move {
            if let Err(e) = web_server.start().await {
                error!("web server error: {}", e);
            }
        }))
    } else {
        None
    };

    let telegram_bot = TelegramBot::new(&config.telegram, bridge)?;
    let bot_handle = tokio::spawn(async move {
        if let Err(e) = telegram_bot.run().await {
            error!("telegram bot error: {}", e);
        }
    });

    match web_handle {
        Some(web_handle) => {
            tokio::select! {
                result = web_handle => task_exit("web server", result)?,
                result = bot_handle => task_exit("telegram bot", result)?,
            }
        }
        None => task_exit("telegram bot", bot_handle.await)?,
    }

    info!("telegram-notion bridge shutting down");
    Ok(())
}

/// Turns a panicked or cancelled task into an error for `main`.
fn task_exit(task: &str, result: Result<(), JoinError>) -> Result<()> {
    result.map_err(|e| {
        error!("{} task failed: {}", task, e);
        anyhow!("{task} task failed: {e}")
    })
}

#[cfg(test)]
mod tests {
    use tokio::task::JoinHandle;

    use super::task_exit;

    #[tokio::test]
    async fn panicked_task_is_reported_as_error() {
        let handle: JoinHandle<()> = tokio::spawn(async { panic!("bot crashed") });

        let err = task_exit("telegram bot", handle.await).expect_err("panic is an error");

        assert!(err.to_string().contains("telegram bot task failed"));
    }

    #[tokio::test]
    async fn finished_task_is_ok() {
        let handle = tokio::spawn(async {});

        assert!(task_exit("web server", handle.await).is_ok());
    }
}
