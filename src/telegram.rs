use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use tracing::{info, warn};

use crate::bridge::BridgeCore;
use crate::config::TelegramConfig;

pub mod handlers;

use self::handlers::HandlerContext;

// Must outlive teloxide's 10s long-polling timeout.
const HTTP_TIMEOUT_SECS: u64 = 45;

pub struct TelegramBot {
    bot: Bot,
    bridge: Arc<BridgeCore>,
    register_commands: bool,
}

impl TelegramBot {
    pub fn new(config: &TelegramConfig, bridge: Arc<BridgeCore>) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        let mut bot = Bot::with_client(&config.bot_token, client);
        if let Some(api_url) = config.api_url.as_deref() {
            info!("using custom telegram api url {}", api_url);
            bot = bot.set_api_url(url::Url::parse(api_url)?);
        }

        Ok(Self {
            bot,
            bridge,
            register_commands: config.register_commands,
        })
    }

    /// Verifies the token, registers the command menu and long-polls until
    /// the process is interrupted.
    pub async fn run(self) -> Result<()> {
        let me = self.bot.get_me().await?;
        let bot_username = me.username.clone();

        if self.register_commands {
            let commands = vec![
                BotCommand::new("start", "Show how to use this bot"),
                BotCommand::new("add", "Add an entry to the selected Notion database"),
                BotCommand::new("setdb", "Set the Notion database ID"),
                BotCommand::new("setsecret", "Set the Notion integration secret"),
            ];
            if let Err(e) = self.bot.set_my_commands(commands).await {
                warn!("failed to register bot commands: {e}");
            }
        }

        info!(username = ?bot_username, "telegram bot connected, starting long polling");

        let context = Arc::new(HandlerContext {
            bridge: self.bridge,
            bot_username,
        });

        Dispatcher::builder(self.bot, handlers::build_handler())
            .dependencies(dptree::deps![context])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("telegram polling stopped");
        Ok(())
    }
}
