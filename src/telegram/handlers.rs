use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, error, warn};

use crate::bridge::{BridgeCore, RelayRequest};
use crate::parsers::{ParsedCommand, parse_command, single_arg};

pub const WELCOME_REPLY: &str =
    "Welcome to the Notion Bot!\nUse /add to add an entry to the selected Notion database.";
pub const SETDB_HINT_REPLY: &str = "Use /setdb to set the Notion database ID and secret.";
pub const ADD_USAGE_REPLY: &str = "Please provide the text to add with the /add command.";
pub const SETDB_USAGE_REPLY: &str = "Please provide the Notion database ID with the /setdb command.";
pub const SETSECRET_USAGE_REPLY: &str =
    "Please provide your Notion secret with the /setsecret command.";
pub const SETSECRET_REPLY: &str = "Your Notion secret has been set and associated with your user.";
pub const SETTINGS_FAILURE_REPLY: &str = "Failed to save your Notion settings. Please try again.";

/// Shared context injected into teloxide's dispatcher.
pub struct HandlerContext {
    pub bridge: Arc<BridgeCore>,
    pub bot_username: Option<String>,
}

/// Fields of a Telegram text message the bridge cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundText {
    pub chat_id: i64,
    pub message_id: i64,
    pub reply_to_message_id: Option<i64>,
    pub text: String,
}

impl InboundText {
    /// Returns `None` for messages without text (stickers, photos, service messages).
    pub fn from_message(msg: &Message) -> Option<Self> {
        let text = msg.text()?;
        Some(Self {
            chat_id: msg.chat.id.0,
            message_id: i64::from(msg.id.0),
            reply_to_message_id: msg.reply_to_message().map(|parent| i64::from(parent.id.0)),
            text: text.to_string(),
        })
    }

    fn relay(&self, entry_text: &str) -> RelayRequest {
        RelayRequest {
            entry_text: entry_text.to_string(),
            chat_id: self.chat_id,
            message_id: self.message_id,
            reply_to_message_id: self.reply_to_message_id,
        }
    }
}

pub fn build_handler() -> Handler<
    'static,
    DependencyMap,
    Result<(), Box<dyn std::error::Error + Send + Sync>>,
    teloxide::dispatching::DpHandlerDescription,
> {
    Update::filter_message().endpoint(handle_message)
}

async fn handle_message(
    msg: Message,
    bot: Bot,
    ctx: Arc<HandlerContext>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(inbound) = InboundText::from_message(&msg) else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };

    let replies = respond(&ctx.bridge, ctx.bot_username.as_deref(), &inbound).await;
    for reply in replies {
        if let Err(e) = bot.send_message(msg.chat.id, reply).await {
            error!(
                chat_id = inbound.chat_id,
                message_id = inbound.message_id,
                "failed to send reply: {e}"
            );
            return Err(e.into());
        }
    }
    Ok(())
}

/// Runs the command or relay for one message and returns the replies to send,
/// in order.
pub async fn respond(
    bridge: &BridgeCore,
    bot_username: Option<&str>,
    inbound: &InboundText,
) -> Vec<String> {
    match parse_command(&inbound.text, bot_username) {
        ParsedCommand::Start => vec![WELCOME_REPLY.to_string(), SETDB_HINT_REPLY.to_string()],
        ParsedCommand::Add(None) => vec![ADD_USAGE_REPLY.to_string()],
        ParsedCommand::Add(Some(entry_text)) => vec![relay(bridge, inbound, &entry_text).await],
        ParsedCommand::SetDatabase(args) => {
            let Some(collection_id) = single_arg(&args) else {
                return vec![SETDB_USAGE_REPLY.to_string()];
            };
            match bridge.set_collection(inbound.chat_id, collection_id).await {
                Ok(()) => vec![format!(
                    "You have selected the Notion database with ID: {collection_id} and associated Notion secret."
                )],
                Err(e) => {
                    warn!(chat_id = inbound.chat_id, "failed to store notion database: {e}");
                    vec![SETTINGS_FAILURE_REPLY.to_string()]
                }
            }
        }
        ParsedCommand::SetSecret(args) => {
            let Some(secret) = single_arg(&args) else {
                return vec![SETSECRET_USAGE_REPLY.to_string()];
            };
            match bridge.set_secret(inbound.chat_id, secret).await {
                Ok(()) => vec![SETSECRET_REPLY.to_string()],
                Err(e) => {
                    warn!(chat_id = inbound.chat_id, "failed to store notion secret: {e}");
                    vec![SETTINGS_FAILURE_REPLY.to_string()]
                }
            }
        }
        ParsedCommand::PlainText => {
            let entry_text = inbound.text.trim();
            if entry_text.is_empty() {
                return Vec::new();
            }
            vec![relay(bridge, inbound, entry_text).await]
        }
        ParsedCommand::ForeignBot => {
            debug!(chat_id = inbound.chat_id, "ignoring command for another bot");
            Vec::new()
        }
    }
}

async fn relay(bridge: &BridgeCore, inbound: &InboundText, entry_text: &str) -> String {
    bridge
        .handle(&inbound.relay(entry_text))
        .await
        .reply_text()
        .to_string()
}
