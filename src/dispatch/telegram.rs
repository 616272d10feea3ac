use super::{AlertDispatcher, DispatchError, MessageReceipt};
use async_trait::async_trait;
use teloxide::prelude::*;

/// Sends alerts to a Telegram chat through a bot account
pub struct TelegramDispatcher {
    bot: Bot,
}

impl TelegramDispatcher {
    pub fn new(token: &str) -> Self {
        Self { bot: Bot::new(token) }
    }
}

/// Telegram addresses chats by numeric id
fn parse_chat_id(to: &str) -> Result<ChatId, DispatchError> {
    to.trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| DispatchError::InvalidRecipient(format!("'{to}' is not a Telegram chat id")))
}

#[async_trait]
impl AlertDispatcher for TelegramDispatcher {
    fn name(&self) -> &'static str {
        "Telegram"
    }

    /// `from` is implied by the bot token and ignored
    async fn send(&self, body: &str, _from: &str, to: &str) -> Result<MessageReceipt, DispatchError> {
        let chat_id = parse_chat_id(to)?;
        log::debug!("Sending Telegram message to chat {chat_id}");

        let message = self.bot.send_message(chat_id, body.to_string()).await?;

        Ok(MessageReceipt {
            message_id: message.id.0.to_string(),
        })
    }
}
