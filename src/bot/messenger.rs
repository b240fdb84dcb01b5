//! Outbound messaging used by the dialog engine.
//!
//! The engine only needs to send a text, delete a message and fetch an
//! uploaded file, so it talks to this trait instead of `Bot` directly.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{FileId, InlineKeyboardMarkup, MessageId, ParseMode};
use tracing::debug;

use crate::errors::{BotError, BotResult};

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send an HTML text message and return its id
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> BotResult<MessageId>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> BotResult<()>;

    /// Fetch the bytes of an uploaded file
    async fn download(&self, file_id: &str) -> BotResult<Vec<u8>>;
}

/// `Messenger` backed by the Bot API
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> BotResult<MessageId> {
        let mut request = self
            .bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        let message = request.await?;
        Ok(message.id)
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> BotResult<()> {
        self.bot.delete_message(chat_id, message_id).await?;
        Ok(())
    }

    async fn download(&self, file_id: &str) -> BotResult<Vec<u8>> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .map_err(|e| BotError::Media(format!("getFile failed: {e}")))?;
        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot.token(),
            file.path
        );

        let response = reqwest::get(&url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!(file_id = file_id, size = bytes.len(), "Downloaded attachment");
        Ok(bytes.to_vec())
    }
}
