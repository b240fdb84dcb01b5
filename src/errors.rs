//! # Error Types Module
//!
//! Error types shared by the persistence layer, the dialog engine and the
//! media store. Handlers at the dispatch boundary convert these into a
//! generic user-facing notice.

use thiserror::Error;

/// Errors raised below the dispatch boundary
#[derive(Debug, Error)]
pub enum BotError {
    /// The SQLite store rejected or failed an operation
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    /// Downloading an attachment from Telegram failed
    #[error("media transfer failed: {0}")]
    Media(String),
    /// Writing or reading a media file failed
    #[error("file system error: {0}")]
    Io(#[from] std::io::Error),
    /// A Bot API request failed
    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
    /// The environment is missing or carries a malformed setting
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A dialog reached its terminal step without a required field
    #[error("dialog draft is missing field `{0}`")]
    IncompleteDraft(&'static str),
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        BotError::Media(err.to_string())
    }
}

pub type BotResult<T> = Result<T, BotError>;
