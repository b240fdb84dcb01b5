//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Handles `/start`, reply-keyboard labels and dialog input
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats messages
//! - `dialogue_manager`: Drives the admin content-entry dialogs
//! - `messenger`: The outbound messaging seam used by the dialogs

pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod messenger;
pub mod ui_builder;

use sqlx::SqlitePool;
use std::sync::Arc;
use teloxide::types::User;

use crate::config::Config;
use crate::media::MediaStore;
use crate::session::SessionStore;

pub use callback_handler::callback_handler;
pub use dialogue_manager::{DialogueManager, Rejection, StepInput, StepOutcome};
pub use message_handler::message_handler;
pub use messenger::{Messenger, TelegramMessenger};

/// Everything the handlers share, injected through `dptree::deps!`
pub struct BotState {
    pub config: Config,
    pub pool: SqlitePool,
    pub media: MediaStore,
    pub sessions: Arc<SessionStore>,
    pub dialogues: DialogueManager,
}

impl BotState {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let sessions = Arc::new(match config.session_ttl {
            Some(ttl) => SessionStore::with_ttl(ttl),
            None => SessionStore::new(),
        });
        let media = MediaStore::new(config.media_root.clone());
        let dialogues = DialogueManager::new(pool.clone(), Arc::clone(&sessions), media.clone());

        Self {
            config,
            pool,
            media,
            sessions,
            dialogues,
        }
    }

    pub fn is_admin(&self, user: Option<&User>) -> bool {
        user.is_some_and(|user| self.config.is_admin(user.id))
    }
}

/// The user's Telegram language code, if any
pub(crate) fn language_of(user: Option<&User>) -> Option<&str> {
    user.and_then(|user| user.language_code.as_deref())
}
