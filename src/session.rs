//! Per-conversation dialog sessions.
//!
//! A session holds the step an admin dialog is waiting on, the draft it has
//! collected so far and the messages to delete once it completes. The store
//! is keyed by chat and injected into the dialogue manager.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use teloxide::types::{ChatId, MessageId};
use tokio::sync::Mutex;
use tracing::debug;

use crate::dialogue::{DialogStep, Draft};

/// A message to delete when the dialog ends
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub step: Option<DialogStep>,
    pub draft: Draft,
    pub cleanup: Vec<MessageRef>,
    touched_at: DateTime<Utc>,
}

impl Session {
    pub fn new(step: DialogStep) -> Self {
        Self {
            step: Some(step),
            draft: Draft::default(),
            cleanup: Vec::new(),
            touched_at: Utc::now(),
        }
    }

    pub fn remember(&mut self, message: MessageRef) {
        self.cleanup.push(message);
    }
}

/// In-memory session store shared by every conversation
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<ChatId, Session>>,
    ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions idle longer than `ttl` are treated as absent
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    pub async fn get(&self, chat_id: ChatId) -> Option<Session> {
        self.get_at(chat_id, Utc::now()).await
    }

    pub async fn get_at(&self, chat_id: ChatId, now: DateTime<Utc>) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&chat_id) {
            Some(session) if self.is_expired(session, now) => {
                debug!(chat_id = %chat_id, "Dropping expired session");
                sessions.remove(&chat_id);
                None
            }
            Some(session) => Some(session.clone()),
            None => None,
        }
    }

    /// Store `session` for the chat, replacing whatever was there
    pub async fn put(&self, chat_id: ChatId, session: Session) {
        self.put_at(chat_id, session, Utc::now()).await;
    }

    pub async fn put_at(&self, chat_id: ChatId, mut session: Session, now: DateTime<Utc>) {
        session.touched_at = now;
        self.sessions.lock().await.insert(chat_id, session);
    }

    pub async fn clear(&self, chat_id: ChatId) {
        self.sessions.lock().await.remove(&chat_id);
    }

    /// Remove every expired session; returns how many were dropped
    pub async fn prune_expired(&self) -> usize {
        self.prune_expired_at(Utc::now()).await
    }

    pub async fn prune_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !self.is_expired(session, now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        self.ttl
            .map(|ttl| now - session.touched_at > ttl)
            .unwrap_or(false)
    }
}
