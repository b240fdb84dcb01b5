//! Dialogue Manager module: drives admin content-entry dialogs one step per
//! user turn and writes the record when the last step is accepted.

use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::types::{ChatId, MessageId};
use tracing::{debug, info, warn};

use crate::content::{ContentKind, Field};
use crate::db::{create_item, replace_greeting};
use crate::dialogue::{validate_field_text, DialogStep, Expectation, TextRejection};
use crate::errors::{BotError, BotResult};
use crate::localization::t_lang;
use crate::media::{document_file_name, photo_file_name, MediaStore};
use crate::session::{MessageRef, Session, SessionStore};

use super::messenger::Messenger;
use super::ui_builder::{prompt_keyboard, prompt_text};

/// One user turn offered to the active dialog
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepInput {
    Text(String),
    Photo { file_id: String },
    Document { file_id: String, file_name: Option<String> },
    /// The skip-file button
    Skip,
}

/// Why a turn was refused without advancing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    EmptyText,
    ExpectedText,
    ExpectedPhoto,
    ExpectedAttachment,
    /// Skip pressed while the step has no file to skip
    NothingToSkip,
}

impl Rejection {
    fn notice_key(self) -> &'static str {
        match self {
            Rejection::EmptyText => "dialog-empty-text",
            Rejection::ExpectedText => "dialog-expect-text",
            Rejection::ExpectedPhoto => "dialog-expect-photo",
            Rejection::ExpectedAttachment => "dialog-expect-attachment",
            Rejection::NothingToSkip => "dialog-nothing-to-skip",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// No dialog is active for the chat
    NoDialog,
    Advanced(DialogStep),
    Rejected(Rejection),
    /// The attachment could not be fetched or stored; the step can be retried
    MediaFailed,
    Completed(ContentKind),
}

/// What a step did with its input
enum Accepted {
    Stored { saved: Option<PathBuf> },
    Rejected(Rejection),
}

pub struct DialogueManager {
    pool: SqlitePool,
    sessions: Arc<SessionStore>,
    media: MediaStore,
}

impl DialogueManager {
    pub fn new(pool: SqlitePool, sessions: Arc<SessionStore>, media: MediaStore) -> Self {
        Self { pool, sessions, media }
    }

    /// Begin a dialog for `kind`, discarding any unfinished one
    pub async fn start_dialog(
        &self,
        messenger: &dyn Messenger,
        chat_id: ChatId,
        kind: ContentKind,
        language_code: Option<&str>,
    ) -> BotResult<DialogStep> {
        self.sessions.clear(chat_id).await;
        self.media.ensure_folder(kind).await?;

        let step = DialogStep::first(kind);
        let prompt = messenger
            .send_text(
                chat_id,
                &prompt_text(step, language_code),
                prompt_keyboard(step, language_code),
            )
            .await?;

        let mut session = Session::new(step);
        session.remember(MessageRef { chat_id, message_id: prompt });
        self.sessions.put(chat_id, session).await;

        info!(chat_id = %chat_id, kind = kind.name(), "Dialog started");
        Ok(step)
    }

    /// Offer one turn to the active dialog.
    ///
    /// Notices for refused input are sent here, except `NothingToSkip`, which
    /// the caller reports as a button alert. The stored session is replaced
    /// only when the turn succeeds, is refused or its attachment fails;
    /// a failed attachment keeps the step and draft as they were.
    pub async fn submit_step(
        &self,
        messenger: &dyn Messenger,
        chat_id: ChatId,
        input: StepInput,
        incoming: Option<MessageId>,
        language_code: Option<&str>,
    ) -> BotResult<StepOutcome> {
        let Some(mut session) = self.sessions.get(chat_id).await else {
            return Ok(StepOutcome::NoDialog);
        };
        let Some(step) = session.step else {
            return Ok(StepOutcome::NoDialog);
        };
        if let Some(message_id) = incoming {
            session.remember(MessageRef { chat_id, message_id });
        }

        let saved = match self.accept(messenger, step, input, &mut session).await {
            Ok(Accepted::Stored { saved }) => saved,
            Ok(Accepted::Rejected(Rejection::NothingToSkip)) => {
                return Ok(StepOutcome::Rejected(Rejection::NothingToSkip));
            }
            Ok(Accepted::Rejected(rejection)) => {
                debug!(chat_id = %chat_id, step = ?step, rejection = ?rejection, "Dialog input refused");
                let notice = messenger
                    .send_text(chat_id, &t_lang(rejection.notice_key(), language_code), None)
                    .await?;
                session.remember(MessageRef { chat_id, message_id: notice });
                self.sessions.put(chat_id, session).await;
                return Ok(StepOutcome::Rejected(rejection));
            }
            Err(e @ (BotError::Media(_) | BotError::Io(_))) => {
                warn!(chat_id = %chat_id, error = %e, "Attachment could not be saved");
                let notice = self.send_media_failure(messenger, chat_id, language_code).await?;
                session.remember(MessageRef { chat_id, message_id: notice });
                self.sessions.put(chat_id, session).await;
                return Ok(StepOutcome::MediaFailed);
            }
            Err(e) => return Err(e),
        };

        match step.next() {
            Some(next) => match self.advance(messenger, chat_id, session, next, language_code).await {
                Ok(next) => Ok(StepOutcome::Advanced(next)),
                Err(e) => {
                    self.discard_saved(saved).await;
                    Err(e)
                }
            },
            None => {
                let kind = step.kind();
                if let Err(e) = self.persist(chat_id, kind, &session).await {
                    self.discard_saved(saved).await;
                    return Err(e);
                }
                self.finish(messenger, chat_id, kind, session, language_code).await?;
                Ok(StepOutcome::Completed(kind))
            }
        }
    }

    async fn discard_saved(&self, saved: Option<PathBuf>) {
        if let Some(path) = saved {
            self.media.discard(&path).await;
        }
    }

    async fn accept(
        &self,
        messenger: &dyn Messenger,
        step: DialogStep,
        input: StepInput,
        session: &mut Session,
    ) -> BotResult<Accepted> {
        let kind = step.kind();
        match (step.expectation(), input) {
            (_, StepInput::Skip) if step.expectation() != Expectation::Attachment => {
                Ok(Accepted::Rejected(Rejection::NothingToSkip))
            }
            (Expectation::Text(field), StepInput::Text(text)) => match validate_field_text(&text) {
                Ok(value) => {
                    session.draft.set(field, value);
                    Ok(Accepted::Stored { saved: None })
                }
                Err(TextRejection::Empty) => Ok(Accepted::Rejected(Rejection::EmptyText)),
            },
            (Expectation::Text(_), _) => Ok(Accepted::Rejected(Rejection::ExpectedText)),
            (Expectation::Photo, StepInput::Photo { file_id }) => {
                let path = self.store(messenger, kind, &file_id, photo_file_name()).await?;
                session.draft.set_media_path(path.to_string_lossy().into_owned());
                Ok(Accepted::Stored { saved: Some(path) })
            }
            (Expectation::Photo, _) => Ok(Accepted::Rejected(Rejection::ExpectedPhoto)),
            (Expectation::Attachment, StepInput::Photo { file_id }) => {
                let path = self.store(messenger, kind, &file_id, photo_file_name()).await?;
                session.draft.set_media_path(path.to_string_lossy().into_owned());
                Ok(Accepted::Stored { saved: Some(path) })
            }
            (Expectation::Attachment, StepInput::Document { file_id, file_name }) => {
                let name = document_file_name(file_name.as_deref());
                let path = self.store(messenger, kind, &file_id, name).await?;
                session.draft.set_media_path(path.to_string_lossy().into_owned());
                Ok(Accepted::Stored { saved: Some(path) })
            }
            (Expectation::Attachment, StepInput::Skip) => Ok(Accepted::Stored { saved: None }),
            (Expectation::Attachment, StepInput::Text(_)) => {
                Ok(Accepted::Rejected(Rejection::ExpectedAttachment))
            }
        }
    }

    async fn store(
        &self,
        messenger: &dyn Messenger,
        kind: ContentKind,
        file_id: &str,
        file_name: String,
    ) -> BotResult<PathBuf> {
        let bytes = messenger.download(file_id).await?;
        self.media.save(kind, &file_name, &bytes).await
    }

    async fn send_media_failure(
        &self,
        messenger: &dyn Messenger,
        chat_id: ChatId,
        language_code: Option<&str>,
    ) -> BotResult<MessageId> {
        messenger
            .send_text(chat_id, &t_lang("error-media-failed", language_code), None)
            .await
    }

    async fn advance(
        &self,
        messenger: &dyn Messenger,
        chat_id: ChatId,
        mut session: Session,
        next: DialogStep,
        language_code: Option<&str>,
    ) -> BotResult<DialogStep> {
        let prompt = messenger
            .send_text(
                chat_id,
                &prompt_text(next, language_code),
                prompt_keyboard(next, language_code),
            )
            .await?;
        session.remember(MessageRef { chat_id, message_id: prompt });
        session.step = Some(next);
        self.sessions.put(chat_id, session).await;

        debug!(chat_id = %chat_id, step = ?next, "Dialog advanced");
        Ok(next)
    }

    async fn persist(&self, chat_id: ChatId, kind: ContentKind, session: &Session) -> BotResult<()> {
        match kind {
            ContentKind::Greeting => {
                let text = session
                    .draft
                    .get(Field::Text)
                    .ok_or(BotError::IncompleteDraft(Field::Text.name()))?;
                replace_greeting(&self.pool, session.draft.media_path(), text).await?;
            }
            _ => {
                let item = session.draft.to_new_item(kind)?;
                let id = create_item(&self.pool, &item).await?;
                debug!(chat_id = %chat_id, id = id, "Dialog record inserted");
            }
        }
        Ok(())
    }

    /// Purge the dialog's messages, drop the session and confirm
    async fn finish(
        &self,
        messenger: &dyn Messenger,
        chat_id: ChatId,
        kind: ContentKind,
        session: Session,
        language_code: Option<&str>,
    ) -> BotResult<()> {
        purge(messenger, &session.cleanup).await;
        self.sessions.clear(chat_id).await;

        let has_file_step = kind
            .collection()
            .is_some_and(|collection| collection.descriptor().has_file_step);
        let without_file = has_file_step && session.draft.media_path().is_none();
        let key = if without_file {
            format!("done-{}-no-file", kind.name())
        } else {
            format!("done-{}", kind.name())
        };
        messenger.send_text(chat_id, &t_lang(&key, language_code), None).await?;

        info!(chat_id = %chat_id, kind = kind.name(), "Dialog completed");
        Ok(())
    }
}

/// Delete every tracked message; failures are ignored
async fn purge(messenger: &dyn Messenger, messages: &[MessageRef]) {
    for message in messages {
        if let Err(e) = messenger.delete_message(message.chat_id, message.message_id).await {
            debug!(chat_id = %message.chat_id, message_id = message.message_id.0, error = %e, "Cleanup delete failed");
        }
    }
}
