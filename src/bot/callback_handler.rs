//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, InlineKeyboardMarkup, ParseMode};
use teloxide::utils::html::escape;
use teloxide::{ApiError, RequestError};
use tracing::{debug, error, warn};

use crate::callback_data::CallbackAction;
use crate::content::{CollectionKind, ContentKind, ListMode};
use crate::db::{get_greeting, get_item, Item};
use crate::localization::t_lang;
use crate::media::MediaStore;
use crate::pagination::{render_after_delete, render_page, ListView};

use super::dialogue_manager::{Rejection, StepInput, StepOutcome};
use super::message_handler::{send_file, send_html};
use super::messenger::TelegramMessenger;
use super::ui_builder::{
    admin_empty_text, collection_menu_keyboard, collection_menu_text, detail_keyboard, detail_text,
    greeting_menu_keyboard, greeting_menu_text, no_more_text, not_found_text, settings_keyboard,
    settings_text,
};
use super::{language_of, BotState};

/// How a callback query is answered
#[derive(Debug, PartialEq, Eq)]
enum Answer {
    Silent,
    Toast(String),
    Alert(String),
}

/// Toast shown after a delete press; a stale button finds nothing to remove
fn delete_answer(kind: CollectionKind, removed: bool, language_code: Option<&str>) -> Answer {
    if removed {
        Answer::Toast(t_lang("deleted", language_code))
    } else {
        Answer::Toast(not_found_text(kind, language_code))
    }
}

/// What opening an item from the browse list shows
#[derive(Debug, PartialEq)]
enum Detail {
    Missing(Answer),
    Show {
        text: String,
        keyboard: InlineKeyboardMarkup,
        attachment: Option<PathBuf>,
    },
}

fn detail_for(
    item: Option<&Item>,
    kind: CollectionKind,
    page: u32,
    media: &MediaStore,
    language_code: Option<&str>,
) -> Detail {
    match item {
        None => Detail::Missing(Answer::Alert(not_found_text(kind, language_code))),
        Some(item) => Detail::Show {
            text: detail_text(item),
            keyboard: detail_keyboard(kind, page, language_code),
            attachment: media.existing(item.file_path()),
        },
    }
}

/// The pressed button and everything needed to answer it
struct CallbackContext<'a> {
    bot: &'a Bot,
    query: &'a CallbackQuery,
    state: &'a BotState,
    chat_id: ChatId,
    language_code: Option<&'a str>,
}

impl CallbackContext<'_> {
    fn messenger(&self) -> TelegramMessenger {
        TelegramMessenger::new(self.bot.clone())
    }

    /// Replace the pressed message in place when possible, otherwise send a new one
    async fn edit_or_send(&self, text: String, keyboard: InlineKeyboardMarkup) -> Result<()> {
        let chat_id = self.chat_id;
        let Some(message) = self.query.regular_message().filter(|m| m.text().is_some()) else {
            return send_html(self.bot, chat_id, text, Some(keyboard.into())).await;
        };

        let edited = if message.text() == Some(text.as_str()) {
            self.bot
                .edit_message_reply_markup(chat_id, message.id)
                .reply_markup(keyboard.clone())
                .await
                .map(|_| ())
        } else {
            self.bot
                .edit_message_text(chat_id, message.id, text.clone())
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard.clone())
                .await
                .map(|_| ())
        };

        match edited {
            Ok(()) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => {
                debug!(chat_id = %chat_id, error = %e, "Edit failed, sending a new message");
                send_html(self.bot, chat_id, text, Some(keyboard.into())).await
            }
        }
    }

    async fn show_list(
        &self,
        view: ListView,
        kind: CollectionKind,
        mode: ListMode,
        removed: Option<bool>,
    ) -> Result<Answer> {
        let done = match removed {
            Some(removed) => delete_answer(kind, removed, self.language_code),
            None => Answer::Silent,
        };

        match view {
            ListView::Page(rendered) => {
                self.edit_or_send(rendered.text, rendered.keyboard).await?;
                Ok(done)
            }
            ListView::Empty if mode != ListMode::Browse => {
                self.edit_or_send(
                    admin_empty_text(kind, removed == Some(true), self.language_code),
                    collection_menu_keyboard(kind, self.language_code),
                )
                .await?;
                Ok(done)
            }
            ListView::Empty | ListView::OutOfRange => {
                debug!(chat_id = %self.chat_id, kind = kind.plural(), "No items on requested page");
                Ok(Answer::Alert(no_more_text(kind, self.language_code)))
            }
        }
    }

    async fn open_item(&self, kind: CollectionKind, id: i64, page: u32) -> Result<Answer> {
        let item = get_item(&self.state.pool, kind, id).await?;

        match detail_for(item.as_ref(), kind, page, &self.state.media, self.language_code) {
            Detail::Missing(answer) => {
                debug!(chat_id = %self.chat_id, kind = kind.plural(), id = id, "Item not found");
                Ok(answer)
            }
            Detail::Show { text, keyboard, attachment: Some(path) } => {
                send_file(self.bot, self.chat_id, &path, text, Some(keyboard.into())).await?;
                Ok(Answer::Silent)
            }
            Detail::Show { text, keyboard, attachment: None } => {
                self.edit_or_send(text, keyboard).await?;
                Ok(Answer::Silent)
            }
        }
    }

    async fn view_greeting(&self) -> Result<Answer> {
        let Some(greeting) = get_greeting(&self.state.pool).await? else {
            send_html(
                self.bot,
                self.chat_id,
                t_lang("greeting-not-configured", self.language_code),
                None,
            )
            .await?;
            return Ok(Answer::Silent);
        };

        let text = escape(&greeting.text);
        match self.state.media.existing(greeting.photo_path.as_deref()) {
            Some(photo) => send_file(self.bot, self.chat_id, &photo, text, None).await?,
            None => send_html(self.bot, self.chat_id, text, None).await?,
        }
        Ok(Answer::Silent)
    }

    async fn start_dialog(&self, kind: ContentKind) -> Result<Answer> {
        self.state
            .dialogues
            .start_dialog(&self.messenger(), self.chat_id, kind, self.language_code)
            .await?;
        Ok(Answer::Silent)
    }

    async fn skip_file(&self) -> Result<Answer> {
        let outcome = self
            .state
            .dialogues
            .submit_step(&self.messenger(), self.chat_id, StepInput::Skip, None, self.language_code)
            .await?;
        match outcome {
            StepOutcome::NoDialog | StepOutcome::Rejected(Rejection::NothingToSkip) => Ok(
                Answer::Alert(t_lang("dialog-nothing-to-skip", self.language_code)),
            ),
            _ => Ok(Answer::Silent),
        }
    }

    async fn handle(&self, action: CallbackAction) -> Result<Answer> {
        let lang = self.language_code;
        let pool = &self.state.pool;
        let page_size = self.state.config.page_size;

        match action {
            CallbackAction::Settings => {
                self.edit_or_send(settings_text(lang), settings_keyboard(lang)).await?;
                Ok(Answer::Silent)
            }
            CallbackAction::GreetingMenu => {
                self.edit_or_send(greeting_menu_text(lang), greeting_menu_keyboard(lang)).await?;
                Ok(Answer::Silent)
            }
            CallbackAction::ViewGreeting => self.view_greeting().await,
            CallbackAction::EditGreeting => self.start_dialog(ContentKind::Greeting).await,
            CallbackAction::Menu(kind) => {
                self.edit_or_send(
                    collection_menu_text(kind, lang),
                    collection_menu_keyboard(kind, lang),
                )
                .await?;
                Ok(Answer::Silent)
            }
            CallbackAction::Add(kind) => self.start_dialog(kind.content_kind()).await,
            CallbackAction::Page { kind, mode, page } => {
                let view = render_page(pool, kind, mode, page, page_size, lang).await?;
                self.show_list(view, kind, mode, None).await
            }
            CallbackAction::Delete { kind, id, page } => {
                let (view, removed) = render_after_delete(pool, kind, id, page, page_size, lang).await?;
                self.show_list(view, kind, ListMode::Delete, Some(removed)).await
            }
            CallbackAction::Open { kind, id, page } => self.open_item(kind, id, page).await,
            CallbackAction::SkipFile => self.skip_file().await,
        }
    }
}

async fn handle_callback(
    bot: &Bot,
    q: &CallbackQuery,
    state: &BotState,
    language_code: Option<&str>,
) -> Result<Answer> {
    let data = q.data.as_deref().unwrap_or_default();
    let action = match CallbackAction::parse(data) {
        Ok(action) => action,
        Err(e) => {
            warn!(user_id = %q.from.id, error = %e, "Rejected callback data");
            return Ok(Answer::Alert(t_lang("callback-data-error", language_code)));
        }
    };

    if action.requires_admin() && !state.is_admin(Some(&q.from)) {
        warn!(user_id = %q.from.id, action = %action, "Admin action from non-admin user");
        return Ok(Answer::Alert(t_lang("not-allowed", language_code)));
    }

    let chat_id = q
        .message
        .as_ref()
        .map(|message| message.chat().id)
        .unwrap_or_else(|| ChatId::from(q.from.id));

    debug!(user_id = %q.from.id, chat_id = %chat_id, action = %action, "Handling callback");
    let context = CallbackContext {
        bot,
        query: q,
        state,
        chat_id,
        language_code,
    };
    context.handle(action).await
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, state: Arc<BotState>) -> Result<()> {
    let language_code = language_of(Some(&q.from));

    let answer = match handle_callback(&bot, &q, &state, language_code).await {
        Ok(answer) => answer,
        Err(e) => {
            error!(user_id = %q.from.id, error = %e, "Failed to handle callback query");
            Answer::Alert(t_lang("error-generic", language_code))
        }
    };

    let request = bot.answer_callback_query(q.id.clone());
    match answer {
        Answer::Silent => request.await?,
        Answer::Toast(text) => request.text(text).await?,
        Answer::Alert(text) => request.text(text).show_alert(true).await?,
    };
    Ok(())
}
