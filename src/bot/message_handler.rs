//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode, ReplyMarkup};
use teloxide::utils::html::escape;
use tracing::{debug, error, info};

use crate::content::{CollectionKind, ListMode};
use crate::db::{count_items, get_greeting};
use crate::localization::t_lang;
use crate::media::{is_image, Section};
use crate::pagination::{load_page, PageLookup};

use super::dialogue_manager::{StepInput, StepOutcome};
use super::messenger::TelegramMessenger;
use super::ui_builder::{
    admin_reply_keyboard, admin_welcome_text, analytics_text, browse_intro_text, contacts_keyboard,
    contacts_text, customer_empty_text, customer_reply_keyboard, customer_welcome_text,
    render_list_page, settings_keyboard, settings_text, MenuCommand,
};
use super::{language_of, BotState};

/// Send an HTML text message
pub(crate) async fn send_html(
    bot: &Bot,
    chat_id: ChatId,
    text: String,
    markup: Option<ReplyMarkup>,
) -> Result<()> {
    let mut request = bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
    if let Some(markup) = markup {
        request = request.reply_markup(markup);
    }
    request.await?;
    Ok(())
}

/// Send a stored file with an HTML caption: images as photos, anything
/// else as a document
pub(crate) async fn send_file(
    bot: &Bot,
    chat_id: ChatId,
    path: &Path,
    caption: String,
    markup: Option<ReplyMarkup>,
) -> Result<()> {
    let file = InputFile::file(path.to_path_buf());
    if is_image(path) {
        let mut request = bot
            .send_photo(chat_id, file)
            .caption(caption)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        request.await?;
    } else {
        let mut request = bot
            .send_document(chat_id, file)
            .caption(caption)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        request.await?;
    }
    Ok(())
}

fn is_start_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .and_then(|command| command.split('@').next())
        == Some("/start")
}

/// Dialog input carried by a message, if it carries any
fn step_input(msg: &Message) -> Option<StepInput> {
    if let Some(text) = msg.text() {
        return Some(StepInput::Text(text.to_string()));
    }
    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        return Some(StepInput::Photo {
            file_id: photo.file.id.0.clone(),
        });
    }
    msg.document().map(|doc| StepInput::Document {
        file_id: doc.file.id.0.clone(),
        file_name: doc.file_name.clone(),
    })
}

async fn send_admin_home(bot: &Bot, chat_id: ChatId, language_code: Option<&str>) -> Result<()> {
    send_html(
        bot,
        chat_id,
        admin_welcome_text(language_code),
        Some(admin_reply_keyboard(language_code).into()),
    )
    .await
}

async fn send_customer_home(
    bot: &Bot,
    state: &BotState,
    chat_id: ChatId,
    language_code: Option<&str>,
) -> Result<()> {
    let keyboard: ReplyMarkup = customer_reply_keyboard(language_code).into();

    let Some(greeting) = get_greeting(&state.pool).await? else {
        return send_html(bot, chat_id, customer_welcome_text(language_code), Some(keyboard)).await;
    };

    let text = escape(&greeting.text);
    match state.media.existing(greeting.photo_path.as_deref()) {
        Some(photo) => send_file(bot, chat_id, &photo, text, Some(keyboard)).await,
        None => {
            debug!(chat_id = %chat_id, "Greeting photo missing, sending text only");
            send_html(bot, chat_id, text, Some(keyboard)).await
        }
    }
}

async fn send_analytics(
    bot: &Bot,
    state: &BotState,
    chat_id: ChatId,
    language_code: Option<&str>,
) -> Result<()> {
    let reviews = count_items(&state.pool, CollectionKind::Reviews).await?;
    let services = count_items(&state.pool, CollectionKind::Services).await?;
    let gifts = count_items(&state.pool, CollectionKind::Gifts).await?;

    send_html(
        bot,
        chat_id,
        analytics_text(reviews, services, gifts, language_code),
        None,
    )
    .await
}

/// First page of a customer section, under its banner when one exists
async fn open_section(
    bot: &Bot,
    state: &BotState,
    chat_id: ChatId,
    kind: CollectionKind,
    language_code: Option<&str>,
) -> Result<()> {
    let keyboard = match load_page(&state.pool, kind, ListMode::Browse, 0, state.config.page_size).await? {
        PageLookup::Page(page) => Some(render_list_page(&page, language_code).1),
        PageLookup::Empty | PageLookup::OutOfRange => None,
    };
    let caption = browse_intro_text(kind, language_code);

    match (state.media.section_banner(Section::from(kind)), keyboard) {
        (Some(banner), keyboard) => {
            send_file(bot, chat_id, &banner, caption, keyboard.map(Into::into)).await
        }
        (None, Some(keyboard)) => send_html(bot, chat_id, caption, Some(keyboard.into())).await,
        (None, None) => send_html(bot, chat_id, customer_empty_text(kind, language_code), None).await,
    }
}

async fn send_contacts(
    bot: &Bot,
    state: &BotState,
    chat_id: ChatId,
    language_code: Option<&str>,
) -> Result<()> {
    let keyboard = contacts_keyboard(
        &state.config.contact_url,
        state.config.contact_button_text.as_deref(),
        language_code,
    );
    let text = contacts_text(language_code);

    match state.media.section_banner(Section::Contacts) {
        Some(banner) => send_file(bot, chat_id, &banner, text, Some(keyboard.into())).await,
        None => send_html(bot, chat_id, text, Some(keyboard.into())).await,
    }
}

async fn handle_message(
    bot: &Bot,
    msg: &Message,
    state: &BotState,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let is_admin = state.is_admin(msg.from.as_ref());

    if let Some(text) = msg.text() {
        if is_start_command(text) {
            state.sessions.clear(chat_id).await;
            info!(chat_id = %chat_id, is_admin = is_admin, "Start command received");
            return if is_admin {
                send_admin_home(bot, chat_id, language_code).await
            } else {
                send_customer_home(bot, state, chat_id, language_code).await
            };
        }

        let admin_command = MenuCommand::from_label(text).filter(|command| command.is_admin_command());
        match admin_command {
            Some(MenuCommand::Analytics) if is_admin => {
                return send_analytics(bot, state, chat_id, language_code).await;
            }
            Some(_) if is_admin => {
                return send_html(
                    bot,
                    chat_id,
                    settings_text(language_code),
                    Some(settings_keyboard(language_code).into()),
                )
                .await;
            }
            _ => {}
        }
    }

    if is_admin {
        if let Some(input) = step_input(msg) {
            let messenger = TelegramMessenger::new(bot.clone());
            let outcome = state
                .dialogues
                .submit_step(&messenger, chat_id, input, Some(msg.id), language_code)
                .await?;
            if outcome != StepOutcome::NoDialog {
                debug!(chat_id = %chat_id, outcome = ?outcome, "Dialog step handled");
                return Ok(());
            }
        }
    }

    if let Some(command) = msg.text().and_then(MenuCommand::from_label) {
        if let Some(kind) = command.collection() {
            return open_section(bot, state, chat_id, kind, language_code).await;
        }
        if command == MenuCommand::Contacts {
            return send_contacts(bot, state, chat_id, language_code).await;
        }
    }

    debug!(chat_id = %chat_id, "Unrecognized message, sending menu hint");
    if is_admin {
        send_html(
            bot,
            chat_id,
            t_lang("fallback-admin", language_code),
            Some(admin_reply_keyboard(language_code).into()),
        )
        .await
    } else {
        send_html(
            bot,
            chat_id,
            t_lang("fallback-customer", language_code),
            Some(customer_reply_keyboard(language_code).into()),
        )
        .await
    }
}

pub async fn message_handler(bot: Bot, msg: Message, state: Arc<BotState>) -> Result<()> {
    let language_code = language_of(msg.from.as_ref());

    if let Err(e) = handle_message(&bot, &msg, &state, language_code).await {
        error!(chat_id = %msg.chat.id, error = %e, "Failed to handle message");
        bot.send_message(msg.chat.id, t_lang("error-generic", language_code))
            .await?;
    }
    Ok(())
}
