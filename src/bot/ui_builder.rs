//! UI Builder module for creating keyboards and formatting messages

use reqwest::Url;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};
use teloxide::utils::html::escape;

use crate::callback_data::CallbackAction;
use crate::content::{CollectionKind, ListMode};
use crate::db::{Item, Offering, Review};
use crate::dialogue::{DialogStep, Expectation};
use crate::localization::{get_localization_manager, resolve_language, t_all, t_args_lang, t_lang};
use crate::pagination::Page;

/// Longest inline button label
pub const MAX_LABEL_CHARS: usize = 64;
/// Longest description excerpt in the admin view list
pub const MAX_EXCERPT_CHARS: usize = 300;

/// Cut `text` to at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Reply-keyboard entries, matched by label in any supported language
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuCommand {
    Analytics,
    Settings,
    Reviews,
    Gift,
    Services,
    Contacts,
}

impl MenuCommand {
    const ALL: [MenuCommand; 6] = [
        MenuCommand::Analytics,
        MenuCommand::Settings,
        MenuCommand::Reviews,
        MenuCommand::Gift,
        MenuCommand::Services,
        MenuCommand::Contacts,
    ];

    fn label_key(self) -> &'static str {
        match self {
            MenuCommand::Analytics => "keyboard-analytics",
            MenuCommand::Settings => "keyboard-settings",
            MenuCommand::Reviews => "keyboard-reviews",
            MenuCommand::Gift => "keyboard-gift",
            MenuCommand::Services => "keyboard-services",
            MenuCommand::Contacts => "keyboard-contacts",
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .into_iter()
            .find(|command| t_all(command.label_key()).iter().any(|label| label == text))
    }

    pub fn is_admin_command(self) -> bool {
        matches!(self, MenuCommand::Analytics | MenuCommand::Settings)
    }

    /// Collection opened by a customer section button
    pub fn collection(self) -> Option<CollectionKind> {
        match self {
            MenuCommand::Reviews => Some(CollectionKind::Reviews),
            MenuCommand::Gift => Some(CollectionKind::Gifts),
            MenuCommand::Services => Some(CollectionKind::Services),
            _ => None,
        }
    }
}

fn reply_keyboard(rows: &[&[MenuCommand]], language_code: Option<&str>) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|command| KeyboardButton::new(t_lang(command.label_key(), language_code)))
                .collect()
        })
        .collect();
    KeyboardMarkup::new(rows).resize_keyboard()
}

pub fn admin_reply_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    reply_keyboard(&[&[MenuCommand::Analytics, MenuCommand::Settings]], language_code)
}

pub fn customer_reply_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    reply_keyboard(
        &[
            &[MenuCommand::Reviews, MenuCommand::Gift],
            &[MenuCommand::Services, MenuCommand::Contacts],
        ],
        language_code,
    )
}

fn lines(keys: &[&str], language_code: Option<&str>) -> String {
    keys.iter()
        .map(|key| t_lang(key, language_code))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn admin_welcome_text(language_code: Option<&str>) -> String {
    [
        t_lang("admin-welcome-title", language_code),
        t_lang("admin-welcome-intro", language_code),
        lines(&["admin-welcome-analytics", "admin-welcome-settings"], language_code),
        t_lang("admin-welcome-final", language_code),
    ]
    .join("\n\n")
}

/// Shown to customers when no greeting has been configured
pub fn customer_welcome_text(language_code: Option<&str>) -> String {
    [
        t_lang("customer-welcome-title", language_code),
        t_lang("customer-welcome-intro", language_code),
        lines(
            &[
                "customer-welcome-reviews",
                "customer-welcome-gifts",
                "customer-welcome-services",
                "customer-welcome-contacts",
            ],
            language_code,
        ),
        t_lang("customer-welcome-final", language_code),
    ]
    .join("\n\n")
}

pub fn analytics_text(reviews: i64, services: i64, gifts: i64, language_code: Option<&str>) -> String {
    let count = |key: &str, value: i64| t_args_lang(key, &[("count", value.to_string().as_str())], language_code);
    [
        t_lang("analytics-title", language_code),
        [
            count("analytics-reviews", reviews),
            count("analytics-services", services),
            count("analytics-gifts", gifts),
        ]
        .join("\n"),
        t_lang("analytics-final", language_code),
    ]
    .join("\n\n")
}

pub fn settings_text(language_code: Option<&str>) -> String {
    [
        t_lang("settings-title", language_code),
        t_lang("settings-intro", language_code),
        lines(
            &["settings-greeting", "settings-reviews", "settings-services", "settings-gifts"],
            language_code,
        ),
        t_lang("settings-choose", language_code),
    ]
    .join("\n\n")
}

fn button(label: String, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.to_string())
}

pub fn settings_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button(t_lang("settings-button-greeting", language_code), CallbackAction::GreetingMenu)],
        vec![button(
            t_lang("settings-button-reviews", language_code),
            CallbackAction::Menu(CollectionKind::Reviews),
        )],
        vec![button(
            t_lang("settings-button-services", language_code),
            CallbackAction::Menu(CollectionKind::Services),
        )],
        vec![button(
            t_lang("settings-button-gifts", language_code),
            CallbackAction::Menu(CollectionKind::Gifts),
        )],
    ])
}

pub fn greeting_menu_text(language_code: Option<&str>) -> String {
    [
        t_lang("greeting-menu-title", language_code),
        t_lang("greeting-menu-description", language_code),
    ]
    .join("\n\n")
}

pub fn greeting_menu_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button(t_lang("greeting-button-view", language_code), CallbackAction::ViewGreeting)],
        vec![button(t_lang("greeting-button-edit", language_code), CallbackAction::EditGreeting)],
        vec![button(t_lang("button-back-settings", language_code), CallbackAction::Settings)],
    ])
}

pub fn collection_menu_text(kind: CollectionKind, language_code: Option<&str>) -> String {
    [
        t_lang(&format!("menu-title-{}", kind.plural()), language_code),
        t_lang(&format!("menu-description-{}", kind.plural()), language_code),
    ]
    .join("\n\n")
}

pub fn collection_menu_keyboard(kind: CollectionKind, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button(
            t_lang("button-view", language_code),
            CallbackAction::Page { kind, mode: ListMode::View, page: 0 },
        )],
        vec![button(t_lang("button-add", language_code), CallbackAction::Add(kind))],
        vec![button(
            t_lang("button-delete", language_code),
            CallbackAction::Page { kind, mode: ListMode::Delete, page: 0 },
        )],
        vec![button(t_lang("button-back-settings", language_code), CallbackAction::Settings)],
    ])
}

/// Prompt for a dialog step, followed by its hint when one exists
pub fn prompt_text(step: DialogStep, language_code: Option<&str>) -> String {
    let key = step.prompt_key();
    let hint_key = format!("{key}-hint");
    let prompt = t_lang(&key, language_code);

    if get_localization_manager().has_message(&hint_key, resolve_language(language_code)) {
        format!("{prompt}\n\n{}", t_lang(&hint_key, language_code))
    } else {
        prompt
    }
}

/// Controls shown under a dialog prompt
pub fn prompt_keyboard(step: DialogStep, language_code: Option<&str>) -> Option<InlineKeyboardMarkup> {
    (step.expectation() == Expectation::Attachment).then(|| skip_file_keyboard(language_code))
}

pub fn skip_file_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        t_lang("button-skip-file", language_code),
        CallbackAction::SkipFile,
    )]])
}

fn review_label(review: &Review) -> String {
    format!("{} • {}", review.author, review.date)
}

fn item_button(item: &Item, mode: ListMode, page: u32) -> InlineKeyboardButton {
    let kind = item.kind();
    let (icon, label, action) = match (mode, item) {
        (ListMode::Delete, Item::Review(review)) => ("🗑", review_label(review), CallbackAction::Delete { kind, id: item.id(), page }),
        (ListMode::Delete, Item::Service(offering) | Item::Gift(offering)) => {
            ("🗑", offering.name.clone(), CallbackAction::Delete { kind, id: item.id(), page })
        }
        (_, Item::Review(review)) => ("💬", review_label(review), CallbackAction::Open { kind, id: item.id(), page }),
        (_, Item::Service(offering)) => ("🛠", offering.name.clone(), CallbackAction::Open { kind, id: item.id(), page }),
        (_, Item::Gift(offering)) => ("🎁", offering.name.clone(), CallbackAction::Open { kind, id: item.id(), page }),
    };
    InlineKeyboardButton::callback(
        truncate_chars(&format!("{icon} {label}"), MAX_LABEL_CHARS),
        action.to_string(),
    )
}

fn navigation_row(page: &Page, language_code: Option<&str>) -> Vec<InlineKeyboardButton> {
    let nav = page.navigation();
    let target = |number| CallbackAction::Page { kind: page.kind, mode: page.mode, page: number };

    let mut row = Vec::new();
    if let Some(previous) = nav.previous {
        row.push(button(t_lang("nav-previous", language_code), target(previous)));
    }
    if let Some(next) = nav.next {
        row.push(button(t_lang("nav-next", language_code), target(next)));
    }
    row
}

fn back_to_menu_row(kind: CollectionKind, language_code: Option<&str>) -> Vec<InlineKeyboardButton> {
    vec![button(
        t_lang(&format!("button-back-menu-{}", kind.plural()), language_code),
        CallbackAction::Menu(kind),
    )]
}

fn view_block(item: &Item, language_code: Option<&str>) -> String {
    match item {
        Item::Review(review) => format!(
            "• <b>{}</b> • {}\n{}",
            escape(&review.author),
            escape(&review.date),
            escape(&truncate_chars(&review.text, MAX_EXCERPT_CHARS))
        ),
        Item::Service(offering) | Item::Gift(offering) => {
            let mut block = format!(
                "• <b>{}</b>\n{}",
                escape(&offering.name),
                escape(&truncate_chars(&offering.description, MAX_EXCERPT_CHARS))
            );
            if offering.file_path.is_some() {
                block.push('\n');
                block.push_str(&t_lang("list-attachment", language_code));
            }
            block
        }
    }
}

/// Text and inline controls for one page of a list
pub fn render_list_page(page: &Page, language_code: Option<&str>) -> (String, InlineKeyboardMarkup) {
    let plural = page.kind.plural();
    let number = (page.number + 1).to_string();
    let mut rows = Vec::new();

    let text = match page.mode {
        ListMode::View => {
            let title = t_args_lang(&format!("list-view-title-{plural}"), &[("page", number.as_str())], language_code);
            let blocks: Vec<String> = page.items.iter().map(|item| view_block(item, language_code)).collect();
            format!("{title}\n\n{}", blocks.join("\n\n"))
        }
        ListMode::Delete => {
            rows.extend(page.items.iter().map(|item| vec![item_button(item, page.mode, page.number)]));
            [
                t_lang(&format!("list-delete-title-{plural}"), language_code),
                t_args_lang(
                    "list-delete-summary",
                    &[("page", number.as_str()), ("total", page.total.to_string().as_str())],
                    language_code,
                ),
                t_lang(&format!("list-delete-choose-{plural}"), language_code),
            ]
            .join("\n\n")
        }
        ListMode::Browse => {
            rows.extend(page.items.iter().map(|item| vec![item_button(item, page.mode, page.number)]));
            [
                t_args_lang(&format!("browse-title-{plural}"), &[("page", number.as_str())], language_code),
                t_lang(&format!("browse-choose-{plural}"), language_code),
            ]
            .join("\n\n")
        }
    };

    let nav = navigation_row(page, language_code);
    if !nav.is_empty() {
        rows.push(nav);
    }
    if page.mode != ListMode::Browse {
        rows.push(back_to_menu_row(page.kind, language_code));
    }

    (text, InlineKeyboardMarkup::new(rows))
}

/// Empty state of an admin list; `after_delete` when the last item was just removed
pub fn admin_empty_text(kind: CollectionKind, after_delete: bool, language_code: Option<&str>) -> String {
    let prefix = if after_delete { "deleted-all" } else { "empty-admin" };
    t_lang(&format!("{prefix}-{}", kind.plural()), language_code)
}

pub fn customer_empty_text(kind: CollectionKind, language_code: Option<&str>) -> String {
    t_lang(&format!("empty-customer-{}", kind.plural()), language_code)
}

/// Caption shown when a customer opens a section from the reply keyboard
pub fn browse_intro_text(kind: CollectionKind, language_code: Option<&str>) -> String {
    [
        t_lang(&format!("browse-intro-title-{}", kind.plural()), language_code),
        t_lang(&format!("browse-intro-{}", kind.plural()), language_code),
    ]
    .join("\n\n")
}

pub fn no_more_text(kind: CollectionKind, language_code: Option<&str>) -> String {
    t_lang(&format!("no-more-{}", kind.plural()), language_code)
}

pub fn not_found_text(kind: CollectionKind, language_code: Option<&str>) -> String {
    t_lang(&format!("not-found-{}", kind.plural()), language_code)
}

fn offering_detail(icon: &str, offering: &Offering) -> String {
    format!("{icon} <b>{}</b>\n\n{}", escape(&offering.name), escape(&offering.description))
}

/// Full text of one item for the detail view
pub fn detail_text(item: &Item) -> String {
    match item {
        Item::Review(review) => format!(
            "🧑 <b>{}</b>\n🗓 {}\n\n{}",
            escape(&review.author),
            escape(&review.date),
            escape(review.text.trim())
        ),
        Item::Service(offering) => offering_detail("🛠", offering),
        Item::Gift(offering) => offering_detail("🎁", offering),
    }
}

pub fn detail_keyboard(kind: CollectionKind, page: u32, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        t_lang("button-back-to-list", language_code),
        CallbackAction::Page { kind, mode: ListMode::Browse, page },
    )]])
}

pub fn contacts_text(language_code: Option<&str>) -> String {
    [
        t_lang("contacts-title", language_code),
        t_lang("contacts-description", language_code),
    ]
    .join("\n\n")
}

pub fn contacts_keyboard(url: &Url, label: Option<&str>, language_code: Option<&str>) -> InlineKeyboardMarkup {
    let label = label
        .map(str::to_string)
        .unwrap_or_else(|| t_lang("contacts-button", language_code));
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
        format!("➡️ {label}"),
        url.clone(),
    )]])
}
