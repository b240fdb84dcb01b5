//! # Localization Tests
//!
//! Message lookup, language fallback and parity between the bundled
//! languages.

use std::collections::HashMap;
use storefront_bot::localization::{resolve_language, t_all, t_args_lang, t_lang, LocalizationManager};

const EN_SOURCE: &str = include_str!("../locales/en/main.ftl");
const RU_SOURCE: &str = include_str!("../locales/ru/main.ftl");

fn message_keys(source: &str) -> Vec<&str> {
    source
        .lines()
        .filter(|line| line.starts_with(|c: char| c.is_ascii_lowercase()))
        .filter_map(|line| line.split_once(" =").map(|(key, _)| key.trim()))
        .collect()
}

fn setup_localization() -> LocalizationManager {
    LocalizationManager::new().expect("Failed to create localization manager")
}

#[test]
fn test_every_key_exists_in_both_languages() {
    let manager = setup_localization();
    let en_keys = message_keys(EN_SOURCE);
    let ru_keys = message_keys(RU_SOURCE);
    assert!(en_keys.len() > 50, "expected a full English bundle");
    assert_eq!(en_keys.len(), ru_keys.len());

    for key in en_keys {
        assert!(manager.has_message(key, "en"), "en is missing {key}");
        assert!(manager.has_message(key, "ru"), "ru is missing {key}");
    }
}

#[test]
fn test_languages_loaded() {
    let manager = setup_localization();
    assert_eq!(manager.languages(), vec!["en", "ru"]);
}

#[test]
fn test_get_message_existing_key() {
    let manager = setup_localization();

    let message = manager.get_message_in_language("deleted", "en", None);
    assert_eq!(message, "Deleted ✅");

    let message = manager.get_message_in_language("deleted", "ru", None);
    assert_eq!(message, "Удалено ✅");
}

#[test]
fn test_get_message_nonexistent_key() {
    let manager = setup_localization();

    let message = manager.get_message_in_language("nonexistent-key", "en", None);
    assert!(message.starts_with("Missing translation:"));
}

#[test]
fn test_unsupported_language_falls_back_to_english() {
    let manager = setup_localization();

    let fallback = manager.get_message_in_language("analytics-title", "de", None);
    let english = manager.get_message_in_language("analytics-title", "en", None);
    assert_eq!(fallback, english);
}

#[test]
fn test_message_with_args() {
    let manager = setup_localization();
    let mut args = HashMap::new();
    args.insert("page", "2");
    args.insert("total", "11");

    let message = manager.get_message_in_language("list-delete-summary", "en", Some(&args));
    assert_eq!(message, "Page: <b>2</b> • Total: <b>11</b>");
}

#[test]
fn test_resolve_language() {
    assert_eq!(resolve_language(Some("ru")), "ru");
    assert_eq!(resolve_language(Some("ru-RU")), "ru");
    assert_eq!(resolve_language(Some("EN_us")), "en");
    assert_eq!(resolve_language(Some("fr")), "en");
    assert_eq!(resolve_language(None), "en");
}

#[test]
fn test_global_helpers() {
    assert_eq!(t_lang("deleted", Some("ru-RU")), "Удалено ✅");
    assert_eq!(
        t_args_lang("analytics-reviews", &[("count", "3")], Some("en")),
        "💬 Reviews: <b>3</b>"
    );

    let labels = t_all("deleted");
    assert_eq!(labels.len(), 2);
    assert!(labels.contains(&"Deleted ✅".to_string()));
}
