//! Process configuration loaded once at start from the environment.

use chrono::Duration;
use reqwest::Url;
use std::path::PathBuf;
use teloxide::types::UserId;
use tracing::warn;

use crate::errors::{BotError, BotResult};
use crate::pagination::DEFAULT_PAGE_SIZE;

pub const DEFAULT_CONTACT_URL: &str = "https://t.me/your_contact_here";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://bot.db";
pub const DEFAULT_MEDIA_ROOT: &str = "media";
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub admin_ids: Vec<u64>,
    pub contact_url: Url,
    /// Label of the contact button; the localized default is used when unset
    pub contact_button_text: Option<String>,
    pub database_url: String,
    pub media_root: PathBuf,
    pub page_size: u32,
    /// `None` keeps sessions until they are overwritten
    pub session_ttl: Option<Duration>,
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> BotResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELEGRAM_BOT_TOKEN"))
            .ok_or_else(|| BotError::Config("BOT_TOKEN must be set".to_string()))?;

        let admin_ids = match get("ADMIN_IDS") {
            Some(list) => parse_admin_ids(&list)?,
            None => match get("ADMIN_ID") {
                Some(single) => parse_admin_ids(&single)?,
                None => Vec::new(),
            },
        };
        if admin_ids.is_empty() {
            warn!("No administrators configured; admin features are unreachable");
        }

        let contact_url = get("CONTACT_URL").unwrap_or_else(|| DEFAULT_CONTACT_URL.to_string());
        let contact_url = Url::parse(&contact_url)
            .map_err(|e| BotError::Config(format!("CONTACT_URL `{contact_url}` is invalid: {e}")))?;

        let page_size = match get("PAGE_SIZE") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(size) if size >= 1 => size,
                _ => {
                    return Err(BotError::Config(format!(
                        "PAGE_SIZE must be a positive integer, got `{raw}`"
                    )))
                }
            },
            None => DEFAULT_PAGE_SIZE,
        };

        let ttl_minutes = match get("SESSION_TTL_MINUTES") {
            Some(raw) => raw.parse::<i64>().ok().filter(|m| *m >= 0).ok_or_else(|| {
                BotError::Config(format!(
                    "SESSION_TTL_MINUTES must be a non-negative integer, got `{raw}`"
                ))
            })?,
            None => DEFAULT_SESSION_TTL_MINUTES,
        };
        let session_ttl = match ttl_minutes {
            0 => None,
            minutes => Some(Duration::try_minutes(minutes).ok_or_else(|| {
                BotError::Config(format!("SESSION_TTL_MINUTES `{minutes}` is out of range"))
            })?),
        };

        Ok(Self {
            bot_token,
            admin_ids,
            contact_url,
            contact_button_text: get("CONTACT_BUTTON_TEXT"),
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            media_root: PathBuf::from(
                get("MEDIA_ROOT").unwrap_or_else(|| DEFAULT_MEDIA_ROOT.to_string()),
            ),
            page_size,
            session_ttl,
        })
    }

    /// Allowlist membership, the single authorization check
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admin_ids.contains(&user_id.0)
    }
}

fn parse_admin_ids(raw: &str) -> BotResult<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| BotError::Config(format!("admin id `{part}` is not numeric")))
        })
        .collect()
}
