//! # Storefront Telegram Bot
//!
//! A Telegram bot where administrators curate a greeting, reviews, services
//! and gifts through short dialogs, and customers browse them page by page.

pub mod bot;
pub mod callback_data;
pub mod config;
pub mod content;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod localization;
pub mod media;
pub mod pagination;
pub mod session;
