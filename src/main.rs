use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use storefront_bot::bot::{callback_handler, message_handler, BotState};
use storefront_bot::config::Config;
use storefront_bot::db;
use storefront_bot::localization::init_localization;

/// How often idle dialog sessions are swept
const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(5 * 60);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();
    info!("Starting Storefront Telegram Bot");

    let config = Config::from_env()?;
    info!(
        admins = config.admin_ids.len(),
        media_root = %config.media_root.display(),
        page_size = config.page_size,
        "Configuration loaded"
    );

    init_localization()?;

    info!(database_url = %config.database_url, "Initializing database");
    let pool = db::connect(&config.database_url).await?;
    db::init_database_schema(&pool).await?;

    let bot = Bot::new(config.bot_token.clone());
    let state = Arc::new(BotState::new(config, pool));

    if state.config.session_ttl.is_some() {
        let sessions = Arc::clone(&state.sessions);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                let dropped = sessions.prune_expired().await;
                if dropped > 0 {
                    debug!(dropped = dropped, "Pruned expired dialog sessions");
                }
            }
        });
    }

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
