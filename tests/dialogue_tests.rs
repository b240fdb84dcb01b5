use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use storefront_bot::bot::{DialogueManager, Messenger, Rejection, StepInput, StepOutcome};
use storefront_bot::content::{CollectionKind, ContentKind, Field};
use storefront_bot::db::*;
use storefront_bot::dialogue::{DialogStep, OfferingStep, ReviewStep};
use storefront_bot::errors::{BotError, BotResult};
use storefront_bot::media::MediaStore;
use storefront_bot::session::SessionStore;
use tempfile::TempDir;
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId};

const CHAT: ChatId = ChatId(42);

/// Records every outbound call and serves canned downloads
#[derive(Default)]
struct RecordingMessenger {
    sent: Mutex<Vec<(String, bool)>>,
    deleted: Mutex<Vec<MessageId>>,
    files: HashMap<String, Vec<u8>>,
    fail_deletes: bool,
    next_id: Mutex<i32>,
}

impl RecordingMessenger {
    fn with_file(mut self, file_id: &str, bytes: &[u8]) -> Self {
        self.files.insert(file_id.to_string(), bytes.to_vec());
        self
    }

    fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(text, _)| text.clone()).collect()
    }

    fn last_text(&self) -> String {
        self.texts().last().cloned().unwrap_or_default()
    }

    fn last_had_markup(&self) -> bool {
        self.sent.lock().unwrap().last().map(|(_, markup)| *markup).unwrap_or(false)
    }

    fn deleted(&self) -> Vec<MessageId> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        _chat_id: ChatId,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> BotResult<MessageId> {
        self.sent.lock().unwrap().push((text.to_string(), markup.is_some()));
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        Ok(MessageId(1000 + *next))
    }

    async fn delete_message(&self, _chat_id: ChatId, message_id: MessageId) -> BotResult<()> {
        if self.fail_deletes {
            return Err(BotError::Media("message can't be deleted".to_string()));
        }
        self.deleted.lock().unwrap().push(message_id);
        Ok(())
    }

    async fn download(&self, file_id: &str) -> BotResult<Vec<u8>> {
        self.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| BotError::Media(format!("no such file: {file_id}")))
    }
}

struct Fixture {
    _dir: TempDir,
    media_root: std::path::PathBuf,
    pool: SqlitePool,
    sessions: Arc<SessionStore>,
    manager: DialogueManager,
}

async fn setup() -> Result<Fixture> {
    let dir = TempDir::new()?;
    let pool = connect_file(&dir.path().join("dialog.db")).await?;
    init_database_schema(&pool).await?;

    let media_root = dir.path().join("media");
    let sessions = Arc::new(SessionStore::new());
    let manager = DialogueManager::new(pool.clone(), Arc::clone(&sessions), MediaStore::new(&media_root));

    Ok(Fixture {
        _dir: dir,
        media_root,
        pool,
        sessions,
        manager,
    })
}

async fn submit_text(fx: &Fixture, messenger: &RecordingMessenger, text: &str, id: i32) -> Result<StepOutcome> {
    Ok(fx
        .manager
        .submit_step(messenger, CHAT, StepInput::Text(text.to_string()), Some(MessageId(id)), Some("en"))
        .await?)
}

#[tokio::test]
async fn test_review_dialog_inserts_one_record_and_cleans_up() -> Result<()> {
    let fx = setup().await?;
    let messenger = RecordingMessenger::default();

    let first = fx.manager.start_dialog(&messenger, CHAT, ContentKind::Review, Some("en")).await?;
    assert_eq!(first, DialogStep::Review(ReviewStep::Author));
    assert!(messenger.last_text().contains("full name"));

    assert_eq!(
        submit_text(&fx, &messenger, "  Anna K. ", 1).await?,
        StepOutcome::Advanced(DialogStep::Review(ReviewStep::Text))
    );
    assert_eq!(
        submit_text(&fx, &messenger, "Wonderful evening", 2).await?,
        StepOutcome::Advanced(DialogStep::Review(ReviewStep::Date))
    );
    assert_eq!(
        submit_text(&fx, &messenger, "07.08.2025", 3).await?,
        StepOutcome::Completed(ContentKind::Review)
    );

    let page = list_page(&fx.pool, CollectionKind::Reviews, 0, 5).await?;
    assert_eq!(page.len(), 1);
    match &page[0] {
        Item::Review(review) => {
            assert_eq!(review.author, "Anna K.");
            assert_eq!(review.text, "Wonderful evening");
            assert_eq!(review.date, "07.08.2025");
        }
        other => panic!("unexpected item {other:?}"),
    }

    // three prompts and three user inputs
    let deleted = messenger.deleted();
    assert_eq!(deleted.len(), 6);
    for input in [1, 2, 3] {
        assert!(deleted.contains(&MessageId(input)));
    }
    assert!(fx.sessions.get(CHAT).await.is_none());
    assert!(messenger.last_text().starts_with("✅ Review added!"));
    Ok(())
}

#[tokio::test]
async fn test_service_dialog_with_skip_has_no_file() -> Result<()> {
    let fx = setup().await?;
    let messenger = RecordingMessenger::default();

    fx.manager.start_dialog(&messenger, CHAT, ContentKind::Service, Some("en")).await?;
    submit_text(&fx, &messenger, "Massage", 1).await?;
    let outcome = submit_text(&fx, &messenger, "One hour of bliss", 2).await?;
    assert_eq!(outcome, StepOutcome::Advanced(DialogStep::Service(OfferingStep::File)));
    assert!(messenger.last_had_markup(), "file prompt offers the skip button");

    let outcome = fx
        .manager
        .submit_step(&messenger, CHAT, StepInput::Skip, None, Some("en"))
        .await?;
    assert_eq!(outcome, StepOutcome::Completed(ContentKind::Service));

    assert_eq!(count_items(&fx.pool, CollectionKind::Services).await?, 1);
    let items = list_page(&fx.pool, CollectionKind::Services, 0, 5).await?;
    assert_eq!(items[0].file_path(), None);
    assert!(messenger.last_text().contains("without a file"));
    Ok(())
}

#[tokio::test]
async fn test_gift_dialog_with_photo_stores_jpg() -> Result<()> {
    let fx = setup().await?;
    let messenger = RecordingMessenger::default().with_file("photo-1", b"\xFF\xD8jpeg");

    fx.manager.start_dialog(&messenger, CHAT, ContentKind::Gift, Some("en")).await?;
    submit_text(&fx, &messenger, "Tea set", 1).await?;
    submit_text(&fx, &messenger, "Three kinds of tea", 2).await?;
    let outcome = fx
        .manager
        .submit_step(
            &messenger,
            CHAT,
            StepInput::Photo { file_id: "photo-1".to_string() },
            Some(MessageId(3)),
            Some("en"),
        )
        .await?;
    assert_eq!(outcome, StepOutcome::Completed(ContentKind::Gift));

    let items = list_page(&fx.pool, CollectionKind::Gifts, 0, 5).await?;
    let path = items[0].file_path().context("gift should have a file")?;
    assert!(path.ends_with(".jpg"));
    assert!(Path::new(path).starts_with(fx.media_root.join("gifts")));
    assert_eq!(std::fs::read(path)?, b"\xFF\xD8jpeg");
    Ok(())
}

#[tokio::test]
async fn test_document_keeps_short_extension() -> Result<()> {
    let fx = setup().await?;
    let messenger = RecordingMessenger::default()
        .with_file("doc-1", b"%PDF")
        .with_file("doc-2", b"data");

    for (file_id, file_name, expected) in [
        ("doc-1", Some("price list.pdf"), ".pdf"),
        ("doc-2", Some("dump.extremelylong"), ".bin"),
    ] {
        fx.manager.start_dialog(&messenger, CHAT, ContentKind::Service, None).await?;
        submit_text(&fx, &messenger, "Consulting", 1).await?;
        submit_text(&fx, &messenger, "Hourly", 2).await?;
        fx.manager
            .submit_step(
                &messenger,
                CHAT,
                StepInput::Document {
                    file_id: file_id.to_string(),
                    file_name: file_name.map(str::to_string),
                },
                Some(MessageId(3)),
                None,
            )
            .await?;

        let items = list_page(&fx.pool, CollectionKind::Services, 0, 1).await?;
        let path = items[0].file_path().context("service should have a file")?;
        assert!(path.ends_with(expected), "{path} should end with {expected}");
    }
    Ok(())
}

#[tokio::test]
async fn test_greeting_dialog_replaces_greeting() -> Result<()> {
    let fx = setup().await?;
    let messenger = RecordingMessenger::default().with_file("g-1", b"img");

    fx.manager.start_dialog(&messenger, CHAT, ContentKind::Greeting, Some("en")).await?;

    // text where a photo is expected is refused
    let outcome = submit_text(&fx, &messenger, "hello", 1).await?;
    assert_eq!(outcome, StepOutcome::Rejected(Rejection::ExpectedPhoto));

    fx.manager
        .submit_step(&messenger, CHAT, StepInput::Photo { file_id: "g-1".to_string() }, Some(MessageId(2)), None)
        .await?;
    let outcome = submit_text(&fx, &messenger, "Welcome to our studio", 3).await?;
    assert_eq!(outcome, StepOutcome::Completed(ContentKind::Greeting));

    let greeting = get_greeting(&fx.pool).await?.context("greeting should exist")?;
    assert_eq!(greeting.text, "Welcome to our studio");
    let photo = greeting.photo_path.context("greeting should have a photo")?;
    assert!(photo.ends_with(".jpg"));
    assert!(Path::new(&photo).is_file());
    Ok(())
}

#[tokio::test]
async fn test_empty_text_is_reprompted_without_advancing() -> Result<()> {
    let fx = setup().await?;
    let messenger = RecordingMessenger::default();

    fx.manager.start_dialog(&messenger, CHAT, ContentKind::Review, Some("en")).await?;
    let outcome = submit_text(&fx, &messenger, "   \n ", 1).await?;
    assert_eq!(outcome, StepOutcome::Rejected(Rejection::EmptyText));
    assert!(messenger.last_text().contains("cannot be empty"));

    let session = fx.sessions.get(CHAT).await.context("session should remain")?;
    assert_eq!(session.step, Some(DialogStep::Review(ReviewStep::Author)));
    assert!(session.draft.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_skip_outside_file_step() -> Result<()> {
    let fx = setup().await?;
    let messenger = RecordingMessenger::default();

    let outcome = fx.manager.submit_step(&messenger, CHAT, StepInput::Skip, None, None).await?;
    assert_eq!(outcome, StepOutcome::NoDialog);

    fx.manager.start_dialog(&messenger, CHAT, ContentKind::Gift, None).await?;
    let sent_before = messenger.texts().len();
    let outcome = fx.manager.submit_step(&messenger, CHAT, StepInput::Skip, None, None).await?;
    assert_eq!(outcome, StepOutcome::Rejected(Rejection::NothingToSkip));
    assert_eq!(messenger.texts().len(), sent_before);
    Ok(())
}

#[tokio::test]
async fn test_new_dialog_discards_unfinished_one() -> Result<()> {
    let fx = setup().await?;
    let messenger = RecordingMessenger::default();

    fx.manager.start_dialog(&messenger, CHAT, ContentKind::Service, None).await?;
    submit_text(&fx, &messenger, "Abandoned service", 1).await?;

    fx.manager.start_dialog(&messenger, CHAT, ContentKind::Review, None).await?;
    let session = fx.sessions.get(CHAT).await.context("session should exist")?;
    assert_eq!(session.step, Some(DialogStep::Review(ReviewStep::Author)));
    assert_eq!(session.draft.get(Field::Name), None);

    assert_eq!(count_items(&fx.pool, CollectionKind::Services).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_download_failure_keeps_session() -> Result<()> {
    let fx = setup().await?;
    let messenger = RecordingMessenger::default();

    fx.manager.start_dialog(&messenger, CHAT, ContentKind::Gift, Some("en")).await?;
    submit_text(&fx, &messenger, "Candle", 1).await?;
    submit_text(&fx, &messenger, "Vanilla", 2).await?;
    let before = fx.sessions.get(CHAT).await.context("session should exist")?;

    let outcome = fx
        .manager
        .submit_step(
            &messenger,
            CHAT,
            StepInput::Photo { file_id: "missing".to_string() },
            Some(MessageId(3)),
            Some("en"),
        )
        .await?;
    assert_eq!(outcome, StepOutcome::MediaFailed);
    assert!(messenger.last_text().contains("Could not save the file"));

    let after = fx.sessions.get(CHAT).await.context("session should remain")?;
    assert_eq!(after.step, before.step);
    assert_eq!(after.draft, before.draft);
    assert_eq!(count_items(&fx.pool, CollectionKind::Gifts).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_cleanup_failures_are_swallowed() -> Result<()> {
    let fx = setup().await?;
    let messenger = RecordingMessenger {
        fail_deletes: true,
        ..Default::default()
    };

    fx.manager.start_dialog(&messenger, CHAT, ContentKind::Review, None).await?;
    submit_text(&fx, &messenger, "Ivan", 1).await?;
    submit_text(&fx, &messenger, "Great", 2).await?;
    let outcome = submit_text(&fx, &messenger, "01.02.2025", 3).await?;

    assert_eq!(outcome, StepOutcome::Completed(ContentKind::Review));
    assert_eq!(count_items(&fx.pool, CollectionKind::Reviews).await?, 1);
    assert!(fx.sessions.get(CHAT).await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_wrong_input_type_at_text_step() -> Result<()> {
    let fx = setup().await?;
    let messenger = RecordingMessenger::default().with_file("p", b"x");

    fx.manager.start_dialog(&messenger, CHAT, ContentKind::Service, Some("en")).await?;
    let outcome = fx
        .manager
        .submit_step(&messenger, CHAT, StepInput::Photo { file_id: "p".to_string() }, Some(MessageId(1)), Some("en"))
        .await?;
    assert_eq!(outcome, StepOutcome::Rejected(Rejection::ExpectedText));

    let session = fx.sessions.get(CHAT).await.context("session should remain")?;
    assert_eq!(session.step, Some(DialogStep::Service(OfferingStep::Name)));
    Ok(())
}

#[tokio::test]
async fn test_failed_attachment_messages_are_purged_on_completion() -> Result<()> {
    let fx = setup().await?;
    let messenger = RecordingMessenger::default();

    fx.manager.start_dialog(&messenger, CHAT, ContentKind::Gift, Some("en")).await?;
    submit_text(&fx, &messenger, "Candle", 1).await?;
    submit_text(&fx, &messenger, "Vanilla", 2).await?;

    let outcome = fx
        .manager
        .submit_step(
            &messenger,
            CHAT,
            StepInput::Photo { file_id: "missing".to_string() },
            Some(MessageId(3)),
            Some("en"),
        )
        .await?;
    assert_eq!(outcome, StepOutcome::MediaFailed);
    let notice = MessageId(1000 + messenger.texts().len() as i32);

    let outcome = fx
        .manager
        .submit_step(&messenger, CHAT, StepInput::Skip, None, Some("en"))
        .await?;
    assert_eq!(outcome, StepOutcome::Completed(ContentKind::Gift));

    let deleted = messenger.deleted();
    assert!(deleted.contains(&MessageId(3)), "failed upload should be cleaned up");
    assert!(deleted.contains(&notice), "failure notice should be cleaned up");
    assert_eq!(count_items(&fx.pool, CollectionKind::Gifts).await?, 1);
    Ok(())
}
