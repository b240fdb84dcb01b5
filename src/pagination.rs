//! # Pagination Module
//!
//! Fixed-size, offset-based pages over a collection, shared by the admin
//! view list, the admin delete list and the customer browse list.

use sqlx::SqlitePool;
use teloxide::types::InlineKeyboardMarkup;
use tracing::debug;

use crate::bot::ui_builder::render_list_page;
use crate::content::{CollectionKind, ListMode};
use crate::db::{count_items, delete_item, list_page, Item};
use crate::errors::BotResult;

pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Number of pages needed for `total` items
pub fn page_count(total: i64, page_size: u32) -> i64 {
    let page_size = i64::from(page_size.max(1));
    (total.max(0) + page_size - 1) / page_size
}

/// Clamp `page` to the last page holding items (page 0 when empty)
pub fn clamp_page(page: u32, total: i64, page_size: u32) -> u32 {
    let last = (page_count(total, page_size) - 1).max(0);
    u32::try_from(last).map_or(page, |last| page.min(last))
}

/// Targets of the previous/next controls
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub previous: Option<u32>,
    pub next: Option<u32>,
}

pub fn navigation(page: u32, page_size: u32, total: i64) -> Navigation {
    let previous = page.checked_sub(1);
    let shown = (i64::from(page) + 1) * i64::from(page_size);
    let next = if shown < total { Some(page + 1) } else { None };
    Navigation { previous, next }
}

/// One loaded page of a collection
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub kind: CollectionKind,
    pub mode: ListMode,
    pub number: u32,
    pub page_size: u32,
    pub total: i64,
    pub items: Vec<Item>,
}

impl Page {
    pub fn navigation(&self) -> Navigation {
        navigation(self.number, self.page_size, self.total)
    }
}

/// Result of asking for a page
#[derive(Clone, Debug, PartialEq)]
pub enum PageLookup {
    Page(Page),
    /// The collection holds no items at all
    Empty,
    /// Items exist but none on the requested page
    OutOfRange,
}

/// Text and controls for one rendered page
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedPage {
    pub page: Page,
    pub text: String,
    pub keyboard: InlineKeyboardMarkup,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ListView {
    Page(RenderedPage),
    Empty,
    OutOfRange,
}

impl ListView {
    fn from_lookup(lookup: PageLookup, language_code: Option<&str>) -> Self {
        match lookup {
            PageLookup::Page(page) => {
                let (text, keyboard) = render_list_page(&page, language_code);
                ListView::Page(RenderedPage { page, text, keyboard })
            }
            PageLookup::Empty => ListView::Empty,
            PageLookup::OutOfRange => ListView::OutOfRange,
        }
    }
}

pub async fn load_page(
    pool: &SqlitePool,
    kind: CollectionKind,
    mode: ListMode,
    page: u32,
    page_size: u32,
) -> BotResult<PageLookup> {
    let total = count_items(pool, kind).await?;
    if total == 0 {
        return Ok(PageLookup::Empty);
    }

    let limit = i64::from(page_size);
    let items = list_page(pool, kind, i64::from(page) * limit, limit).await?;
    if items.is_empty() {
        debug!(kind = kind.plural(), page = page, total = total, "Requested page is past the end");
        return Ok(PageLookup::OutOfRange);
    }

    Ok(PageLookup::Page(Page {
        kind,
        mode,
        number: page,
        page_size,
        total,
        items,
    }))
}

/// Render one page of a collection in the given mode
pub async fn render_page(
    pool: &SqlitePool,
    kind: CollectionKind,
    mode: ListMode,
    page: u32,
    page_size: u32,
    language_code: Option<&str>,
) -> BotResult<ListView> {
    let lookup = load_page(pool, kind, mode, page, page_size).await?;
    Ok(ListView::from_lookup(lookup, language_code))
}

/// Delete an item from the delete list and reload the page it was on,
/// clamped to the new last page. The flag tells whether a row was
/// actually removed; a stale button finds nothing to delete.
pub async fn after_delete(
    pool: &SqlitePool,
    kind: CollectionKind,
    deleted_id: i64,
    page: u32,
    page_size: u32,
) -> BotResult<(PageLookup, bool)> {
    let removed = delete_item(pool, kind, deleted_id).await?;

    let total = count_items(pool, kind).await?;
    if total == 0 {
        return Ok((PageLookup::Empty, removed));
    }

    let page = clamp_page(page, total, page_size);
    let lookup = load_page(pool, kind, ListMode::Delete, page, page_size).await?;
    Ok((lookup, removed))
}

/// `after_delete` followed by rendering
pub async fn render_after_delete(
    pool: &SqlitePool,
    kind: CollectionKind,
    deleted_id: i64,
    page: u32,
    page_size: u32,
    language_code: Option<&str>,
) -> BotResult<(ListView, bool)> {
    let (lookup, removed) = after_delete(pool, kind, deleted_id, page, page_size).await?;
    Ok((ListView::from_lookup(lookup, language_code), removed))
}
