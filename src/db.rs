use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::content::CollectionKind;
use crate::errors::BotResult;

/// The greeting shown to customers on `/start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Greeting {
    pub photo_path: Option<String>,
    pub text: String,
}

/// A customer review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub date: String,
    pub created_at: NaiveDateTime,
}

/// A service or gift; both collections share this shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Offering {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub file_path: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A row of any collection
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Review(Review),
    Service(Offering),
    Gift(Offering),
}

impl Item {
    pub fn id(&self) -> i64 {
        match self {
            Item::Review(review) => review.id,
            Item::Service(offering) | Item::Gift(offering) => offering.id,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        match self {
            Item::Review(_) => CollectionKind::Reviews,
            Item::Service(_) => CollectionKind::Services,
            Item::Gift(_) => CollectionKind::Gifts,
        }
    }

    pub fn file_path(&self) -> Option<&str> {
        match self {
            Item::Review(_) => None,
            Item::Service(offering) | Item::Gift(offering) => offering.file_path.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub author: String,
    pub text: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOffering {
    pub name: String,
    pub description: String,
    pub file_path: Option<String>,
}

/// Fields of a record about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub enum NewItem {
    Review(NewReview),
    Service(NewOffering),
    Gift(NewOffering),
}

impl NewItem {
    pub fn kind(&self) -> CollectionKind {
        match self {
            NewItem::Review(_) => CollectionKind::Reviews,
            NewItem::Service(_) => CollectionKind::Services,
            NewItem::Gift(_) => CollectionKind::Gifts,
        }
    }
}

/// Open (and create if missing) the database behind a `sqlite://` URL
pub async fn connect(database_url: &str) -> BotResult<SqlitePool> {
    info!(database_url = %database_url, "Connecting to database");
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Open (and create if missing) a database file
pub async fn connect_file(path: &Path) -> BotResult<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &SqlitePool) -> BotResult<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS greeting (
            id INTEGER PRIMARY KEY,
            photo_path TEXT,
            text TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author TEXT NOT NULL,
            text TEXT NOT NULL,
            date TEXT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    for table in ["services", "gifts"] {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                file_path TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"
        ))
        .execute(pool)
        .await?;
    }

    info!("Database schema initialized successfully");
    Ok(())
}

/// Replace the greeting; at most one row exists afterwards
pub async fn replace_greeting(pool: &SqlitePool, photo_path: Option<&str>, text: &str) -> BotResult<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM greeting").execute(&mut *tx).await?;
    sqlx::query("INSERT INTO greeting (photo_path, text) VALUES (?1, ?2)")
        .bind(photo_path)
        .bind(text)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!("Greeting replaced");
    Ok(())
}

pub async fn get_greeting(pool: &SqlitePool) -> BotResult<Option<Greeting>> {
    let greeting = sqlx::query_as::<_, Greeting>("SELECT photo_path, text FROM greeting LIMIT 1")
        .fetch_optional(pool)
        .await?;
    Ok(greeting)
}

/// Insert a new record and return the id assigned by the store
pub async fn create_item(pool: &SqlitePool, item: &NewItem) -> BotResult<i64> {
    let table = item.kind().descriptor().table_name;

    let result = match item {
        NewItem::Review(review) => {
            sqlx::query("INSERT INTO reviews (author, text, date) VALUES (?1, ?2, ?3)")
                .bind(&review.author)
                .bind(&review.text)
                .bind(&review.date)
                .execute(pool)
                .await?
        }
        NewItem::Service(offering) | NewItem::Gift(offering) => {
            sqlx::query(&format!(
                "INSERT INTO {table} (name, description, file_path) VALUES (?1, ?2, ?3)"
            ))
            .bind(&offering.name)
            .bind(&offering.description)
            .bind(&offering.file_path)
            .execute(pool)
            .await?
        }
    };

    let id = result.last_insert_rowid();
    info!(table = table, id = id, "Record created");
    Ok(id)
}

/// One slice of a collection, newest first
pub async fn list_page(
    pool: &SqlitePool,
    kind: CollectionKind,
    offset: i64,
    limit: i64,
) -> BotResult<Vec<Item>> {
    let table = kind.descriptor().table_name;
    debug!(table = table, offset = offset, limit = limit, "Listing page");

    let items: Vec<Item> = match kind {
        CollectionKind::Reviews => sqlx::query_as::<_, Review>(
            "SELECT id, author, text, date, created_at FROM reviews
             ORDER BY created_at DESC, id DESC
             LIMIT ?1 OFFSET ?2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(Item::Review)
        .collect(),
        CollectionKind::Services | CollectionKind::Gifts => {
            let rows = sqlx::query_as::<_, Offering>(&format!(
                "SELECT id, name, description, file_path, created_at FROM {table}
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?1 OFFSET ?2"
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
            rows.into_iter().map(|row| wrap_offering(kind, row)).collect()
        }
    };

    Ok(items)
}

pub async fn count_items(pool: &SqlitePool, kind: CollectionKind) -> BotResult<i64> {
    let table = kind.descriptor().table_name;
    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await?;
    Ok(total)
}

/// Read a record by id
pub async fn get_item(pool: &SqlitePool, kind: CollectionKind, id: i64) -> BotResult<Option<Item>> {
    let table = kind.descriptor().table_name;

    let item = match kind {
        CollectionKind::Reviews => sqlx::query_as::<_, Review>(
            "SELECT id, author, text, date, created_at FROM reviews WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(Item::Review),
        CollectionKind::Services | CollectionKind::Gifts => sqlx::query_as::<_, Offering>(&format!(
            "SELECT id, name, description, file_path, created_at FROM {table} WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(|row| wrap_offering(kind, row)),
    };

    if item.is_none() {
        debug!(table = table, id = id, "No record found");
    }
    Ok(item)
}

/// Delete a record by id; deleting a missing id is not an error.
/// Returns whether a row was removed.
pub async fn delete_item(pool: &SqlitePool, kind: CollectionKind, id: i64) -> BotResult<bool> {
    let table = kind.descriptor().table_name;
    let rows_affected = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?1"))
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    info!(table = table, id = id, removed = rows_affected > 0, "Delete requested");
    Ok(rows_affected > 0)
}

fn wrap_offering(kind: CollectionKind, row: Offering) -> Item {
    match kind {
        CollectionKind::Gifts => Item::Gift(row),
        _ => Item::Service(row),
    }
}
