//! Database row types — these map directly to SQLite rows.
//! Distinct from the quadmart-types API models to keep the DB layer
//! independent.

use chrono::{DateTime, Utc};
use tracing::warn;

pub struct UserRow {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub password: Option<String>,
    pub external_id: Option<String>,
    pub college: String,
    pub created_at: String,
}

/// An item joined with its owner (display name and college come from the
/// users table).
#[derive(Debug)]
pub struct ItemRow {
    pub id: String,
    pub owner_id: String,
    pub owner_name: String,
    pub owner_college: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub item_type: String,
    pub price: Option<String>,
    pub expected_exchange: Option<String>,
    pub is_sold: bool,
    pub created_at: String,
}

#[derive(Debug)]
pub struct FileRef {
    pub url: String,
    pub file_type: String,
    pub file_name: String,
}

/// A message joined with both participants.
#[derive(Debug)]
pub struct MessageRow {
    pub id: String,
    pub item_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_college: String,
    pub receiver_id: String,
    pub receiver_name: String,
    pub receiver_college: String,
    pub body: Option<String>,
    pub file: Option<FileRef>,
    pub created_at: String,
}

/// Inbox projection: a message plus the listing it concerns.
pub struct InboxRow {
    pub message: MessageRow,
    pub item_title: String,
    pub item_type: String,
    pub item_price: Option<String>,
    pub item_sold: bool,
}

/// A cart or wishlist entry joined with its item.
#[derive(Debug)]
pub struct EntryRow {
    pub id: String,
    pub created_at: String,
    pub item: ItemRow,
}

pub struct UploadRow {
    pub id: String,
    pub uploader_id: String,
    pub file_name: String,
    pub file_type: String,
    pub size: i64,
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert; corrupt values are logged and collapse
/// to the epoch rather than failing the whole read.
pub fn parse_created_at(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}': {}", raw, e);
            DateTime::default()
        })
}
