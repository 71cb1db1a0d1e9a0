//! Message storage and the authorization rule that gates who may message
//! whom about a listing.
//!
//! An item only ever supports owner↔buyer threads. A buyer may always open
//! (or continue) a thread with the owner; the owner may reply to a buyer
//! only once that buyer has reached out about the item. Authorization is a
//! derived predicate over message history, re-evaluated on every send —
//! there is no stored "contact established" flag to drift out of sync with
//! the log.

use crate::items::query_item;
use crate::models::{FileRef, InboxRow, ItemRow, MessageRow};
use crate::{Database, Result, StoreError};
use rusqlite::{Connection, OptionalExtension, params};

impl Database {
    /// Authorize and persist one message. A denial never creates a row.
    pub fn send_message(
        &self,
        id: &str,
        item_id: &str,
        sender_id: &str,
        receiver_id: &str,
        body: Option<&str>,
        file: Option<&FileRef>,
    ) -> Result<MessageRow> {
        self.with_conn_mut(|conn| {
            // Not-found outranks authorization: a concurrently deleted item
            // or unknown receiver is a 404, not a 403.
            let item = query_item(conn, item_id)?.ok_or(StoreError::NotFound("item"))?;
            let receiver_exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                [receiver_id],
                |r| r.get(0),
            )?;
            if !receiver_exists {
                return Err(StoreError::NotFound("receiver"));
            }

            authorize_send(conn, &item, sender_id, receiver_id)?;

            let (file_url, file_type, file_name) = match file {
                Some(f) => (
                    Some(f.url.as_str()),
                    Some(f.file_type.as_str()),
                    Some(f.file_name.as_str()),
                ),
                None => (None, None, None),
            };
            conn.execute(
                "INSERT INTO messages
                     (id, item_id, sender_id, receiver_id, body, file_url, file_type, file_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![id, item_id, sender_id, receiver_id, body, file_url, file_type, file_name],
            )?;

            query_message(conn, id)?
                .ok_or_else(|| StoreError::Integrity(format!("message {} vanished after insert", id)))
        })
    }

    /// Thread view: messages on one item where the requesting user is a
    /// participant, oldest first.
    pub fn get_item_messages(&self, item_id: &str, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            if query_item(conn, item_id)?.is_none() {
                return Err(StoreError::NotFound("item"));
            }
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLS} {MESSAGE_FROM}
                 WHERE m.item_id = ?1 AND (m.sender_id = ?2 OR m.receiver_id = ?2)
                 ORDER BY m.created_at ASC, m.rowid ASC"
            ))?;
            let rows = stmt
                .query_map(params![item_id, user_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Inbox view: everything the user sent or received, with the listing
    /// attached, newest first.
    pub fn get_user_messages(&self, user_id: &str) -> Result<Vec<InboxRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLS}, i.title, i.item_type, i.price, i.is_sold
                 {MESSAGE_FROM}
                 WHERE m.sender_id = ?1 OR m.receiver_id = ?1
                 ORDER BY m.created_at DESC, m.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(InboxRow {
                        message: message_from_row(row)?,
                        item_title: row.get(13)?,
                        item_type: row.get(14)?,
                        item_price: row.get(15)?,
                        item_sold: row.get(16)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

/// The authorization rule itself. `item` is the listing being discussed.
fn authorize_send(
    conn: &Connection,
    item: &ItemRow,
    sender_id: &str,
    receiver_id: &str,
) -> Result<()> {
    let owner_id = item.owner_id.as_str();

    // Buyer to owner: always permitted. This is the edge that establishes
    // contact for the (buyer, item) pair.
    if receiver_id == owner_id {
        return Ok(());
    }

    // Owner replying: only to a buyer who has already reached out.
    if sender_id == owner_id {
        if has_buyer_contact(conn, &item.id, receiver_id, owner_id)? {
            return Ok(());
        }
        return Err(StoreError::Forbidden(
            "the owner may only reply to buyers who have messaged them about this listing".into(),
        ));
    }

    // Neither side is the owner: no buyer-to-buyer threads.
    Err(StoreError::Forbidden(
        "messages about a listing go through its owner".into(),
    ))
}

fn has_buyer_contact(
    conn: &Connection,
    item_id: &str,
    buyer_id: &str,
    owner_id: &str,
) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM messages
             WHERE item_id = ?1 AND sender_id = ?2 AND receiver_id = ?3)",
        params![item_id, buyer_id, owner_id],
        |r| r.get(0),
    )?;
    Ok(exists)
}

// JOIN users twice to fetch both participants in a single query
// (eliminates N+1).
const MESSAGE_COLS: &str = "m.id, m.item_id,
        m.sender_id, s.display_name, s.college,
        m.receiver_id, r.display_name, r.college,
        m.body, m.file_url, m.file_type, m.file_name, m.created_at";

const MESSAGE_FROM: &str = "FROM messages m
     JOIN users s ON m.sender_id = s.id
     JOIN users r ON m.receiver_id = r.id
     JOIN items i ON m.item_id = i.id";

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    let file_url: Option<String> = row.get(9)?;
    let file = match file_url {
        Some(url) => Some(FileRef {
            url,
            file_type: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
            file_name: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
        }),
        None => None,
    };
    Ok(MessageRow {
        id: row.get(0)?,
        item_id: row.get(1)?,
        sender_id: row.get(2)?,
        sender_name: row.get(3)?,
        sender_college: row.get(4)?,
        receiver_id: row.get(5)?,
        receiver_name: row.get(6)?,
        receiver_college: row.get(7)?,
        body: row.get(8)?,
        file,
        created_at: row.get(12)?,
    })
}

fn query_message(conn: &Connection, id: &str) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLS} {MESSAGE_FROM} WHERE m.id = ?1"
    ))?;
    let row = stmt.query_row([id], message_from_row).optional()?;
    Ok(row)
}
