//! Cart and wishlist membership. The two tables have the same shape and
//! independent lifecycles, so the queries are shared.
//!
//! Add-to-cart deliberately does not check `is_sold` and does not dedupe
//! (user, item) pairs: checkout is the sole gatekeeper for sellability.

use crate::items::item_from_row;
use crate::models::EntryRow;
use crate::{Database, Result, StoreError};
use rusqlite::{Connection, OptionalExtension, params};

#[derive(Clone, Copy)]
enum Table {
    Cart,
    Wishlist,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Cart => "cart_items",
            Table::Wishlist => "wishlist_items",
        }
    }
}

impl Database {
    pub fn add_cart_entry(&self, id: &str, user_id: &str, item_id: &str) -> Result<EntryRow> {
        self.with_conn_mut(|conn| add_entry(conn, Table::Cart, id, user_id, item_id))
    }

    pub fn list_cart(&self, user_id: &str) -> Result<Vec<EntryRow>> {
        self.with_conn(|conn| list_entries(conn, Table::Cart, user_id))
    }

    pub fn remove_cart_entry(&self, user_id: &str, item_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| remove_entry(conn, Table::Cart, user_id, item_id))
    }

    pub fn add_wishlist_entry(&self, id: &str, user_id: &str, item_id: &str) -> Result<EntryRow> {
        self.with_conn_mut(|conn| add_entry(conn, Table::Wishlist, id, user_id, item_id))
    }

    pub fn list_wishlist(&self, user_id: &str) -> Result<Vec<EntryRow>> {
        self.with_conn(|conn| list_entries(conn, Table::Wishlist, user_id))
    }

    pub fn remove_wishlist_entry(&self, user_id: &str, item_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| remove_entry(conn, Table::Wishlist, user_id, item_id))
    }
}

fn add_entry(
    conn: &Connection,
    table: Table,
    id: &str,
    user_id: &str,
    item_id: &str,
) -> Result<EntryRow> {
    let item_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM items WHERE id = ?1)",
        [item_id],
        |r| r.get(0),
    )?;
    if !item_exists {
        return Err(StoreError::NotFound("item"));
    }

    conn.execute(
        &format!(
            "INSERT INTO {} (id, user_id, item_id) VALUES (?1, ?2, ?3)",
            table.name()
        ),
        params![id, user_id, item_id],
    )?;

    query_entry(conn, table, id)?
        .ok_or_else(|| StoreError::Integrity(format!("entry {} vanished after insert", id)))
}

fn query_entry(conn: &Connection, table: Table, id: &str) -> Result<Option<EntryRow>> {
    let sql = format!(
        "SELECT i.id, i.owner_id, u.display_name, u.college,
                i.title, i.description, i.category, i.image_url,
                i.item_type, i.price, i.expected_exchange, i.is_sold, i.created_at,
                e.id, e.created_at
         FROM {} e
         JOIN items i ON e.item_id = i.id
         JOIN users u ON i.owner_id = u.id
         WHERE e.id = ?1",
        table.name(),
    );
    let row = conn
        .prepare(&sql)?
        .query_row([id], |row| {
            Ok(EntryRow {
                item: item_from_row(row)?,
                id: row.get(13)?,
                created_at: row.get(14)?,
            })
        })
        .optional()?;
    Ok(row)
}

fn list_entries(conn: &Connection, table: Table, user_id: &str) -> Result<Vec<EntryRow>> {
    // Item columns first so item_from_row can be reused, entry columns after.
    let sql = format!(
        "SELECT i.id, i.owner_id, u.display_name, u.college,
                i.title, i.description, i.category, i.image_url,
                i.item_type, i.price, i.expected_exchange, i.is_sold, i.created_at,
                e.id, e.created_at
         FROM {} e
         JOIN items i ON e.item_id = i.id
         JOIN users u ON i.owner_id = u.id
         WHERE e.user_id = ?1
         ORDER BY e.created_at DESC, e.rowid DESC",
        table.name(),
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], |row| {
            Ok(EntryRow {
                item: item_from_row(row)?,
                id: row.get(13)?,
                created_at: row.get(14)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn remove_entry(conn: &Connection, table: Table, user_id: &str, item_id: &str) -> Result<()> {
    let removed = conn.execute(
        &format!(
            "DELETE FROM {} WHERE user_id = ?1 AND item_id = ?2",
            table.name()
        ),
        params![user_id, item_id],
    )?;
    if removed == 0 {
        return Err(StoreError::NotFound("entry"));
    }
    Ok(())
}
