use crate::models::ItemRow;
use crate::{Database, Result, StoreError};
use rusqlite::{Connection, OptionalExtension, params};

/// Field set for item create/update. Price and expected_exchange have
/// already been validated against the item type by the caller.
pub struct ItemInput<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub image_url: Option<&'a str>,
    pub item_type: &'a str,
    pub price: Option<&'a str>,
    pub expected_exchange: Option<&'a str>,
}

impl Database {
    pub fn create_item(&self, id: &str, owner_id: &str, input: &ItemInput<'_>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO items
                     (id, owner_id, title, description, category, image_url,
                      item_type, price, expected_exchange)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    id,
                    owner_id,
                    input.title,
                    input.description,
                    input.category,
                    input.image_url,
                    input.item_type,
                    input.price,
                    input.expected_exchange,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_item(&self, id: &str) -> Result<Option<ItemRow>> {
        self.with_conn(|conn| query_item(conn, id))
    }

    /// All listings, newest first, with owner attached.
    pub fn list_items(&self) -> Result<Vec<ItemRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{ITEM_SELECT} ORDER BY i.created_at DESC, i.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([], item_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Only the owner may update a listing; the sellability invariant is
    /// re-validated by the caller since item_type may change.
    pub fn update_item(&self, id: &str, caller_id: &str, input: &ItemInput<'_>) -> Result<ItemRow> {
        self.with_conn_mut(|conn| {
            require_owner(conn, id, caller_id)?;
            conn.execute(
                "UPDATE items SET title = ?1, description = ?2, category = ?3,
                     image_url = ?4, item_type = ?5, price = ?6, expected_exchange = ?7
                 WHERE id = ?8",
                params![
                    input.title,
                    input.description,
                    input.category,
                    input.image_url,
                    input.item_type,
                    input.price,
                    input.expected_exchange,
                    id,
                ],
            )?;
            query_item(conn, id)?
                .ok_or_else(|| StoreError::Integrity(format!("item {} vanished during update", id)))
        })
    }

    /// Deleting a listing cascades its messages, cart entries, and wishlist
    /// entries via foreign keys.
    pub fn delete_item(&self, id: &str, caller_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            require_owner(conn, id, caller_id)?;
            conn.execute("DELETE FROM items WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

pub(crate) const ITEM_SELECT: &str = "SELECT i.id, i.owner_id, u.display_name, u.college,
        i.title, i.description, i.category, i.image_url,
        i.item_type, i.price, i.expected_exchange, i.is_sold, i.created_at
     FROM items i
     JOIN users u ON i.owner_id = u.id";

pub(crate) fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        owner_name: row.get(2)?,
        owner_college: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        category: row.get(6)?,
        image_url: row.get(7)?,
        item_type: row.get(8)?,
        price: row.get(9)?,
        expected_exchange: row.get(10)?,
        is_sold: row.get(11)?,
        created_at: row.get(12)?,
    })
}

pub(crate) fn query_item(conn: &Connection, id: &str) -> Result<Option<ItemRow>> {
    let mut stmt = conn.prepare(&format!("{ITEM_SELECT} WHERE i.id = ?1"))?;
    let row = stmt.query_row([id], item_from_row).optional()?;
    Ok(row)
}

fn require_owner(conn: &Connection, item_id: &str, caller_id: &str) -> Result<()> {
    let owner_id: Option<String> = conn
        .query_row("SELECT owner_id FROM items WHERE id = ?1", [item_id], |r| {
            r.get(0)
        })
        .optional()?;

    match owner_id {
        None => Err(StoreError::NotFound("item")),
        Some(owner) if owner != caller_id => Err(StoreError::Forbidden(
            "only the owner may modify a listing".into(),
        )),
        Some(_) => Ok(()),
    }
}
