//! Checkout: the one multi-row, multi-table write in the system.
//!
//! Converts every cart entry of a user into a single order inside one
//! IMMEDIATE transaction on the writer connection. Barter items and
//! already-sold items are silently excluded; the cart is fully cleared
//! either way. Prices are exact decimals end to end — never binary
//! floating point.

use std::collections::HashSet;

use crate::{Database, Result, StoreError};
use rusqlite::{Transaction, TransactionBehavior, params};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

#[derive(Debug)]
pub struct Receipt {
    pub order_id: String,
    pub user_id: String,
    pub total: Decimal,
    pub created_at: String,
    pub lines: Vec<ReceiptLine>,
}

#[derive(Debug)]
pub struct ReceiptLine {
    pub item_id: String,
    pub title: String,
    pub price: Decimal,
}

struct CartLine {
    item_id: String,
    title: String,
    item_type: String,
    price: Option<String>,
    is_sold: bool,
}

impl Database {
    pub fn checkout(&self, user_id: &str) -> Result<Receipt> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let receipt = run_checkout(&tx, user_id)?;
            tx.commit()?;
            info!(
                order_id = %receipt.order_id,
                total = %receipt.total,
                lines = receipt.lines.len(),
                "checkout committed"
            );
            Ok(receipt)
        })
    }
}

/// The whole transaction body. Returning an error drops the transaction,
/// rolling back every write.
fn run_checkout(tx: &Transaction<'_>, user_id: &str) -> Result<Receipt> {
    let cart = load_cart(tx, user_id)?;
    if cart.is_empty() {
        return Err(StoreError::EmptyCart);
    }

    // Sellable entries only. The cart may hold duplicate rows for one item;
    // an item can be sold once, so later duplicates are dropped here.
    let mut seen = HashSet::new();
    let valid: Vec<&CartLine> = cart
        .iter()
        .filter(|line| line.item_type == "sell" && !line.is_sold)
        .filter(|line| seen.insert(line.item_id.clone()))
        .collect();
    if valid.is_empty() {
        return Err(StoreError::NoSellableItems);
    }

    let mut total = Decimal::ZERO;
    let mut lines = Vec::with_capacity(valid.len());
    for entry in &valid {
        let raw = entry.price.as_deref().ok_or_else(|| {
            StoreError::Integrity(format!("sell item {} has no price", entry.item_id))
        })?;
        let price: Decimal = raw.parse().map_err(|_| {
            StoreError::Integrity(format!("item {} has unparseable price '{}'", entry.item_id, raw))
        })?;
        total += price;
        lines.push(ReceiptLine {
            item_id: entry.item_id.clone(),
            title: entry.title.clone(),
            price,
        });
    }

    let order_id = Uuid::new_v4().to_string();
    tx.execute(
        "INSERT INTO orders (id, user_id, total) VALUES (?1, ?2, ?3)",
        params![order_id, user_id, total.to_string()],
    )?;

    for line in &lines {
        tx.execute(
            "INSERT INTO order_items (id, order_id, item_id, price) VALUES (?1, ?2, ?3, ?4)",
            params![
                Uuid::new_v4().to_string(),
                order_id,
                line.item_id,
                line.price.to_string()
            ],
        )?;
        // The valid-set read above ran inside this same transaction, so the
        // flip must hit exactly one unsold row. Anything else is a fault.
        let flipped = tx.execute(
            "UPDATE items SET is_sold = 1 WHERE id = ?1 AND is_sold = 0",
            [&line.item_id],
        )?;
        if flipped != 1 {
            return Err(StoreError::Integrity(format!(
                "item {} was already sold mid-transaction",
                line.item_id
            )));
        }
    }

    // The entire cart is cleared, including entries excluded as invalid.
    tx.execute("DELETE FROM cart_items WHERE user_id = ?1", [user_id])?;

    let created_at: String = tx.query_row(
        "SELECT created_at FROM orders WHERE id = ?1",
        [&order_id],
        |r| r.get(0),
    )?;

    Ok(Receipt {
        order_id,
        user_id: user_id.to_string(),
        total,
        created_at,
        lines,
    })
}

fn load_cart(tx: &Transaction<'_>, user_id: &str) -> Result<Vec<CartLine>> {
    let mut stmt = tx.prepare(
        "SELECT i.id, i.title, i.item_type, i.price, i.is_sold
         FROM cart_items c
         JOIN items i ON c.item_id = i.id
         WHERE c.user_id = ?1
         ORDER BY c.created_at ASC, c.rowid ASC",
    )?;
    let rows = stmt
        .query_map([user_id], |row| {
            Ok(CartLine {
                item_id: row.get(0)?,
                title: row.get(1)?,
                item_type: row.get(2)?,
                price: row.get(3)?,
                is_sold: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
