use crate::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            display_name    TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            password        TEXT,
            external_id     TEXT UNIQUE,
            college         TEXT NOT NULL DEFAULT '',
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS items (
            id                  TEXT PRIMARY KEY,
            owner_id            TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title               TEXT NOT NULL,
            description         TEXT NOT NULL,
            category            TEXT NOT NULL,
            image_url           TEXT,
            item_type           TEXT NOT NULL CHECK (item_type IN ('sell', 'barter')),
            price               TEXT,
            expected_exchange   TEXT,
            is_sold             INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_items_owner
            ON items(owner_id);

        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            item_id     TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            sender_id   TEXT NOT NULL REFERENCES users(id),
            receiver_id TEXT NOT NULL REFERENCES users(id),
            body        TEXT,
            file_url    TEXT,
            file_type   TEXT,
            file_name   TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_item
            ON messages(item_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_messages_participants
            ON messages(item_id, sender_id, receiver_id);

        CREATE TABLE IF NOT EXISTS cart_items (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            item_id     TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_cart_user
            ON cart_items(user_id);

        CREATE TABLE IF NOT EXISTS wishlist_items (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            item_id     TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_wishlist_user
            ON wishlist_items(user_id);

        CREATE TABLE IF NOT EXISTS orders (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            total       TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS order_items (
            id          TEXT PRIMARY KEY,
            order_id    TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            item_id     TEXT NOT NULL REFERENCES items(id),
            price       TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_order_items_order
            ON order_items(order_id);

        CREATE TABLE IF NOT EXISTS uploads (
            id          TEXT PRIMARY KEY,
            uploader_id TEXT NOT NULL REFERENCES users(id),
            file_name   TEXT NOT NULL,
            file_type   TEXT NOT NULL,
            size        INTEGER NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
