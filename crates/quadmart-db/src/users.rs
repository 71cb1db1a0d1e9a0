use crate::models::UserRow;
use crate::{Database, Result, StoreError};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

impl Database {
    pub fn create_user(
        &self,
        id: &str,
        display_name: &str,
        email: &str,
        password_hash: &str,
        college: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, display_name, email, password, college)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, display_name, email, password_hash, college],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// External-identity login: find the user by external id, or link the
    /// external id onto an existing account with the same email, or create
    /// a fresh account with no password.
    pub fn find_or_create_external_user(
        &self,
        external_id: &str,
        email: &str,
        display_name: &str,
        college: &str,
    ) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            if let Some(user) = query_user(conn, "external_id", external_id)? {
                return Ok(user);
            }

            if let Some(user) = query_user(conn, "email", email)? {
                conn.execute(
                    "UPDATE users SET external_id = ?1 WHERE id = ?2",
                    params![external_id, user.id],
                )?;
                return query_user(conn, "id", &user.id)?.ok_or_else(|| {
                    StoreError::Integrity(format!("user {} vanished during link", user.id))
                });
            }

            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO users (id, display_name, email, external_id, college)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, display_name, email, external_id, college],
            )?;
            query_user(conn, "id", &id)?
                .ok_or_else(|| StoreError::Integrity(format!("user {} vanished after insert", id)))
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // column is a compile-time constant at every call site, never user input
    let sql = format!(
        "SELECT id, display_name, email, password, external_id, college, created_at
         FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                display_name: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                external_id: row.get(4)?,
                college: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}
