use crate::models::UploadRow;
use crate::{Database, Result};
use rusqlite::{OptionalExtension, params};

impl Database {
    pub fn insert_upload(
        &self,
        id: &str,
        uploader_id: &str,
        file_name: &str,
        file_type: &str,
        size: i64,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO uploads (id, uploader_id, file_name, file_type, size)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, uploader_id, file_name, file_type, size],
            )?;
            Ok(())
        })
    }

    pub fn get_upload(&self, id: &str) -> Result<Option<UploadRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, uploader_id, file_name, file_type, size
                     FROM uploads WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(UploadRow {
                            id: row.get(0)?,
                            uploader_id: row.get(1)?,
                            file_name: row.get(2)?,
                            file_type: row.get(3)?,
                            size: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }
}
