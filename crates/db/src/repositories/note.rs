use kudos_core::domain::note::NoteRecord;

use super::{NoteRepository, RepositoryError};
use crate::DbPool;

pub struct SqlNoteRepository {
    pool: DbPool,
}

impl SqlNoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl NoteRepository for SqlNoteRepository {
    async fn append(&self, record: &NoteRecord) -> Result<i64, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO note_records (kind, from_mention, to_mention, value, message, recorded_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(record.kind.as_str())
        .bind(&record.from_mention)
        .bind(&record.to_mention)
        .bind(&record.value)
        .bind(&record.message)
        .bind(record.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}
