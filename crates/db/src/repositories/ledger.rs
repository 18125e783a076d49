use async_trait::async_trait;
use kudos_core::domain::note::NoteRecord;
use kudos_core::errors::CollaboratorError;
use kudos_core::ports::Ledger;
use tracing::debug;

use super::{NoteRepository, RepositoryError, SqlNoteRepository};
use crate::DbPool;

/// `Ledger` backed by the `note_records` table.
pub struct SqlNoteLedger {
    repository: SqlNoteRepository,
}

impl SqlNoteLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { repository: SqlNoteRepository::new(pool) }
    }
}

fn collaborator_error(error: RepositoryError) -> CollaboratorError {
    match error {
        RepositoryError::Database(sqlx::Error::PoolTimedOut) => CollaboratorError::Timeout {
            operation: "ledger.append",
            timeout_ms: 0,
        },
        RepositoryError::Database(sqlx::Error::Io(error)) => {
            CollaboratorError::Transport(error.to_string())
        }
        RepositoryError::Database(error) => CollaboratorError::Unavailable(error.to_string()),
    }
}

#[async_trait]
impl Ledger for SqlNoteLedger {
    async fn append(&self, record: &NoteRecord) -> Result<(), CollaboratorError> {
        let id = self.repository.append(record).await.map_err(collaborator_error)?;
        debug!(event_name = "ledger.sqlite.appended", row_id = id, kind = record.kind.as_str());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use kudos_core::domain::note::{NoteKind, NoteRecord};
    use kudos_core::errors::CollaboratorError;
    use kudos_core::ports::Ledger;

    use super::SqlNoteLedger;
    use crate::{connect_with_settings, migrations::run_pending};

    #[tokio::test]
    async fn ledger_rows_land_in_note_records() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrations");
        let ledger = SqlNoteLedger::new(pool.clone());

        let record =
            NoteRecord::new(NoteKind::Praise, "<@U001>", "<@U042>", "Teamwork", "Helped me ship");
        ledger.append(&record).await.expect("append");

        let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
            "SELECT kind, from_mention, to_mention, value, message FROM note_records",
        )
        .fetch_all(&pool)
        .await
        .expect("select");
        assert_eq!(
            rows,
            vec![(
                "praise".to_string(),
                "<@U001>".to_string(),
                "<@U042>".to_string(),
                "Teamwork".to_string(),
                "Helped me ship".to_string()
            )]
        );
        assert_eq!(ledger.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn missing_table_surfaces_as_unavailable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        let ledger = SqlNoteLedger::new(pool);

        let result = ledger
            .append(&NoteRecord::new(NoteKind::Feedback, "<@U001>", "@Sam", "", "hi"))
            .await;

        assert!(matches!(result, Err(CollaboratorError::Unavailable(_))));
    }
}
