use async_trait::async_trait;
use kudos_core::domain::note::NoteRecord;
use thiserror::Error;

pub mod ledger;
pub mod note;

pub use ledger::SqlNoteLedger;
pub use note::SqlNoteRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Appends one row and returns its id. Rows are never updated or deleted.
    async fn append(&self, record: &NoteRecord) -> Result<i64, RepositoryError>;
}
