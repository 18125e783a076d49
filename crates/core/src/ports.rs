//! Collaborator seams. Each is injected into the resolver, note search and
//! command router at construction time.

use async_trait::async_trait;

use crate::domain::command::HistoryMessage;
use crate::domain::member::MemberProfile;
use crate::domain::note::NoteRecord;
use crate::errors::CollaboratorError;

/// Current workspace member list, fetched fresh on every call.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn list_members(&self) -> Result<Vec<MemberProfile>, CollaboratorError>;
}

#[async_trait]
pub trait MessagingPlatform: Send + Sync {
    /// Most recent `limit` messages of a channel, newest first.
    async fn fetch_history(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> Result<Vec<HistoryMessage>, CollaboratorError>;

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), CollaboratorError>;
}

/// Append-only store for praise and feedback rows.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn append(&self, record: &NoteRecord) -> Result<(), CollaboratorError>;

    fn backend_name(&self) -> &'static str;
}
