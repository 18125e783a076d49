pub mod call_policy;
pub mod config;
pub mod domain;
pub mod errors;
pub mod note_search;
pub mod ports;
pub mod resolve;

pub use call_policy::CallPolicy;
pub use domain::command::{CommandFrame, HistoryMessage};
pub use domain::member::{MemberProfile, SYSTEM_USER_ID};
pub use domain::mention::{format_mention, parse_exact_mention, ResolvedMention};
pub use domain::note::{NoteKind, NoteRecord};
pub use errors::{CollaboratorError, InterfaceError};
pub use note_search::{NoteSearch, NoteSearchOutcome};
pub use ports::{Ledger, MemberDirectory, MessagingPlatform};
pub use resolve::similarity::SimilarityScorer;
pub use resolve::UserResolver;
