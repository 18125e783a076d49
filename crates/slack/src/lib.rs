//! Slack interface for kudos.
//!
//! - **Events** (`events`) - decodes `/slack/events` payloads (JSON or form) and
//!   answers the URL verification challenge
//! - **Commands** (`commands`) - argument grammars and routing for `/mypraise`,
//!   `/myfeedback` and `/mynotez`
//! - **Web API** (`api`) - `users.list`, `conversations.history` and
//!   `chat.postMessage` behind the core collaborator traits
//!
//! ```text
//! POST /slack/events → decode_request → CommandRouter → UserResolver / NoteSearch
//!                                              ↓
//!                                   Ledger + chat.postMessage
//! ```

pub mod api;
pub mod commands;
pub mod events;

pub use api::SlackWebClient;
pub use commands::{parse_arguments, ArgumentSet, CommandRouter, Grammar, SlashCommand, UsageError};
pub use events::{decode_request, EventContext, InboundRequest, PayloadError};
