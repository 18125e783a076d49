use std::sync::Arc;

use kudos_core::call_policy::CallPolicy;
use kudos_core::config::DEFAULT_PRAISE_CHANNEL;
use kudos_core::domain::command::CommandFrame;
use kudos_core::domain::mention::format_mention;
use kudos_core::domain::note::{NoteKind, NoteRecord};
use kudos_core::errors::InterfaceError;
use kudos_core::note_search::NoteSearch;
use kudos_core::ports::{Ledger, MessagingPlatform};
use kudos_core::resolve::UserResolver;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::events::EventContext;

pub const PRAISE_USAGE: &str = "Usage: /mypraise <@UserID> Value Message\nor: /mypraise @Name Value Message\nExample: /mypraise @Ariel Performance Great job!";
pub const FEEDBACK_USAGE: &str =
    "Usage: /myfeedback <@UserID> Feedback or /myfeedback @Name Feedback";
pub const NOTES_USAGE: &str = "Usage: /mynotez @Name Note text";
pub const NOTES_GET_USAGE: &str = "Usage: /mynotez get @Name";
pub const UNKNOWN_COMMAND: &str = "Unknown command";

/// Field layout of one command's free text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grammar {
    pub min_fields: usize,
    pub max_splits: usize,
    pub usage: &'static str,
}

pub const PRAISE_GRAMMAR: Grammar = Grammar { min_fields: 3, max_splits: 2, usage: PRAISE_USAGE };
pub const FEEDBACK_GRAMMAR: Grammar =
    Grammar { min_fields: 2, max_splits: 1, usage: FEEDBACK_USAGE };
pub const NOTES_GRAMMAR: Grammar = Grammar { min_fields: 2, max_splits: 1, usage: NOTES_USAGE };
pub const NOTES_GET_GRAMMAR: Grammar =
    Grammar { min_fields: 2, max_splits: 1, usage: NOTES_GET_USAGE };

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgumentSet {
    fields: Vec<String>,
}

impl ArgumentSet {
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or_default()
    }

    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("command arguments did not match the expected usage")]
pub struct UsageError {
    usage: &'static str,
}

impl UsageError {
    pub fn usage(&self) -> &'static str {
        self.usage
    }
}

/// Splits `raw_text` on whitespace runs, at most `max_splits` times. The
/// remainder is kept whole as the last field, minus one pair of enclosing
/// double quotes.
pub fn parse_arguments(raw_text: &str, grammar: &Grammar) -> Result<ArgumentSet, UsageError> {
    let mut fields = Vec::with_capacity(grammar.max_splits + 1);
    let mut rest = raw_text.trim();

    while !rest.is_empty() {
        if fields.len() == grammar.max_splits {
            fields.push(strip_enclosing_quotes(rest).to_owned());
            break;
        }

        match rest.find(char::is_whitespace) {
            Some(index) => {
                fields.push(rest[..index].to_owned());
                rest = rest[index..].trim_start();
            }
            None => {
                fields.push(rest.to_owned());
                break;
            }
        }
    }

    if fields.len() < grammar.min_fields {
        return Err(UsageError { usage: grammar.usage });
    }

    Ok(ArgumentSet { fields })
}

fn strip_enclosing_quotes(text: &str) -> &str {
    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}')] {
        if text.chars().count() >= 2 {
            if let Some(inner) = text.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
                return inner;
            }
        }
    }
    text
}

/// Supported slash commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlashCommand {
    Praise,
    Feedback,
    Notes,
}

impl SlashCommand {
    pub fn parse(command_name: &str) -> Option<Self> {
        match command_name {
            "/mypraise" => Some(Self::Praise),
            "/myfeedback" => Some(Self::Feedback),
            "/mynotez" => Some(Self::Notes),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Praise => "/mypraise",
            Self::Feedback => "/myfeedback",
            Self::Notes => "/mynotez",
        }
    }

    /// `/mynotez` picks between its two grammars from the first token.
    pub fn grammar(&self, raw_text: &str) -> &'static Grammar {
        match self {
            Self::Praise => &PRAISE_GRAMMAR,
            Self::Feedback => &FEEDBACK_GRAMMAR,
            Self::Notes if is_get_request(raw_text) => &NOTES_GET_GRAMMAR,
            Self::Notes => &NOTES_GRAMMAR,
        }
    }
}

fn is_get_request(raw_text: &str) -> bool {
    raw_text.split_whitespace().next().is_some_and(|token| token.eq_ignore_ascii_case("get"))
}

pub struct CommandRouter {
    resolver: UserResolver,
    messaging: Arc<dyn MessagingPlatform>,
    ledger: Option<Arc<dyn Ledger>>,
    notes: NoteSearch,
    policy: CallPolicy,
    praise_channel: String,
}

impl CommandRouter {
    pub fn new(
        resolver: UserResolver,
        messaging: Arc<dyn MessagingPlatform>,
        ledger: Option<Arc<dyn Ledger>>,
    ) -> Self {
        Self {
            resolver,
            notes: NoteSearch::new(messaging.clone()),
            messaging,
            ledger,
            policy: CallPolicy::default(),
            praise_channel: DEFAULT_PRAISE_CHANNEL.to_owned(),
        }
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.notes = self.notes.with_policy(policy.clone());
        self.policy = policy;
        self
    }

    pub fn with_praise_channel(mut self, praise_channel: impl Into<String>) -> Self {
        self.praise_channel = praise_channel.into();
        self
    }

    pub fn with_history_limit(mut self, history_limit: u32) -> Self {
        self.notes = self.notes.with_history_limit(history_limit);
        self
    }

    pub fn ledger_backend(&self) -> Option<&'static str> {
        self.ledger.as_ref().map(|ledger| ledger.backend_name())
    }

    /// Handles one command and returns the text shown to the invoking user.
    pub async fn route(&self, frame: &CommandFrame, ctx: &EventContext) -> String {
        info!(
            event_name = "ingress.slack.command_received",
            correlation_id = %ctx.correlation_id,
            command = %frame.command_name,
            user_id = %frame.invoking_user_id,
            "slash command received"
        );

        let Some(command) = SlashCommand::parse(&frame.command_name) else {
            debug!(
                event_name = "ingress.slack.unknown_command",
                correlation_id = %ctx.correlation_id,
                command = %frame.command_name,
                "unknown slash command"
            );
            return UNKNOWN_COMMAND.to_owned();
        };

        let arguments = match parse_arguments(&frame.raw_text, command.grammar(&frame.raw_text)) {
            Ok(arguments) => arguments,
            Err(error) => {
                debug!(
                    event_name = "ingress.slack.usage_error",
                    correlation_id = %ctx.correlation_id,
                    command = command.name(),
                    "arguments did not satisfy command grammar"
                );
                return error.usage().to_owned();
            }
        };

        match command {
            SlashCommand::Praise => self.handle_praise(frame, arguments, ctx).await,
            SlashCommand::Feedback => self.handle_feedback(frame, arguments, ctx).await,
            SlashCommand::Notes if is_get_request(&frame.raw_text) => {
                self.notes.search(&frame.channel_id, arguments.field(1)).await.render()
            }
            SlashCommand::Notes => self.handle_note(frame, arguments, ctx).await,
        }
    }

    async fn handle_praise(
        &self,
        frame: &CommandFrame,
        arguments: ArgumentSet,
        ctx: &EventContext,
    ) -> String {
        let to = self.resolver.resolve(arguments.field(0)).await;
        let record = NoteRecord::new(
            NoteKind::Praise,
            format_mention(&frame.invoking_user_id),
            to.mention_text(),
            arguments.field(1),
            arguments.field(2),
        );

        if let Err(error) = self.persist(&record, ctx).await {
            return error.user_message().to_owned();
        }

        let announcement = format!(
            "{} praised {} for *{}*:\n> {}",
            record.from_mention, record.to_mention, record.value, record.message
        );
        self.post(&self.praise_channel, &announcement, ctx).await;

        format!("Praise noted and posted to {}!", self.praise_channel)
    }

    async fn handle_feedback(
        &self,
        frame: &CommandFrame,
        arguments: ArgumentSet,
        ctx: &EventContext,
    ) -> String {
        let to = self.resolver.resolve(arguments.field(0)).await;
        let record = NoteRecord::new(
            NoteKind::Feedback,
            format_mention(&frame.invoking_user_id),
            to.mention_text(),
            "",
            arguments.field(1),
        );

        match self.persist(&record, ctx).await {
            Ok(()) => "Feedback saved (private).".to_owned(),
            Err(error) => error.user_message().to_owned(),
        }
    }

    async fn handle_note(
        &self,
        frame: &CommandFrame,
        arguments: ArgumentSet,
        ctx: &EventContext,
    ) -> String {
        let target = arguments.field(0);
        let text = format!("Note about {target}: {}", arguments.field(1));
        self.post(&frame.channel_id, &text, ctx).await;

        format!("Saved note about {target}.")
    }

    async fn persist(&self, record: &NoteRecord, ctx: &EventContext) -> Result<(), InterfaceError> {
        let Some(ledger) = self.ledger.as_ref() else {
            warn!(
                event_name = "ledger.append.skipped",
                correlation_id = %ctx.correlation_id,
                kind = record.kind.as_str(),
                "no ledger configured; row not stored"
            );
            return Ok(());
        };

        debug!(
            event_name = "ledger.append.started",
            correlation_id = %ctx.correlation_id,
            backend = ledger.backend_name(),
            row = ?record.to_row(),
            "appending ledger row"
        );

        self.policy.run_write("ledger.append", move || ledger.append(record)).await.map_err(
            |error| {
                warn!(
                    event_name = "ledger.append.failed",
                    correlation_id = %ctx.correlation_id,
                    backend = ledger.backend_name(),
                    error = %error,
                    "ledger append failed"
                );
                error.into_interface(ctx.correlation_id.clone())
            },
        )
    }

    async fn post(&self, channel: &str, text: &str, ctx: &EventContext) {
        let preview: String = text.chars().take(50).collect();
        debug!(
            event_name = "egress.slack.post_message",
            correlation_id = %ctx.correlation_id,
            channel,
            preview = %preview,
            "posting message"
        );

        let messaging = &self.messaging;
        let result = self
            .policy
            .run_write("chat.postMessage", move || messaging.post_message(channel, text))
            .await;
        if let Err(error) = result {
            warn!(
                event_name = "egress.slack.post_failed",
                correlation_id = %ctx.correlation_id,
                channel,
                error = %error,
                "message post failed"
            );
        }
    }
}
