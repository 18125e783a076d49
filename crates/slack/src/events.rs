use kudos_core::domain::command::CommandFrame;
use kudos_core::errors::InterfaceError;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// What an inbound `/slack/events` call asks for.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundRequest {
    /// Endpoint verification handshake; answered before anything else.
    Challenge(Value),
    Command(CommandFrame),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl EventContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self { correlation_id: correlation_id.into() }
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("unsupported content type `{0}`")]
    UnsupportedContentType(String),
    #[error("malformed request body: {0}")]
    Malformed(String),
}

impl PayloadError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            Self::UnsupportedContentType(content_type) => {
                InterfaceError::UnsupportedContentType { content_type, correlation_id }
            }
            Self::Malformed(message) => InterfaceError::BadRequest { message, correlation_id },
        }
    }
}

pub fn decode_request(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<InboundRequest, PayloadError> {
    let media_type = content_type
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let fields = match media_type.as_str() {
        JSON_CONTENT_TYPE => decode_json_object(body)?,
        FORM_CONTENT_TYPE => decode_form(body)?,
        _ => return Err(PayloadError::UnsupportedContentType(media_type)),
    };

    if let Some(challenge) = fields.get("challenge") {
        debug!(event_name = "ingress.slack.challenge", "answering url verification challenge");
        return Ok(InboundRequest::Challenge(challenge.clone()));
    }

    let frame = CommandFrame {
        command_name: string_field(&fields, "command"),
        raw_text: string_field(&fields, "text"),
        invoking_user_id: string_field(&fields, "user_id"),
        channel_id: string_field(&fields, "channel_id"),
    };
    debug!(
        event_name = "ingress.slack.command_decoded",
        command = %frame.command_name,
        user_id = %frame.invoking_user_id,
        channel_id = %frame.channel_id,
        "decoded slash command payload"
    );

    Ok(InboundRequest::Command(frame))
}

pub fn challenge_response(challenge: &Value) -> Value {
    json!({ "challenge": challenge })
}

fn string_field(fields: &Map<String, Value>, key: &str) -> String {
    fields.get(key).and_then(Value::as_str).unwrap_or_default().to_owned()
}

fn decode_json_object(body: &[u8]) -> Result<Map<String, Value>, PayloadError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(PayloadError::Malformed("expected a JSON object".to_owned())),
        Err(error) => Err(PayloadError::Malformed(error.to_string())),
    }
}

fn decode_form(body: &[u8]) -> Result<Map<String, Value>, PayloadError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|error| PayloadError::Malformed(error.to_string()))?;

    let mut fields = Map::new();
    for (key, value) in pairs {
        // first occurrence wins
        fields.entry(key).or_insert(Value::String(value));
    }
    Ok(fields)
}
