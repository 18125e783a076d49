//! Slack Web API adapter for the member directory and messaging seams.
//!
//! Only three methods are used: `users.list` (paginated), `conversations.history`
//! and `chat.postMessage`. Timeouts and retries are applied by the callers'
//! `CallPolicy`, so every method here makes exactly one attempt per page.

use async_trait::async_trait;
use kudos_core::config::SlackConfig;
use kudos_core::domain::command::HistoryMessage;
use kudos_core::domain::member::MemberProfile;
use kudos_core::errors::CollaboratorError;
use kudos_core::ports::{MemberDirectory, MessagingPlatform};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const MEMBERS_PAGE_SIZE: u32 = 200;
const MAX_MEMBER_PAGES: usize = 100;

pub struct SlackWebClient {
    client: Client,
    base_url: String,
    bot_token: SecretString,
}

impl SlackWebClient {
    pub fn new(base_url: impl Into<String>, bot_token: SecretString) -> Self {
        Self { client: Client::new(), base_url: base_url.into(), bot_token }
    }

    pub fn from_config(config: &SlackConfig) -> Self {
        Self::new(config.api_base_url.clone(), config.bot_token.clone())
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url.trim_end_matches('/'))
    }

    async fn call(
        &self,
        method: &str,
        request: RequestBuilder,
    ) -> Result<Value, CollaboratorError> {
        let response = request
            .bearer_auth(self.bot_token.expose_secret())
            .send()
            .await
            .map_err(|error| CollaboratorError::Transport(format!("{method}: {error}")))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(CollaboratorError::Transport(format!("{method} returned {status}")));
        }
        if !status.is_success() {
            return Err(CollaboratorError::Api(format!("{method} returned {status}")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|error| CollaboratorError::Decode(format!("{method}: {error}")))?;
        ensure_ok(method, payload)
    }
}

#[async_trait]
impl MemberDirectory for SlackWebClient {
    async fn list_members(&self) -> Result<Vec<MemberProfile>, CollaboratorError> {
        let mut members = Vec::new();
        let mut cursor = String::new();

        for _ in 0..MAX_MEMBER_PAGES {
            let mut query = vec![("limit", MEMBERS_PAGE_SIZE.to_string())];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.clone()));
            }

            let request = self.client.get(self.endpoint("users.list")).query(&query);
            let page = decode_members_page(self.call("users.list", request).await?)?;
            members.extend(page.members);

            match page.next_cursor {
                Some(next) if next != cursor => cursor = next,
                _ => break,
            }
        }

        debug!(event_name = "slack.users_list.loaded", members = members.len(), "members listed");
        Ok(members)
    }
}

#[async_trait]
impl MessagingPlatform for SlackWebClient {
    async fn fetch_history(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> Result<Vec<HistoryMessage>, CollaboratorError> {
        let request = self
            .client
            .get(self.endpoint("conversations.history"))
            .query(&[("channel", channel_id.to_owned()), ("limit", limit.to_string())]);
        decode_history(self.call("conversations.history", request).await?)
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), CollaboratorError> {
        let request = self
            .client
            .post(self.endpoint("chat.postMessage"))
            .json(&json!({ "channel": channel, "text": text }));
        self.call("chat.postMessage", request).await.map(|_| ())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct MembersPage {
    pub members: Vec<MemberProfile>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UsersListResponse {
    members: Vec<SlackUser>,
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SlackUser {
    id: String,
    name: String,
    deleted: bool,
    is_bot: bool,
    profile: SlackProfile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SlackProfile {
    display_name: String,
    real_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseMetadata {
    next_cursor: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoryResponse {
    messages: Vec<SlackMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SlackMessage {
    text: String,
}

/// Rejects `"ok": false` envelopes, surfacing Slack's error code.
pub fn ensure_ok(method: &str, payload: Value) -> Result<Value, CollaboratorError> {
    match payload.get("ok").and_then(Value::as_bool) {
        Some(true) => Ok(payload),
        Some(false) => {
            let code = payload.get("error").and_then(Value::as_str).unwrap_or("unknown_error");
            Err(CollaboratorError::Api(format!("{method}: {code}")))
        }
        None => Err(CollaboratorError::Decode(format!("{method}: response has no `ok` field"))),
    }
}

pub fn decode_members_page(payload: Value) -> Result<MembersPage, CollaboratorError> {
    let response: UsersListResponse = serde_json::from_value(payload)
        .map_err(|error| CollaboratorError::Decode(format!("users.list: {error}")))?;

    let members = response
        .members
        .into_iter()
        .map(|user| MemberProfile {
            id: user.id,
            display_name: user.profile.display_name,
            real_name: user.profile.real_name,
            username: user.name,
            is_deleted: user.deleted,
            is_bot: user.is_bot,
        })
        .collect();
    let next_cursor = response
        .response_metadata
        .map(|metadata| metadata.next_cursor)
        .filter(|cursor| !cursor.is_empty());

    Ok(MembersPage { members, next_cursor })
}

pub fn decode_history(payload: Value) -> Result<Vec<HistoryMessage>, CollaboratorError> {
    let response: HistoryResponse = serde_json::from_value(payload)
        .map_err(|error| CollaboratorError::Decode(format!("conversations.history: {error}")))?;
    Ok(response.messages.into_iter().map(|message| HistoryMessage::new(message.text)).collect())
}

#[cfg(test)]
mod tests {
    use kudos_core::domain::command::HistoryMessage;
    use kudos_core::errors::CollaboratorError;
    use secrecy::SecretString;
    use serde_json::json;

    use super::{decode_history, decode_members_page, ensure_ok, SlackWebClient};

    #[test]
    fn members_page_maps_profiles_and_cursor() {
        let payload = json!({
            "ok": true,
            "members": [
                {
                    "id": "U7",
                    "name": "ariel.s",
                    "deleted": false,
                    "is_bot": false,
                    "profile": { "display_name": "Ariel", "real_name": "Ariel Smith" }
                },
                {
                    "id": "USLACKBOT",
                    "name": "slackbot",
                    "profile": { "display_name": "Slackbot", "real_name": "Slackbot" }
                },
                { "id": "B1", "name": "deploy-bot", "is_bot": true, "profile": {} }
            ],
            "response_metadata": { "next_cursor": "dXNlcjpVMEc5V0ZYTlo=" }
        });

        let page = decode_members_page(payload).expect("decode");

        assert_eq!(page.members.len(), 3);
        assert_eq!(page.members[0].id, "U7");
        assert_eq!(page.members[0].display_name, "Ariel");
        assert_eq!(page.members[0].real_name, "Ariel Smith");
        assert_eq!(page.members[0].username, "ariel.s");
        assert!(page.members[0].is_resolvable());
        assert!(!page.members[1].is_resolvable());
        assert!(page.members[2].is_bot);
        assert_eq!(page.next_cursor.as_deref(), Some("dXNlcjpVMEc5V0ZYTlo="));
    }

    #[test]
    fn empty_cursor_ends_pagination() {
        let payload = json!({
            "ok": true,
            "members": [],
            "response_metadata": { "next_cursor": "" }
        });

        let page = decode_members_page(payload).expect("decode");

        assert!(page.members.is_empty());
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn history_keeps_supplied_order() {
        let payload = json!({
            "ok": true,
            "messages": [
                { "type": "message", "text": "newest", "ts": "2.0" },
                { "type": "message", "ts": "1.5" },
                { "type": "message", "text": "oldest", "ts": "1.0" }
            ]
        });

        let messages = decode_history(payload).expect("decode");

        assert_eq!(
            messages,
            vec![
                HistoryMessage::new("newest"),
                HistoryMessage::new(""),
                HistoryMessage::new("oldest")
            ]
        );
    }

    #[test]
    fn not_ok_envelopes_surface_the_error_code() {
        let rejected =
            ensure_ok("conversations.history", json!({ "ok": false, "error": "not_in_channel" }));
        assert_eq!(
            rejected,
            Err(CollaboratorError::Api("conversations.history: not_in_channel".to_owned()))
        );

        let shapeless = ensure_ok("users.list", json!({ "members": [] }));
        assert!(matches!(shapeless, Err(CollaboratorError::Decode(_))));
    }

    #[test]
    fn endpoint_joins_base_url_and_method() {
        let client = SlackWebClient::new(
            "https://slack.example.test/api/",
            SecretString::from("xoxb-test".to_owned()),
        );
        assert_eq!(
            client.endpoint("chat.postMessage"),
            "https://slack.example.test/api/chat.postMessage"
        );
    }
}
