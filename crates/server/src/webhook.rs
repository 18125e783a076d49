use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use kudos_slack::commands::CommandRouter;
use kudos_slack::events::{challenge_response, decode_request, EventContext, InboundRequest};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct WebhookState {
    router: Arc<CommandRouter>,
}

impl WebhookState {
    pub fn new(router: Arc<CommandRouter>) -> Self {
        Self { router }
    }
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/slack/events", post(slack_events)).with_state(state)
}

pub async fn slack_events(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let content_type = headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok());
    debug!(
        event_name = "ingress.slack.request_received",
        correlation_id = %correlation_id,
        content_type = content_type.unwrap_or("none"),
        body_bytes = body.len(),
        "raw slack request received"
    );

    let request = match decode_request(content_type, &body) {
        Ok(request) => request,
        Err(error) => {
            warn!(
                event_name = "ingress.slack.rejected",
                correlation_id = %correlation_id,
                error = %error,
                "slack request rejected"
            );
            let error = error.into_interface(correlation_id);
            let status =
                StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
            return (status, error.user_message()).into_response();
        }
    };

    match request {
        InboundRequest::Challenge(challenge) => {
            (StatusCode::OK, Json(challenge_response(&challenge))).into_response()
        }
        InboundRequest::Command(frame) => {
            let reply = state.router.route(&frame, &EventContext::new(correlation_id)).await;
            (StatusCode::OK, reply).into_response()
        }
    }
}
