use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use kudos_db::{ping, DbPool};
use serde::Serialize;

/// What `/health` can learn about the configured ledger.
#[derive(Clone)]
pub enum LedgerHealth {
    Disabled,
    Sqlite(DbPool),
    /// Remote backends are not checked; reachability only shows up on append.
    Remote(&'static str),
}

#[derive(Clone)]
pub struct HealthState {
    ledger: LedgerHealth,
}

impl HealthState {
    pub fn new(ledger: LedgerHealth) -> Self {
        Self { ledger }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub ledger: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let ledger = ledger_check(&state.ledger).await;
    let ready = ledger.status != "degraded";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "kudos-server accepting slash commands".to_string(),
        },
        ledger,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn ledger_check(ledger: &LedgerHealth) -> HealthCheck {
    match ledger {
        LedgerHealth::Disabled => HealthCheck {
            status: "disabled",
            detail: "no ledger configured; rows are not stored".to_string(),
        },
        LedgerHealth::Sqlite(pool) => match ping(pool).await {
            Ok(()) => HealthCheck { status: "ready", detail: "sqlite query succeeded".to_string() },
            Err(error) => {
                HealthCheck { status: "degraded", detail: format!("sqlite query failed: {error}") }
            }
        },
        LedgerHealth::Remote(backend) => {
            HealthCheck { status: "ready", detail: format!("{backend} ledger configured") }
        }
    }
}
