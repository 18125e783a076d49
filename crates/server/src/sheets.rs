use async_trait::async_trait;
use kudos_core::config::LedgerConfig;
use kudos_core::domain::note::NoteRecord;
use kudos_core::errors::CollaboratorError;
use kudos_core::ports::Ledger;
use reqwest::{Client, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SheetsSetupError {
    #[error("ledger.sheet_id is not set")]
    MissingSheetId,
    #[error("ledger.access_token is not set")]
    MissingAccessToken,
    #[error("invalid ledger.sheets_base_url `{0}`")]
    InvalidBaseUrl(String),
}

/// Appends ledger rows to a Google Sheet with a pre-issued OAuth access token.
pub struct SheetsLedger {
    client: Client,
    append_url: Url,
    access_token: SecretString,
}

impl SheetsLedger {
    pub fn from_config(config: &LedgerConfig) -> Result<Self, SheetsSetupError> {
        let sheet_id = config.sheet_id.as_deref().ok_or(SheetsSetupError::MissingSheetId)?;
        let access_token =
            config.access_token.clone().ok_or(SheetsSetupError::MissingAccessToken)?;
        let append_url = append_url(&config.sheets_base_url, sheet_id, &config.sheet_range)?;

        Ok(Self { client: Client::new(), append_url, access_token })
    }
}

fn append_url(base_url: &str, sheet_id: &str, range: &str) -> Result<Url, SheetsSetupError> {
    let invalid = || SheetsSetupError::InvalidBaseUrl(base_url.to_string());
    let append_segment = format!("{range}:append");
    let mut url = Url::parse(base_url.trim_end_matches('/')).map_err(|_| invalid())?;
    url.path_segments_mut().map_err(|_| invalid())?.pop_if_empty().extend([
        "spreadsheets",
        sheet_id,
        "values",
        append_segment.as_str(),
    ]);
    url.query_pairs_mut()
        .append_pair("valueInputOption", "RAW")
        .append_pair("insertDataOption", "INSERT_ROWS");
    Ok(url)
}

#[async_trait]
impl Ledger for SheetsLedger {
    async fn append(&self, record: &NoteRecord) -> Result<(), CollaboratorError> {
        let response = self
            .client
            .post(self.append_url.clone())
            .bearer_auth(self.access_token.expose_secret())
            .json(&json!({ "values": [record.to_row()] }))
            .send()
            .await
            .map_err(|error| CollaboratorError::Transport(format!("sheets append: {error}")))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(CollaboratorError::Transport(format!("sheets append returned {status}")));
        }
        if !status.is_success() {
            return Err(CollaboratorError::Api(format!("sheets append returned {status}")));
        }

        debug!(event_name = "ledger.sheets.appended", kind = record.kind.as_str());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sheets"
    }
}
