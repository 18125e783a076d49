use kudos_core::config::{AppConfig, LedgerBackend, LoadOptions};
use kudos_db::{connect_with_config, ping};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct DoctorCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub details: String,
}

impl DoctorCheck {
    fn new(name: &'static str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self { name, status, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub overall_status: CheckStatus,
    pub summary: String,
    pub checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    pub fn passed(&self) -> bool {
        self.overall_status == CheckStatus::Pass
    }
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report(AppConfig::load(LoadOptions::default()));
    let exit_code = if report.passed() { 0 } else { 1 };
    CommandResult { exit_code, output: render(&report, json_output) }
}

pub fn render(report: &DoctorReport, json_output: bool) -> String {
    if json_output {
        return serde_json::to_string_pretty(report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(report)
}

pub fn build_report<E: std::fmt::Display>(loaded: Result<AppConfig, E>) -> DoctorReport {
    let checks = match loaded {
        Ok(config) => vec![
            DoctorCheck::new(
                "config_validation",
                CheckStatus::Pass,
                "configuration loaded and validated",
            ),
            check_bot_token(&config),
            check_ledger(&config),
        ],
        Err(error) => {
            let skipped = "skipped because configuration did not load";
            vec![
                DoctorCheck::new("config_validation", CheckStatus::Fail, error.to_string()),
                DoctorCheck::new("slack_token_shape", CheckStatus::Skipped, skipped),
                DoctorCheck::new("ledger_readiness", CheckStatus::Skipped, skipped),
            ]
        }
    };

    // Skipped checks do not fail the report; at least one must pass.
    let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail)
        && checks.iter().any(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_bot_token(config: &AppConfig) -> DoctorCheck {
    let token = config.slack.bot_token.expose_secret();
    if token.starts_with("xoxb-") && token.len() > "xoxb-".len() {
        DoctorCheck::new("slack_token_shape", CheckStatus::Pass, "bot token has the xoxb- shape")
    } else {
        DoctorCheck::new(
            "slack_token_shape",
            CheckStatus::Fail,
            "bot token must be a Bot User OAuth Token starting with xoxb-",
        )
    }
}

fn check_ledger(config: &AppConfig) -> DoctorCheck {
    match config.ledger.backend {
        LedgerBackend::None => DoctorCheck::new(
            "ledger_readiness",
            CheckStatus::Skipped,
            "ledger backend is `none`; praise and feedback are announced but not stored",
        ),
        LedgerBackend::Sheets => DoctorCheck::new(
            "ledger_readiness",
            CheckStatus::Pass,
            format!(
                "sheets ledger configured for sheet `{}` range `{}`",
                config.ledger.sheet_id.as_deref().unwrap_or_default(),
                config.ledger.sheet_range
            ),
        ),
        LedgerBackend::Sqlite => check_database_connectivity(config),
    }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck::new(
                "ledger_readiness",
                CheckStatus::Fail,
                format!("failed to initialize async runtime: {error}"),
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;
        let pinged = ping(&pool).await.map_err(|error| format!("database query failed: {error}"));
        pool.close().await;
        pinged
    });

    match result {
        Ok(()) => DoctorCheck::new(
            "ledger_readiness",
            CheckStatus::Pass,
            format!("connected using `{}`", config.database.url),
        ),
        Err(error) => DoctorCheck::new("ledger_readiness", CheckStatus::Fail, error),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
