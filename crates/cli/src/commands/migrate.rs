use kudos_core::config::{AppConfig, LedgerBackend, LoadOptions};
use kudos_db::{connect_with_config, migrations, DbPool};
use serde_json::json;

use crate::commands::{CommandResult, ErrorClass};

const COMMAND: &str = "migrate";

/// What a successful run leaves behind in the ledger database.
#[derive(Debug)]
struct SchemaReport {
    applied_versions: Vec<i64>,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                ErrorClass::ConfigValidation,
                format!("configuration issue: {error}"),
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                ErrorClass::RuntimeInit,
                format!("failed to initialize async runtime: {error}"),
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| (ErrorClass::DbConnectivity, error.to_string()))?;
        let report = migrate_and_verify(&pool).await;
        pool.close().await;
        report
    });

    match result {
        Ok(report) => CommandResult::success(
            COMMAND,
            summary(&config, &report),
            Some(json!({
                "database_url": config.database.url,
                "ledger_backend": config.ledger.backend.as_str(),
                "note_records": true,
                "applied_versions": report.applied_versions,
            })),
        ),
        Err((error_class, message)) => CommandResult::failure(COMMAND, error_class, message),
    }
}

async fn migrate_and_verify(pool: &DbPool) -> Result<SchemaReport, (ErrorClass, String)> {
    migrations::run_pending(pool)
        .await
        .map_err(|error| (ErrorClass::Migration, error.to_string()))?;

    let present = migrations::note_table_present(pool)
        .await
        .map_err(|error| (ErrorClass::SchemaCheck, error.to_string()))?;
    if !present {
        return Err((
            ErrorClass::SchemaCheck,
            "migrations finished but the `note_records` table is missing".to_string(),
        ));
    }

    let applied_versions = migrations::applied_versions(pool)
        .await
        .map_err(|error| (ErrorClass::SchemaCheck, error.to_string()))?;
    Ok(SchemaReport { applied_versions })
}

fn summary(config: &AppConfig, report: &SchemaReport) -> String {
    let mut message = format!(
        "`note_records` ready at `{}` ({} migration(s) applied)",
        config.database.url,
        report.applied_versions.len()
    );
    if config.ledger.backend != LedgerBackend::Sqlite {
        message.push_str(&format!(
            "; ledger backend is `{}`, so the server will not write here until it is `sqlite`",
            config.ledger.backend.as_str()
        ));
    }
    message
}
