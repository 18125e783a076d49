use std::sync::Arc;

use kudos_core::config::{AppConfig, ConfigError, LedgerBackend, LoadOptions};
use kudos_core::ports::Ledger;
use kudos_core::resolve::UserResolver;
use kudos_core::CallPolicy;
use kudos_db::{connect_with_config, migrations, SqlNoteLedger};
use kudos_slack::api::SlackWebClient;
use kudos_slack::commands::CommandRouter;
use thiserror::Error;
use tracing::info;

use crate::health::LedgerHealth;
use crate::sheets::{SheetsLedger, SheetsSetupError};

pub struct Application {
    pub config: AppConfig,
    pub router: Arc<CommandRouter>,
    pub ledger_health: LedgerHealth,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("sheets ledger setup failed: {0}")]
    Sheets(#[from] SheetsSetupError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        ledger_backend = config.ledger.backend.as_str(),
        "starting application bootstrap"
    );

    let policy = CallPolicy::from(&config.collaborators);
    let slack = Arc::new(SlackWebClient::from_config(&config.slack));
    let (ledger, ledger_health) = build_ledger(&config).await?;

    let resolver = UserResolver::new(slack.clone())
        .with_policy(policy.clone())
        .with_min_score(config.resolver.min_score);
    let router = CommandRouter::new(resolver, slack, ledger)
        .with_policy(policy)
        .with_praise_channel(config.slack.praise_channel.clone())
        .with_history_limit(config.slack.history_limit);

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        ledger_backend = router.ledger_backend().unwrap_or("none"),
        praise_channel = %config.slack.praise_channel,
        "command router assembled"
    );

    Ok(Application { config, router: Arc::new(router), ledger_health })
}

async fn build_ledger(
    config: &AppConfig,
) -> Result<(Option<Arc<dyn Ledger>>, LedgerHealth), BootstrapError> {
    match config.ledger.backend {
        LedgerBackend::None => Ok((None, LedgerHealth::Disabled)),
        LedgerBackend::Sqlite => {
            let pool = connect_with_config(&config.database)
                .await
                .map_err(BootstrapError::DatabaseConnect)?;
            info!(
                event_name = "system.bootstrap.database_connected",
                correlation_id = "bootstrap",
                "database connection established"
            );

            migrations::run_pending(&pool).await.map_err(BootstrapError::Migration)?;
            info!(
                event_name = "system.bootstrap.migrations_applied",
                correlation_id = "bootstrap",
                "database migrations applied"
            );

            let ledger: Arc<dyn Ledger> = Arc::new(SqlNoteLedger::new(pool.clone()));
            Ok((Some(ledger), LedgerHealth::Sqlite(pool)))
        }
        LedgerBackend::Sheets => {
            let ledger: Arc<dyn Ledger> = Arc::new(SheetsLedger::from_config(&config.ledger)?);
            Ok((Some(ledger), LedgerHealth::Remote("sheets")))
        }
    }
}

#[cfg(test)]
mod tests {
    use kudos_core::config::{ConfigOverrides, LedgerBackend, LoadOptions};

    use crate::bootstrap::{bootstrap, BootstrapError};
    use crate::health::LedgerHealth;

    fn options(backend: LedgerBackend, bot_token: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                slack_bot_token: Some(bot_token.to_string()),
                ledger_backend: Some(backend),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_without_ledger_still_builds_router() {
        let app = bootstrap(options(LedgerBackend::None, "xoxb-test"))
            .await
            .expect("bootstrap should succeed without a ledger");

        assert_eq!(app.router.ledger_backend(), None);
        assert!(matches!(app.ledger_health, LedgerHealth::Disabled));
    }

    #[tokio::test]
    async fn sqlite_ledger_is_migrated_during_bootstrap() {
        let app = bootstrap(options(LedgerBackend::Sqlite, "xoxb-test"))
            .await
            .expect("bootstrap should succeed with in-memory sqlite");

        assert_eq!(app.router.ledger_backend(), Some("sqlite"));
        let LedgerHealth::Sqlite(pool) = &app.ledger_health else {
            panic!("sqlite backend should expose its pool for health checks");
        };
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'note_records'",
        )
        .fetch_one(pool)
        .await
        .expect("schema query");
        assert_eq!(count, 1);

        pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_app_level_token() {
        let result = bootstrap(options(LedgerBackend::None, "xapp-1-abc")).await;

        let Err(BootstrapError::Config(error)) = result else {
            panic!("expected a config error");
        };
        assert!(error.to_string().contains("slack.bot_token"));
    }
}
