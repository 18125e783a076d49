use std::str::FromStr;
use std::time::Duration;

use kudos_core::config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

pub async fn connect_with_config(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    // Missing database files are created so a fresh install can migrate.
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect_with(options)
        .await
}

/// Liveness check used by `/health` and `kudos doctor`.
pub async fn ping(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use kudos_core::config::{AppConfig, DatabaseConfig};

    use super::{connect_with_config, ping};
    use crate::migrations::run_pending;

    #[tokio::test]
    async fn in_memory_pool_answers_ping() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            timeout_secs: 5,
        };

        let pool = connect_with_config(&config).await.expect("connect");

        ping(&pool).await.expect("ping");
    }

    #[tokio::test]
    async fn missing_database_file_is_created_on_first_connect() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("kudos.db");
        assert!(!path.exists());
        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            ..AppConfig::default().database
        };

        let pool = connect_with_config(&config).await.expect("connect to fresh path");
        run_pending(&pool).await.expect("migrations");
        ping(&pool).await.expect("ping");
        pool.close().await;

        assert!(path.exists());
    }
}
