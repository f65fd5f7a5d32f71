use crm_core::config::AppConfig;
use crm_db::{connect_with_config, migrations, DbPool};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        max_connections = config.database.max_connections,
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    Ok(Application { config, db_pool })
}

#[cfg(test)]
mod tests {
    use crm_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use crm_core::domain::customer::Customer;
    use crm_db::{CustomerRepository, SqlCustomerRepository};

    use crate::bootstrap::{bootstrap, BootstrapError};

    fn config(database_url: &str) -> AppConfig {
        AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                database_max_connections: Some(1),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("config should load")
    }

    #[tokio::test]
    async fn bootstrap_reports_unreachable_database() {
        let result = bootstrap(config("sqlite://missing-dir/for/crm/tests.db")).await;

        let Err(error) = result else {
            panic!("bootstrap should fail when the database file cannot be opened");
        };
        assert!(matches!(error, BootstrapError::DatabaseConnect(_)));
        assert!(error.to_string().starts_with("database connection failed"));
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_exposes_customer_store() {
        let app = bootstrap(config("sqlite::memory:"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'customer'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected customer table to be available after bootstrap");
        assert_eq!(table_count, 1, "bootstrap should create the customer table");

        let repo = SqlCustomerRepository::new(app.db_pool.clone());
        repo.save(Customer::new("Soliman", "Ortega", None)).await.expect("save");
        let matches = repo.find_by_name_contains("Ortega").await.expect("search");
        assert_eq!(matches, vec![Customer::new("Soliman", "Ortega", None)]);

        app.db_pool.close().await;
    }
}
