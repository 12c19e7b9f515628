//! Database migrations infrastructure

use sqlx::postgres::PgPool;
use tracing::info;

use super::postgres::map_sqlx_error;
use crate::domain::DomainError;

/// Applies versioned schema migrations, recording them in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the migrations table if it doesn't exist
    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to create migrations table", e))?;

        Ok(())
    }

    /// Runs a single migration inside a transaction, skipping it if applied
    pub async fn run_migration(&self, migration: &Migration) -> Result<(), DomainError> {
        self.ensure_migrations_table().await?;

        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
                .bind(migration.version)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("Failed to check migration status", e))?;

        if applied {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("Failed to begin migration", e))?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                map_sqlx_error(&format!("Failed to run migration {}", migration.version), e)
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                map_sqlx_error(
                    &format!("Failed to record migration {}", migration.version),
                    e,
                )
            })?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit migration", e))?;

        info!(
            version = migration.version,
            description = migration.description,
            "Applied migration"
        );

        Ok(())
    }

    /// Returns the latest applied migration version
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get migration version", e))?;

        Ok(version)
    }
}

/// Represents a database migration
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Migration version, strictly increasing
    pub version: i64,
    /// Human-readable description
    pub description: &'static str,
    /// SQL to run when applying the migration
    pub up: &'static str,
}

/// Schema of the credential store
pub fn credential_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Create credentials table",
            up: r#"
            CREATE TABLE IF NOT EXISTS credentials (
                account_id VARCHAR(255) NOT NULL,
                secret BYTEA NOT NULL,
                quota BIGINT NOT NULL,
                quota_usage BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT credentials_pkey PRIMARY KEY (account_id),
                CONSTRAINT credentials_secret_key UNIQUE (secret),
                CONSTRAINT credentials_quota_check CHECK (quota >= 0),
                CONSTRAINT credentials_quota_usage_check CHECK (quota_usage >= 0)
            );
            "#,
        },
        Migration {
            version: 2,
            description: "Index credentials with outstanding usage",
            up: r#"
            CREATE INDEX IF NOT EXISTS idx_credentials_quota_usage
                ON credentials (account_id) WHERE quota_usage <> 0;
            "#,
        },
    ]
}

/// Runs all pending credential store migrations
pub async fn run_credential_migrations(pool: &PgPool) -> Result<Option<i64>, DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());

    for migration in credential_migrations() {
        migrator.run_migration(&migration).await?;
    }

    migrator.current_version().await
}
