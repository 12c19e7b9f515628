//! PostgreSQL credential store
//!
//! Secrets are encrypted in-process and stored as `BYTEA`; lookups bind the
//! ciphertext of the presented secret, so plaintext never reaches the
//! database. Account uniqueness is the table's primary key, and quota
//! consumption is one conditional `UPDATE`.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::{
    AccountId, ConsumeOutcome, CredentialRecord, CredentialSecret, CredentialStore, DomainError,
};
use crate::infrastructure::crypto::SecretCipher;
use crate::infrastructure::storage::map_sqlx_error;

const ACCOUNT_KEY_CONSTRAINT: &str = "credentials_pkey";

/// PostgreSQL implementation of CredentialStore
pub struct PostgresCredentialStore {
    pool: PgPool,
    cipher: SecretCipher,
}

impl std::fmt::Debug for PostgresCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresCredentialStore")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool, cipher: SecretCipher) -> Self {
        Self { pool, cipher }
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn to_record(&self, row: &PgRow) -> Result<CredentialRecord, DomainError> {
        let account_id: String = row.get("account_id");
        let encrypted: Vec<u8> = row.get("secret");
        let quota: i64 = row.get("quota");
        let quota_usage: i64 = row.get("quota_usage");

        let account_id = AccountId::new(account_id)
            .map_err(|e| DomainError::internal(format!("Stored account ID is invalid: {}", e)))?;
        let secret = self.cipher.decrypt(&encrypted)?;

        Ok(CredentialRecord::new(
            account_id,
            CredentialSecret::new(secret),
            to_count(quota, "quota")?,
        )
        .with_quota_usage(to_count(quota_usage, "quota_usage")?))
    }
}

fn to_count(value: i64, column: &str) -> Result<u64, DomainError> {
    u64::try_from(value)
        .map_err(|_| DomainError::internal(format!("Column '{}' holds negative value {}", column, value)))
}

fn is_account_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(ACCOUNT_KEY_CONSTRAINT)
        }
        _ => false,
    }
}

fn to_column(value: u64) -> Result<i64, DomainError> {
    i64::try_from(value)
        .map_err(|_| DomainError::validation(format!("Quota {} exceeds the supported range", value)))
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_secret(
        &self,
        secret: &CredentialSecret,
    ) -> Result<Option<CredentialRecord>, DomainError> {
        let encrypted = self.cipher.encrypt(secret.expose())?;

        let row = sqlx::query(
            "SELECT account_id, secret, quota, quota_usage FROM credentials WHERE secret = $1",
        )
        .bind(&encrypted)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find credential by secret", e))?;

        row.as_ref().map(|row| self.to_record(row)).transpose()
    }

    async fn find_by_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<CredentialRecord>, DomainError> {
        let row = sqlx::query(
            "SELECT account_id, secret, quota, quota_usage FROM credentials WHERE account_id = $1",
        )
        .bind(account_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find credential by account", e))?;

        row.as_ref().map(|row| self.to_record(row)).transpose()
    }

    async fn list_all(&self) -> Result<Vec<CredentialRecord>, DomainError> {
        let rows = sqlx::query(
            "SELECT account_id, secret, quota, quota_usage FROM credentials ORDER BY account_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to list credentials", e))?;

        rows.iter().map(|row| self.to_record(row)).collect()
    }

    async fn insert(
        &self,
        account_id: &AccountId,
        secret: &CredentialSecret,
        quota: u64,
    ) -> Result<(), DomainError> {
        let encrypted = self.cipher.encrypt(secret.expose())?;

        sqlx::query(
            r#"
            INSERT INTO credentials (account_id, secret, quota, quota_usage)
            VALUES ($1, $2, $3, 0)
            "#,
        )
        .bind(account_id.as_str())
        .bind(&encrypted)
        .bind(to_column(quota)?)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_account_key_violation(&e) {
                DomainError::duplicate_account(account_id.as_str())
            } else {
                map_sqlx_error("Failed to insert credential", e)
            }
        })?;

        Ok(())
    }

    async fn delete(&self, account_id: &AccountId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM credentials WHERE account_id = $1")
            .bind(account_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete credential", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_usage(&self, secret: &CredentialSecret) -> Result<(), DomainError> {
        let encrypted = self.cipher.encrypt(secret.expose())?;

        let result = sqlx::query(
            r#"
            UPDATE credentials
            SET quota_usage = quota_usage + 1, updated_at = NOW()
            WHERE secret = $1
            "#,
        )
        .bind(&encrypted)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to increment usage", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(
                "No credential matches the presented secret",
            ));
        }

        Ok(())
    }

    async fn try_consume(&self, secret: &CredentialSecret) -> Result<ConsumeOutcome, DomainError> {
        let encrypted = self.cipher.encrypt(secret.expose())?;

        // Keyed on the secret so a revoked secret never reaches a recreated
        // account. The row lock serialises consumers and resets; the
        // predicate re-checks the quota after any wait.
        let admitted: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE credentials
            SET quota_usage = quota_usage + 1, updated_at = NOW()
            WHERE secret = $1 AND quota <> 0 AND quota_usage < quota
            RETURNING quota_usage
            "#,
        )
        .bind(&encrypted)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to increment usage", e))?;

        if let Some(usage) = admitted {
            return Ok(ConsumeOutcome::Admitted {
                usage: to_count(usage, "quota_usage")?,
            });
        }

        let row = sqlx::query("SELECT quota, quota_usage FROM credentials WHERE secret = $1")
            .bind(&encrypted)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to read usage", e))?;

        let Some(row) = row else {
            return Ok(ConsumeOutcome::Unknown);
        };

        let quota: i64 = row.get("quota");
        let quota_usage: i64 = row.get("quota_usage");

        if quota == 0 {
            return Ok(ConsumeOutcome::Unlimited);
        }

        Ok(ConsumeOutcome::Exhausted {
            usage: to_count(quota_usage, "quota_usage")?,
        })
    }

    async fn reset_all_usage(&self) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE credentials SET quota_usage = 0, updated_at = NOW() WHERE quota_usage <> 0",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to reset usage", e))?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to ping database", e))?;

        Ok(())
    }
}
