//! Storage factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use super::migrations::run_credential_migrations;
use super::postgres::connect_pool;
use crate::config::{AppConfig, StorageBackend};
use crate::domain::{CredentialStore, DomainError};
use crate::infrastructure::credential::{InMemoryCredentialStore, PostgresCredentialStore};
use crate::infrastructure::crypto::SecretCipher;

/// Creates the configured credential store.
///
/// For PostgreSQL this connects, verifies reachability and applies pending
/// migrations, so a returned store is ready to serve requests.
pub async fn create_credential_store(
    config: &AppConfig,
) -> Result<Arc<dyn CredentialStore>, DomainError> {
    let cipher = SecretCipher::new(&config.encryption)?;

    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory credential store");
            Ok(Arc::new(InMemoryCredentialStore::new(cipher)))
        }
        StorageBackend::Postgres => {
            let pool = connect_pool(&config.database).await?;
            let store = PostgresCredentialStore::new(pool, cipher);
            store.ping().await?;

            let version = run_credential_migrations(store.pool()).await?;
            info!(
                schema_version = version.unwrap_or_default(),
                "Using PostgreSQL credential store"
            );

            Ok(Arc::new(store))
        }
    }
}
