//! Credential lifecycle service
//!
//! Administrative create/read/delete over the credential store. The
//! plaintext secret leaves this service exactly once, in the result of
//! [`CredentialService::create`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{AccountId, CredentialRecord, CredentialStore, DomainError, IssuedCredential};

use super::generator::SecretGenerator;

/// Credential service for managing per-account credentials
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    generator: SecretGenerator,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

impl CredentialService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            generator: SecretGenerator::new(),
        }
    }

    /// Create with a custom generator
    pub fn with_generator(mut self, generator: SecretGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Issue a new credential for `account_id`.
    ///
    /// Uniqueness is decided by the store's insert, so two concurrent
    /// creates for one account yield exactly one record and one
    /// `DuplicateAccount` error.
    pub async fn create(
        &self,
        account_id: AccountId,
        quota: u64,
    ) -> Result<IssuedCredential, DomainError> {
        let secret = self.generator.generate();

        self.store.insert(&account_id, &secret, quota).await?;

        info!(account_id = %account_id, quota, "Credential created");

        Ok(IssuedCredential {
            account_id,
            secret,
            quota,
        })
    }

    /// Get the credential for an account
    pub async fn get(&self, account_id: &AccountId) -> Result<CredentialRecord, DomainError> {
        self.store
            .find_by_account(account_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Credential '{}' not found", account_id)))
    }

    /// List all credentials ordered by account
    pub async fn list(&self) -> Result<Vec<CredentialRecord>, DomainError> {
        self.store.list_all().await
    }

    /// Delete the credential for an account; deleting a missing account succeeds
    pub async fn delete(&self, account_id: &AccountId) -> Result<(), DomainError> {
        if self.store.delete(account_id).await? {
            info!(account_id = %account_id, "Credential deleted");
        } else {
            debug!(account_id = %account_id, "No credential to delete");
        }

        Ok(())
    }

    /// Probe store reachability
    pub async fn check_health(&self) -> Result<(), DomainError> {
        self.store.ping().await
    }
}
