//! Credential store trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::{AccountId, CredentialRecord, CredentialSecret};
use crate::domain::DomainError;

/// Outcome of an atomic check-and-increment against one credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Usage was below quota and has been incremented to `usage`
    Admitted { usage: u64 },
    /// Quota is zero; usage was not touched
    Unlimited,
    /// Usage already reached quota; nothing was written
    Exhausted { usage: u64 },
    /// No credential matches the presented secret
    Unknown,
}

/// Persistent, encrypted-at-rest storage of credential records.
///
/// Implementations hold the process-wide cipher and never persist the
/// plaintext secret. Lookups by secret compare ciphertexts.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the credential whose encrypted secret matches the presented one
    async fn find_by_secret(
        &self,
        secret: &CredentialSecret,
    ) -> Result<Option<CredentialRecord>, DomainError>;

    /// Find the credential belonging to an account
    async fn find_by_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<CredentialRecord>, DomainError>;

    /// List every credential, secrets decrypted
    async fn list_all(&self) -> Result<Vec<CredentialRecord>, DomainError>;

    /// Insert a new credential with zero usage.
    ///
    /// Fails with `DomainError::DuplicateAccount` when the account already
    /// has a credential; the check and the write are one atomic step.
    async fn insert(
        &self,
        account_id: &AccountId,
        secret: &CredentialSecret,
        quota: u64,
    ) -> Result<(), DomainError>;

    /// Delete the credential of an account. Returns whether a row existed.
    async fn delete(&self, account_id: &AccountId) -> Result<bool, DomainError>;

    /// Unconditionally add one to the usage of the matching credential
    async fn increment_usage(&self, secret: &CredentialSecret) -> Result<(), DomainError>;

    /// Increment usage only if it is still below quota, as one atomic step
    async fn try_consume(&self, secret: &CredentialSecret) -> Result<ConsumeOutcome, DomainError>;

    /// Zero the usage counter of every credential. Returns rows changed.
    async fn reset_all_usage(&self) -> Result<u64, DomainError>;

    /// Reachability probe
    async fn ping(&self) -> Result<(), DomainError>;
}
