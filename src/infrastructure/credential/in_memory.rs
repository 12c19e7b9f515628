//! In-memory credential store
//!
//! Secrets are kept only in encrypted form, indexed by ciphertext. Usage
//! counters are atomics so that consuming quota needs only a shared read
//! lock: different credentials never wait on each other, and the
//! check-and-increment on one credential is a single compare-and-swap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    AccountId, ConsumeOutcome, CredentialRecord, CredentialSecret, CredentialStore, DomainError,
};
use crate::infrastructure::crypto::SecretCipher;

#[derive(Debug)]
struct StoredCredential {
    account_id: AccountId,
    encrypted_secret: Vec<u8>,
    quota: u64,
    quota_usage: AtomicU64,
}

#[derive(Debug, Default)]
struct Tables {
    by_account: HashMap<AccountId, Arc<StoredCredential>>,
    by_secret: HashMap<Vec<u8>, Arc<StoredCredential>>,
}

/// In-memory implementation of CredentialStore
#[derive(Debug)]
pub struct InMemoryCredentialStore {
    cipher: SecretCipher,
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store that encrypts secrets with `cipher`
    pub fn new(cipher: SecretCipher) -> Self {
        Self {
            cipher,
            tables: Arc::new(RwLock::new(Tables::default())),
        }
    }

    fn to_record(&self, stored: &StoredCredential) -> Result<CredentialRecord, DomainError> {
        let secret = self.cipher.decrypt(&stored.encrypted_secret)?;

        Ok(CredentialRecord::new(
            stored.account_id.clone(),
            CredentialSecret::new(secret),
            stored.quota,
        )
        .with_quota_usage(stored.quota_usage.load(Ordering::SeqCst)))
    }

    #[cfg(test)]
    pub(crate) async fn stored_ciphertext(&self, account_id: &AccountId) -> Option<Vec<u8>> {
        let tables = self.tables.read().await;
        tables
            .by_account
            .get(account_id)
            .map(|stored| stored.encrypted_secret.clone())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_secret(
        &self,
        secret: &CredentialSecret,
    ) -> Result<Option<CredentialRecord>, DomainError> {
        let encrypted = self.cipher.encrypt(secret.expose())?;
        let tables = self.tables.read().await;

        tables
            .by_secret
            .get(&encrypted)
            .map(|stored| self.to_record(stored))
            .transpose()
    }

    async fn find_by_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<CredentialRecord>, DomainError> {
        let tables = self.tables.read().await;

        tables
            .by_account
            .get(account_id)
            .map(|stored| self.to_record(stored))
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<CredentialRecord>, DomainError> {
        let tables = self.tables.read().await;

        let mut records = tables
            .by_account
            .values()
            .map(|stored| self.to_record(stored))
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by(|a, b| a.account_id().cmp(b.account_id()));

        Ok(records)
    }

    async fn insert(
        &self,
        account_id: &AccountId,
        secret: &CredentialSecret,
        quota: u64,
    ) -> Result<(), DomainError> {
        let encrypted = self.cipher.encrypt(secret.expose())?;
        let mut tables = self.tables.write().await;

        if tables.by_account.contains_key(account_id) {
            return Err(DomainError::duplicate_account(account_id.as_str()));
        }

        if tables.by_secret.contains_key(&encrypted) {
            return Err(DomainError::internal("generated secret collides with an existing one"));
        }

        let stored = Arc::new(StoredCredential {
            account_id: account_id.clone(),
            encrypted_secret: encrypted.clone(),
            quota,
            quota_usage: AtomicU64::new(0),
        });

        tables.by_account.insert(account_id.clone(), stored.clone());
        tables.by_secret.insert(encrypted, stored);

        Ok(())
    }

    async fn delete(&self, account_id: &AccountId) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;

        match tables.by_account.remove(account_id) {
            Some(stored) => {
                tables.by_secret.remove(&stored.encrypted_secret);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn increment_usage(&self, secret: &CredentialSecret) -> Result<(), DomainError> {
        let encrypted = self.cipher.encrypt(secret.expose())?;
        let tables = self.tables.read().await;

        let stored = tables
            .by_secret
            .get(&encrypted)
            .ok_or_else(|| DomainError::not_found("No credential matches the presented secret"))?;
        stored.quota_usage.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    async fn try_consume(&self, secret: &CredentialSecret) -> Result<ConsumeOutcome, DomainError> {
        let encrypted = self.cipher.encrypt(secret.expose())?;
        let tables = self.tables.read().await;

        let Some(stored) = tables.by_secret.get(&encrypted) else {
            return Ok(ConsumeOutcome::Unknown);
        };

        if stored.quota == 0 {
            return Ok(ConsumeOutcome::Unlimited);
        }

        let outcome = stored
            .quota_usage
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |usage| {
                (usage < stored.quota).then_some(usage + 1)
            });

        Ok(match outcome {
            Ok(previous) => ConsumeOutcome::Admitted {
                usage: previous + 1,
            },
            Err(current) => ConsumeOutcome::Exhausted { usage: current },
        })
    }

    async fn reset_all_usage(&self) -> Result<u64, DomainError> {
        let tables = self.tables.read().await;

        let mut changed = 0u64;
        for stored in tables.by_account.values() {
            if stored.quota_usage.swap(0, Ordering::SeqCst) != 0 {
                changed += 1;
            }
        }

        Ok(changed)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncryptionConfig;

    fn store() -> InMemoryCredentialStore {
        InMemoryCredentialStore::new(SecretCipher::new(&EncryptionConfig::new("test-key")).unwrap())
    }

    fn account(id: &str) -> AccountId {
        AccountId::new(id).unwrap()
    }

    fn secret(value: &str) -> CredentialSecret {
        CredentialSecret::new(value)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = store();
        store.insert(&account("acme"), &secret("s3cret"), 10).await.unwrap();

        let by_secret = store.find_by_secret(&secret("s3cret")).await.unwrap().unwrap();
        assert_eq!(by_secret.account_id().as_str(), "acme");
        assert_eq!(by_secret.quota(), 10);
        assert_eq!(by_secret.quota_usage(), 0);

        let by_account = store.find_by_account(&account("acme")).await.unwrap().unwrap();
        assert_eq!(by_account.secret().expose(), "s3cret");
    }

    #[tokio::test]
    async fn test_find_missing() {
        let store = store();

        assert!(store.find_by_secret(&secret("nope")).await.unwrap().is_none());
        assert!(store.find_by_account(&account("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_secret_is_encrypted_at_rest() {
        let store = store();
        store.insert(&account("acme"), &secret("plaintext-secret"), 0).await.unwrap();

        let stored = store.stored_ciphertext(&account("acme")).await.unwrap();
        assert_ne!(stored, b"plaintext-secret".to_vec());
        assert!(!stored.windows(16).any(|w| w == b"plaintext-secret"));
    }

    #[tokio::test]
    async fn test_lookup_under_different_key_fails() {
        let cipher = SecretCipher::new(&EncryptionConfig::new("key-one")).unwrap();
        let other = SecretCipher::new(&EncryptionConfig::new("key-two")).unwrap();
        let store = InMemoryCredentialStore::new(cipher);
        store.insert(&account("acme"), &secret("s3cret"), 0).await.unwrap();

        // A presented secret encrypted under another key never matches
        let foreign = other.encrypt("s3cret").unwrap();
        let tables = store.tables.read().await;
        assert!(!tables.by_secret.contains_key(&foreign));
    }

    #[tokio::test]
    async fn test_duplicate_account_rejected() {
        let store = store();
        store.insert(&account("acme"), &secret("first"), 1).await.unwrap();

        let err = store
            .insert(&account("acme"), &secret("second"), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateAccount { .. }));

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].secret().expose(), "first");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = store();
        store.insert(&account("acme"), &secret("s3cret"), 1).await.unwrap();

        assert!(store.delete(&account("acme")).await.unwrap());
        assert!(!store.delete(&account("acme")).await.unwrap());
        assert!(store.find_by_secret(&secret("s3cret")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all_sorted_and_decrypted() {
        let store = store();
        store.insert(&account("zeta"), &secret("z"), 1).await.unwrap();
        store.insert(&account("alpha"), &secret("a"), 2).await.unwrap();

        let all = store.list_all().await.unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.account_id().as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
        assert_eq!(all[0].secret().expose(), "a");
    }

    #[tokio::test]
    async fn test_increment_usage() {
        let store = store();
        store.insert(&account("acme"), &secret("s3cret"), 1).await.unwrap();

        store.increment_usage(&secret("s3cret")).await.unwrap();
        store.increment_usage(&secret("s3cret")).await.unwrap();

        let record = store.find_by_account(&account("acme")).await.unwrap().unwrap();
        assert_eq!(record.quota_usage(), 2);

        let err = store.increment_usage(&secret("missing")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_try_consume_until_exhausted() {
        let store = store();
        store.insert(&account("acme"), &secret("s3cret"), 2).await.unwrap();

        assert_eq!(
            store.try_consume(&secret("s3cret")).await.unwrap(),
            ConsumeOutcome::Admitted { usage: 1 }
        );
        assert_eq!(
            store.try_consume(&secret("s3cret")).await.unwrap(),
            ConsumeOutcome::Admitted { usage: 2 }
        );
        assert_eq!(
            store.try_consume(&secret("s3cret")).await.unwrap(),
            ConsumeOutcome::Exhausted { usage: 2 }
        );
    }

    #[tokio::test]
    async fn test_try_consume_unlimited_and_unknown() {
        let store = store();
        store.insert(&account("acme"), &secret("s3cret"), 0).await.unwrap();

        assert_eq!(
            store.try_consume(&secret("s3cret")).await.unwrap(),
            ConsumeOutcome::Unlimited
        );
        assert_eq!(
            store.try_consume(&secret("other")).await.unwrap(),
            ConsumeOutcome::Unknown
        );

        let record = store.find_by_account(&account("acme")).await.unwrap().unwrap();
        assert_eq!(record.quota_usage(), 0);
    }

    #[tokio::test]
    async fn test_reset_all_usage() {
        let store = store();
        store.insert(&account("a"), &secret("sa"), 5).await.unwrap();
        store.insert(&account("b"), &secret("sb"), 5).await.unwrap();
        store.insert(&account("c"), &secret("sc"), 5).await.unwrap();
        store.try_consume(&secret("sa")).await.unwrap();
        store.try_consume(&secret("sb")).await.unwrap();
        store.try_consume(&secret("sb")).await.unwrap();

        assert_eq!(store.reset_all_usage().await.unwrap(), 2);

        for record in store.list_all().await.unwrap() {
            assert_eq!(record.quota_usage(), 0);
        }
    }
}
