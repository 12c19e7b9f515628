//! Credential entity and related types

use serde::{Deserialize, Serialize};

use super::validation::{validate_account_id, AccountIdValidationError};

/// Account identifier - one live credential per account
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Create a new AccountId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, AccountIdValidationError> {
        let id = id.into();
        validate_account_id(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = AccountIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Plaintext bearer secret.
///
/// `Debug` and `Display` never print the value; use [`CredentialSecret::expose`]
/// at the few places that must hand it to a cipher or back to the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSecret(String);

const SECRET_HINT_LEN: usize = 4;

impl CredentialSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Leading characters followed by an ellipsis, safe for admin listings
    pub fn hint(&self) -> String {
        let head: String = self.0.chars().take(SECRET_HINT_LEN).collect();
        format!("{}…", head)
    }
}

impl std::fmt::Debug for CredentialSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialSecret([REDACTED])")
    }
}

impl std::fmt::Display for CredentialSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// A stored credential with its secret already decrypted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    account_id: AccountId,
    secret: CredentialSecret,
    quota: u64,
    quota_usage: u64,
}

impl CredentialRecord {
    pub fn new(account_id: AccountId, secret: CredentialSecret, quota: u64) -> Self {
        Self {
            account_id,
            secret,
            quota,
            quota_usage: 0,
        }
    }

    pub fn with_quota_usage(mut self, quota_usage: u64) -> Self {
        self.quota_usage = quota_usage;
        self
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn secret(&self) -> &CredentialSecret {
        &self.secret
    }

    pub fn quota(&self) -> u64 {
        self.quota
    }

    pub fn quota_usage(&self) -> u64 {
        self.quota_usage
    }

    /// A quota of zero disables usage accounting
    pub fn is_unlimited(&self) -> bool {
        self.quota == 0
    }

    /// Whether another request fits in the current period
    pub fn has_remaining(&self) -> bool {
        self.is_unlimited() || self.quota_usage < self.quota
    }
}

/// Result of issuing a credential. The only value that ever carries the
/// plaintext secret out of the lifecycle service.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub account_id: AccountId,
    pub secret: CredentialSecret,
    pub quota: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(quota: u64, usage: u64) -> CredentialRecord {
        CredentialRecord::new(
            AccountId::new("acme").unwrap(),
            CredentialSecret::new("0123456789abcdef0123456789abcdef"),
            quota,
        )
        .with_quota_usage(usage)
    }

    #[test]
    fn test_account_id_rejects_invalid() {
        assert!(AccountId::new("").is_err());
        assert_eq!(AccountId::new("acme").unwrap().as_str(), "acme");
    }

    #[test]
    fn test_account_id_deserialize_validates() {
        let ok: Result<AccountId, _> = serde_json::from_str("\"acme\"");
        assert!(ok.is_ok());

        let bad: Result<AccountId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_secret_is_redacted() {
        let secret = CredentialSecret::new("supersecretvalue");
        assert_eq!(format!("{:?}", secret), "CredentialSecret([REDACTED])");
        assert_eq!(secret.to_string(), "[REDACTED]");
        assert!(!format!("{:?}", record(1, 0)).contains("0123456789abcdef"));
    }

    #[test]
    fn test_secret_hint() {
        let secret = CredentialSecret::new("abcdef123456");
        assert_eq!(secret.hint(), "abcd…");
        assert_eq!(CredentialSecret::new("ab").hint(), "ab…");
    }

    #[test]
    fn test_unlimited_quota() {
        let unlimited = record(0, 1_000);
        assert!(unlimited.is_unlimited());
        assert!(unlimited.has_remaining());
    }

    #[test]
    fn test_has_remaining() {
        assert!(record(10, 9).has_remaining());
        assert!(!record(10, 10).has_remaining());
        assert!(!record(10, 11).has_remaining());
    }
}
