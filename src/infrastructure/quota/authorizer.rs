//! Quota authorization
//!
//! Maps a presented secret to a verdict. The check-and-increment is
//! delegated to [`CredentialStore::try_consume`], which the stores
//! implement atomically per credential.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{AuthorizationVerdict, ConsumeOutcome, CredentialSecret, CredentialStore, DomainError};
use crate::infrastructure::observability::record_authorization;

/// Hot-path decision function over the credential store
pub struct QuotaAuthorizer {
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for QuotaAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaAuthorizer").finish_non_exhaustive()
    }
}

impl QuotaAuthorizer {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Decide whether `secret` may proceed, recording one unit of usage when it may.
    ///
    /// An unreachable store or a failed write is an error; a secret the
    /// store cannot match or decrypt is `Unauthorized`.
    pub async fn authorize(
        &self,
        secret: &CredentialSecret,
    ) -> Result<AuthorizationVerdict, DomainError> {
        if secret.expose().is_empty() {
            record_authorization(AuthorizationVerdict::Unauthorized);
            return Ok(AuthorizationVerdict::Unauthorized);
        }

        let outcome = match self.store.try_consume(secret).await {
            Ok(outcome) => outcome,
            Err(e @ (DomainError::StoreUnavailable { .. } | DomainError::Internal { .. })) => {
                warn!(error = %e, "Authorization failed");
                return Err(e);
            }
            Err(e) => {
                warn!(error = %e, "Credential lookup failed, treating as unauthorized");
                ConsumeOutcome::Unknown
            }
        };

        let verdict = AuthorizationVerdict::from(outcome);

        match outcome {
            ConsumeOutcome::Admitted { usage } => {
                debug!(verdict = %verdict, quota_usage = usage, "Authorization decided");
            }
            ConsumeOutcome::Exhausted { usage } => {
                debug!(verdict = %verdict, quota_usage = usage, "Quota exhausted");
            }
            ConsumeOutcome::Unlimited | ConsumeOutcome::Unknown => {
                debug!(verdict = %verdict, "Authorization decided");
            }
        }

        record_authorization(verdict);

        Ok(verdict)
    }
}
