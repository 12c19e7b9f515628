//! Bearer secret generation
//!
//! Secrets are 128 bits from the thread-local CSPRNG, rendered as lowercase
//! hex without separators.

use rand::RngCore;

use crate::domain::CredentialSecret;

const DEFAULT_SECRET_BYTES: usize = 16;

/// Generator for unguessable bearer secrets
#[derive(Debug, Clone)]
pub struct SecretGenerator {
    /// Number of random bytes per secret
    secret_bytes: usize,
}

impl SecretGenerator {
    pub fn new() -> Self {
        Self {
            secret_bytes: DEFAULT_SECRET_BYTES,
        }
    }

    /// Set the number of random bytes
    pub fn with_secret_bytes(mut self, bytes: usize) -> Self {
        self.secret_bytes = bytes;
        self
    }

    /// Generate a new secret
    pub fn generate(&self) -> CredentialSecret {
        let mut random_bytes = vec![0u8; self.secret_bytes];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        CredentialSecret::new(hex::encode(random_bytes))
    }
}

impl Default for SecretGenerator {
    fn default() -> Self {
        Self::new()
    }
}
