//! Domain layer - Core business logic and entities

pub mod credential;
pub mod error;
pub mod quota;

pub use credential::{
    AccountId, AccountIdValidationError, ConsumeOutcome, CredentialRecord, CredentialSecret,
    CredentialStore, IssuedCredential,
};
pub use error::DomainError;
pub use quota::AuthorizationVerdict;

#[cfg(test)]
pub use credential::MockCredentialStore;
