//! Credential domain
//!
//! Types and traits for the encrypted credential records that back quota
//! authorization: account identifiers, bearer secrets, and the store seam.

mod entity;
mod repository;
mod validation;

pub use entity::{AccountId, CredentialRecord, CredentialSecret, IssuedCredential};
pub use repository::{ConsumeOutcome, CredentialStore};
pub use validation::{validate_account_id, AccountIdValidationError, MAX_ACCOUNT_ID_LENGTH};

#[cfg(test)]
pub use repository::MockCredentialStore;
