//! Account identifier validation

use thiserror::Error;

use crate::domain::DomainError;

/// Errors that can occur during account ID validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccountIdValidationError {
    #[error("Account ID cannot be empty")]
    Empty,

    #[error("Account ID exceeds maximum length of {0} characters")]
    TooLong(usize),

    #[error("Account ID cannot start or end with whitespace")]
    SurroundingWhitespace,

    #[error("Account ID contains a control character")]
    ControlCharacter,
}

impl From<AccountIdValidationError> for DomainError {
    fn from(err: AccountIdValidationError) -> Self {
        DomainError::validation(err.to_string())
    }
}

pub const MAX_ACCOUNT_ID_LENGTH: usize = 255;

/// Validate an account ID
///
/// Rules:
/// - Cannot be empty or whitespace only
/// - Maximum 255 characters
/// - No leading or trailing whitespace
/// - No control characters
pub fn validate_account_id(id: &str) -> Result<(), AccountIdValidationError> {
    if id.trim().is_empty() {
        return Err(AccountIdValidationError::Empty);
    }

    if id.chars().count() > MAX_ACCOUNT_ID_LENGTH {
        return Err(AccountIdValidationError::TooLong(MAX_ACCOUNT_ID_LENGTH));
    }

    if id.trim() != id {
        return Err(AccountIdValidationError::SurroundingWhitespace);
    }

    if id.chars().any(char::is_control) {
        return Err(AccountIdValidationError::ControlCharacter);
    }

    Ok(())
}
