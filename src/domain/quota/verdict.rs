//! Authorization verdicts

use serde::Serialize;

use crate::domain::credential::ConsumeOutcome;

/// Decision returned for a presented secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationVerdict {
    /// Known secret with quota left (or unlimited); usage was recorded
    Authorized,
    /// Known secret whose quota for the current period is used up
    QuotaExceeded,
    /// No credential matches the presented secret
    Unauthorized,
}

impl AuthorizationVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authorized => "authorized",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Unauthorized => "unauthorized",
        }
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }
}

impl From<ConsumeOutcome> for AuthorizationVerdict {
    fn from(outcome: ConsumeOutcome) -> Self {
        match outcome {
            ConsumeOutcome::Admitted { .. } | ConsumeOutcome::Unlimited => Self::Authorized,
            ConsumeOutcome::Exhausted { .. } => Self::QuotaExceeded,
            ConsumeOutcome::Unknown => Self::Unauthorized,
        }
    }
}

impl std::fmt::Display for AuthorizationVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_from_outcome() {
        assert_eq!(
            AuthorizationVerdict::from(ConsumeOutcome::Admitted { usage: 3 }),
            AuthorizationVerdict::Authorized
        );
        assert_eq!(
            AuthorizationVerdict::from(ConsumeOutcome::Unlimited),
            AuthorizationVerdict::Authorized
        );
        assert_eq!(
            AuthorizationVerdict::from(ConsumeOutcome::Exhausted { usage: 10 }),
            AuthorizationVerdict::QuotaExceeded
        );
        assert_eq!(
            AuthorizationVerdict::from(ConsumeOutcome::Unknown),
            AuthorizationVerdict::Unauthorized
        );
    }

    #[test]
    fn test_verdict_serialization() {
        assert_eq!(
            serde_json::to_string(&AuthorizationVerdict::QuotaExceeded).unwrap(),
            "\"quota_exceeded\""
        );
        assert_eq!(AuthorizationVerdict::Authorized.to_string(), "authorized");
    }
}
