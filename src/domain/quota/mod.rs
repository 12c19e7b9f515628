//! Quota domain - verdicts and billing periods

mod period;
mod verdict;

pub use period::{current_period_start, next_period_start};
pub use verdict::AuthorizationVerdict;
