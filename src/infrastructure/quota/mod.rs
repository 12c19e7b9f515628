//! Quota infrastructure - authorization and periodic reset

mod authorizer;
mod scheduler;

pub use authorizer::QuotaAuthorizer;
pub use scheduler::{Clock, QuotaResetScheduler, SystemClock};
