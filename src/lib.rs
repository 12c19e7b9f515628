//! lynxgate - token-based quota authorization gateway
//!
//! Callers present an opaque bearer secret; the gateway decides whether the
//! secret is known and still has quota for the current calendar month.
//! - Secrets are generated server-side and stored encrypted at rest
//! - Quota consumption is an atomic conditional increment per credential
//! - Usage counters reset at 00:00 UTC on the first of every month

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
