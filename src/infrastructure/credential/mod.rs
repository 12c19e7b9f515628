//! Credential infrastructure implementations
//!
//! Secret generation, the in-memory and PostgreSQL stores, and the
//! lifecycle service built on top of them.

mod generator;
mod in_memory;
mod postgres;
mod service;

pub use generator::SecretGenerator;
pub use in_memory::InMemoryCredentialStore;
pub use postgres::PostgresCredentialStore;
pub use service::CredentialService;
