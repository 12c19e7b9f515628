//! Storage infrastructure - connection pool, migrations and backend selection

mod factory;
pub mod migrations;
mod postgres;

pub use factory::create_credential_store;
pub use migrations::{credential_migrations, run_credential_migrations, Migration, PostgresMigrator};
pub use postgres::{connect_pool, map_sqlx_error};
