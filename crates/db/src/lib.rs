pub mod catalog;
pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use catalog::catalog_resolver;
pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{seed_catalog, SeedResult, DEMO_CERTIFICATE_ID};
pub use repositories::RepositoryError;
