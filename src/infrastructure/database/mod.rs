pub mod connection;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod sqlite_schema;

pub use connection::{
    DatabaseError, DbPool, SqlitePool, create_connection_pool, create_sqlite_pool, run_migrations,
    run_sqlite_migrations,
};
pub use repositories::{CachedStorageGateway, PostgresStorageGateway, SqliteStorageGateway};
