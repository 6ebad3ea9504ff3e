pub mod cached_storage_gateway;
pub mod postgres_storage_gateway;
pub mod sqlite_storage_gateway;

pub use cached_storage_gateway::CachedStorageGateway;
pub use postgres_storage_gateway::PostgresStorageGateway;
pub use sqlite_storage_gateway::SqliteStorageGateway;
