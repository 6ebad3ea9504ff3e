use std::path::Path;

use diesel::connection::SimpleConnection;
use diesel::{
    PgConnection, SqliteConnection,
    r2d2::{self, ConnectionManager, CustomizeConnection},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::infrastructure::config::{PostgresSettings, SqliteSettings};

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

pub type SqlitePool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type SqliteConnectionHandle = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

pub const POSTGRES_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/postgres");
pub const SQLITE_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/sqlite");

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),
    #[error("Pool error: {0}")]
    PoolError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Migration error: {0}")]
    MigrationError(String),
}

/// Per-connection SQLite pragmas: wait on locks instead of failing and
/// enforce foreign keys.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;")
            .map_err(r2d2::Error::QueryError)
    }
}

pub fn create_connection_pool(settings: &PostgresSettings) -> Result<DbPool, DatabaseError> {
    let database_url = settings
        .url
        .as_deref()
        .ok_or_else(|| DatabaseError::ConfigurationError("DATABASE_URL not set".to_string()))?;

    let manager = ConnectionManager::<PgConnection>::new(database_url);

    r2d2::Pool::builder()
        .max_size(settings.pool_max)
        .min_idle(Some(settings.pool_min))
        .build(manager)
        .map_err(|e| DatabaseError::PoolError(e.to_string()))
}

pub fn create_sqlite_pool(settings: &SqliteSettings) -> Result<SqlitePool, DatabaseError> {
    create_sqlite_pool_at(&settings.path)
}

pub fn create_sqlite_pool_at(path: &Path) -> Result<SqlitePool, DatabaseError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            DatabaseError::ConfigurationError(format!("{}: {}", parent.display(), e))
        })?;
    }

    let manager = ConnectionManager::<SqliteConnection>::new(path.to_string_lossy());

    r2d2::Pool::builder()
        .max_size(4)
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
        .map_err(|e| DatabaseError::PoolError(e.to_string()))
}

pub fn get_connection_from_pool(pool: &DbPool) -> Result<DbConnection, DatabaseError> {
    pool.get().map_err(|e| DatabaseError::PoolError(e.to_string()))
}

pub fn get_sqlite_connection(pool: &SqlitePool) -> Result<SqliteConnectionHandle, DatabaseError> {
    pool.get().map_err(|e| DatabaseError::PoolError(e.to_string()))
}

pub fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    let mut conn = get_connection_from_pool(pool)?;
    let applied = conn
        .run_pending_migrations(POSTGRES_MIGRATIONS)
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
    tracing::info!(applied = applied.len(), backend = "postgresql", "migrations complete");
    Ok(())
}

pub fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), DatabaseError> {
    let mut conn = get_sqlite_connection(pool)?;
    let applied = conn
        .run_pending_migrations(SQLITE_MIGRATIONS)
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
    tracing::info!(applied = applied.len(), backend = "sqlite", "migrations complete");
    Ok(())
}
