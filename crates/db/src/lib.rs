use std::{path::Path, str::FromStr, time::Duration};

use sqlx::{
    Error, Executor, Pool, Sqlite,
    sqlite::{
        SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions,
        SqliteSynchronous,
    },
};
use tracing::{error, info};
use utils::assets::database_path;

pub mod blob_store;
pub mod models;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use blob_store::{BlobFile, BlobStore, BlobStoreError, DEFAULT_CHUNK_SIZE};

// ============================================================================
// Connection Pool Configuration
// ============================================================================

/// SQLite benefits from a small pool due to its single-writer model.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

const DEFAULT_MIN_CONNECTIONS: u32 = 2;

const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Idle connection timeout (10 minutes).
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Get max connections from `PORTAL_SQLITE_MAX_CONNECTIONS` or use the default.
pub fn get_max_connections() -> u32 {
    std::env::var("PORTAL_SQLITE_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|&n| n > 0 && n <= 100)
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
}

/// Pragmas applied to every new connection via `after_connect`.
///
/// - `temp_store = MEMORY` (2)
/// - `mmap_size`: 64MB in debug builds, 256MB in release builds
/// - `synchronous = NORMAL`, which must come AFTER `mmap_size`
/// - `cache_size = -64000` (64MB; negative means KB)
///
/// Blob chunks make this database write-heavy in bursts, so the WAL is
/// checkpointed every 2000 pages (~8MB) instead of the default 1000.
async fn apply_performance_pragmas(conn: &mut SqliteConnection) -> Result<(), Error> {
    conn.execute("PRAGMA temp_store = 2").await?;

    #[cfg(debug_assertions)]
    conn.execute("PRAGMA mmap_size = 67108864").await?;

    #[cfg(not(debug_assertions))]
    conn.execute("PRAGMA mmap_size = 268435456").await?;

    // mmap'ed writes can bypass fsync guarantees unless synchronous is set afterwards.
    conn.execute("PRAGMA synchronous = NORMAL").await?;

    conn.execute("PRAGMA cache_size = -64000").await?;

    conn.execute("PRAGMA wal_autocheckpoint = 2000").await?;

    Ok(())
}

fn connect_options(db_path: &Path) -> Result<SqliteConnectOptions, Error> {
    let database_url = format!("sqlite://{}", db_path.to_string_lossy());
    Ok(SqliteConnectOptions::from_str(&database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS)))
}

/// Run `PRAGMA quick_check` and fail if the database reports anything but "ok".
async fn check_database_integrity(pool: &Pool<Sqlite>) -> Result<(), Error> {
    let result: String = sqlx::query_scalar("PRAGMA quick_check")
        .fetch_one(pool)
        .await?;

    if result != "ok" {
        return Err(Error::Protocol(format!(
            "Database integrity check failed: {}",
            result
        )));
    }

    Ok(())
}

#[derive(Clone)]
pub struct DBService {
    pub pool: Pool<Sqlite>,
}

impl DBService {
    /// Open the database at the configured path, verify it and apply pending migrations.
    pub async fn new() -> Result<DBService, Error> {
        Self::connect(&database_path()).await
    }

    pub async fn connect(db_path: &Path) -> Result<DBService, Error> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        let max_connections = get_max_connections();

        info!(
            path = %db_path.display(),
            max_connections = max_connections,
            min_connections = DEFAULT_MIN_CONNECTIONS,
            "Initializing SQLite connection pool"
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(DEFAULT_MIN_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)))
            .after_connect(|conn, _meta| {
                Box::pin(async move { apply_performance_pragmas(conn).await })
            })
            .connect_with(connect_options(db_path)?)
            .await?;

        match check_database_integrity(&pool).await {
            Ok(()) => info!("Database integrity check passed"),
            Err(e) => {
                error!(error = %e, "DATABASE CORRUPTION DETECTED");
                return Err(e);
            }
        }

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(DBService { pool })
    }

    /// Wrap an already-migrated pool.
    pub fn from_pool(pool: Pool<Sqlite>) -> DBService {
        DBService { pool }
    }

    /// Flush the WAL into the main database file and close every connection.
    pub async fn shutdown(&self) {
        info!("Running final WAL checkpoint...");
        match sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await
        {
            Ok(_) => info!("Final WAL checkpoint completed"),
            Err(e) => tracing::warn!(
                "Final WAL checkpoint failed (data may still be in WAL): {}",
                e
            ),
        }

        info!("Closing database connection pool...");
        self.pool.close().await;
    }
}

/// True when the error is a UNIQUE constraint violation.
pub fn is_unique_violation(error: &Error) -> bool {
    match error {
        Error::Database(db_error) => db_error.is_unique_violation(),
        _ => false,
    }
}
