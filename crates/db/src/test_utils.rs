//! Test helpers for building migrated SQLite pools.
//!
//! Migrations run once into a template database; every test then gets its
//! own copy of that file inside a fresh `TempDir`.

use std::{
    path::Path,
    str::FromStr,
    sync::OnceLock,
    time::Duration,
};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tempfile::TempDir;
use tokio::sync::OnceCell;

use crate::DBService;

static TEMPLATE_DIR: OnceLock<TempDir> = OnceLock::new();
static TEMPLATE_READY: OnceCell<()> = OnceCell::const_new();

fn template_path() -> std::path::PathBuf {
    TEMPLATE_DIR
        .get_or_init(|| TempDir::new().expect("Failed to create template temp dir"))
        .path()
        .join("template.db")
}

fn options_for(path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
        .expect("Invalid test database URL")
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
}

async fn ensure_template_ready() {
    TEMPLATE_READY
        .get_or_init(|| async {
            let pool = SqlitePoolOptions::new()
                .min_connections(0)
                .max_connections(1)
                .connect_with(options_for(&template_path()))
                .await
                .expect("Failed to create template pool");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run migrations on template");

            // Closing checkpoints the WAL so the copy below is complete.
            pool.close().await;
        })
        .await;
}

/// Create a migrated test pool.
///
/// The returned `TempDir` owns the database file and must outlive the pool.
pub async fn create_test_pool() -> (SqlitePool, TempDir) {
    ensure_template_ready().await;

    let temp_dir = TempDir::new().expect("Failed to create test temp dir");
    let db_path = temp_dir.path().join("test.db");
    std::fs::copy(template_path(), &db_path).expect("Failed to copy template database");

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options_for(&db_path))
        .await
        .expect("Failed to create test pool");

    (pool, temp_dir)
}

/// Same as [`create_test_pool`], wrapped in a [`DBService`].
pub async fn create_test_db() -> (DBService, TempDir) {
    let (pool, temp_dir) = create_test_pool().await;
    (DBService::from_pool(pool), temp_dir)
}
