//! Integration tests for database bootstrap: pragmas and migrations.

mod common;

use common::setup_db;
use sqlx::Row;

#[tokio::test]
async fn test_journal_mode_is_wal() {
    let (db, _temp_dir) = setup_db().await;

    let row = sqlx::query("PRAGMA journal_mode")
        .fetch_one(&db.pool)
        .await
        .expect("Failed to query journal_mode");

    let journal_mode: String = row.get(0);
    assert_eq!(journal_mode.to_lowercase(), "wal");
}

#[tokio::test]
async fn test_pragmas_applied_to_all_connections() {
    let (db, _temp_dir) = setup_db().await;

    for i in 0..3 {
        let mut conn = db.pool.acquire().await.expect("Failed to acquire connection");

        let temp_store: i32 = sqlx::query_scalar("PRAGMA temp_store")
            .fetch_one(&mut *conn)
            .await
            .expect("Failed to query temp_store");
        assert_eq!(temp_store, 2, "Connection {} should have temp_store = MEMORY", i);

        let foreign_keys: i32 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&mut *conn)
            .await
            .expect("Failed to query foreign_keys");
        assert_eq!(foreign_keys, 1, "Connection {} should enforce foreign keys", i);
    }
}

#[tokio::test]
async fn test_migrations_create_tables() {
    let (db, _temp_dir) = setup_db().await;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' ORDER BY name",
    )
    .fetch_all(&db.pool)
    .await
    .expect("Failed to list tables");

    for expected in [
        "announcements",
        "blob_chunks",
        "blob_files",
        "designations",
        "file_records",
        "tasks",
    ] {
        assert!(
            tables.iter().any(|t| t == expected),
            "missing table {expected}, found {tables:?}"
        );
    }
}

#[tokio::test]
async fn test_reopening_existing_database_is_idempotent() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("portal.db");

    let first = db::DBService::connect(&path).await.unwrap();
    first.shutdown().await;

    let second = db::DBService::connect(&path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(&second.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}
