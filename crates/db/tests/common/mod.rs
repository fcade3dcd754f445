use db::DBService;
use tempfile::TempDir;

/// Open a fresh, migrated database in a temporary directory.
pub async fn setup_db() -> (DBService, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = DBService::connect(&temp_dir.path().join("portal.db"))
        .await
        .expect("Failed to open database");
    (db, temp_dir)
}

/// Number of chunk rows stored for a blob.
#[allow(dead_code)]
pub async fn chunk_rows<'e, E>(executor: E, file_id: uuid::Uuid) -> i64
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query_scalar("SELECT COUNT(*) FROM blob_chunks WHERE files_id = $1")
        .bind(file_id)
        .fetch_one(executor)
        .await
        .expect("Failed to count chunks")
}
