//! Metadata for uploaded documents.
//!
//! Each record points at a blob in [`crate::blob_store`] and carries the
//! organizational scope (category, zone, branch) it was filed under together
//! with a per-scope sequence number such as `00007`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqliteConnection, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Width of the zero-padded file number.
pub const FILE_NUMBER_WIDTH: usize = 5;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct FileRecord {
    pub id: Uuid,
    pub filename: String,
    pub filetype: String,
    /// Id of the stored blob
    pub file_id: Uuid,
    pub category: String,
    pub zone: String,
    pub branch: String,
    pub file_number: String,
    pub compression_applied: bool,
    pub last_modified: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// The (category, zone, branch) triple a file is filed under.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, TS)]
pub struct FileScope {
    pub category: String,
    pub zone: String,
    pub branch: String,
}

impl FileScope {
    pub fn new(
        category: impl Into<String>,
        zone: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            zone: zone.into(),
            branch: branch.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateFileRecord {
    pub filename: String,
    pub filetype: String,
    pub file_id: Uuid,
    pub scope: FileScope,
    pub file_number: String,
    pub compression_applied: bool,
}

/// Format a sequence number as the zero-padded file number (`1` → `00001`).
pub fn format_file_number(n: i64) -> String {
    format!("{:0width$}", n, width = FILE_NUMBER_WIDTH)
}

impl FileRecord {
    pub async fn find_by_scope(
        pool: &SqlitePool,
        scope: &FileScope,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, FileRecord>(
            r#"SELECT id, filename, filetype, file_id, category, zone, branch,
                file_number, compression_applied, last_modified, created_at
            FROM file_records
            WHERE category = $1 AND zone = $2 AND branch = $3
            ORDER BY CAST(file_number AS INTEGER) ASC"#,
        )
        .bind(&scope.category)
        .bind(&scope.zone)
        .bind(&scope.branch)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_filename<'e, E>(
        executor: E,
        filename: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, FileRecord>(
            r#"SELECT id, filename, filetype, file_id, category, zone, branch,
                file_number, compression_applied, last_modified, created_at
            FROM file_records
            WHERE filename = $1"#,
        )
        .bind(filename)
        .fetch_optional(executor)
        .await
    }

    /// Find a file by name, but only within the given scope.
    pub async fn find_in_scope<'e, E>(
        executor: E,
        scope: &FileScope,
        filename: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, FileRecord>(
            r#"SELECT id, filename, filetype, file_id, category, zone, branch,
                file_number, compression_applied, last_modified, created_at
            FROM file_records
            WHERE filename = $1 AND category = $2 AND zone = $3 AND branch = $4"#,
        )
        .bind(filename)
        .bind(&scope.category)
        .bind(&scope.zone)
        .bind(&scope.branch)
        .fetch_optional(executor)
        .await
    }

    /// Next free number in the scope: one past the highest number in use.
    ///
    /// Call inside the transaction that inserts the record; the unique index
    /// on (category, zone, branch, file_number) rejects a concurrent duplicate.
    pub async fn next_file_number(
        conn: &mut SqliteConnection,
        scope: &FileScope,
    ) -> Result<String, sqlx::Error> {
        let highest: Option<i64> = sqlx::query_scalar(
            r#"SELECT MAX(CAST(file_number AS INTEGER))
            FROM file_records
            WHERE category = $1 AND zone = $2 AND branch = $3"#,
        )
        .bind(&scope.category)
        .bind(&scope.zone)
        .bind(&scope.branch)
        .fetch_one(&mut *conn)
        .await?;

        Ok(format_file_number(highest.unwrap_or(0) + 1))
    }

    pub async fn create(
        conn: &mut SqliteConnection,
        data: &CreateFileRecord,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query_as::<_, FileRecord>(
            r#"INSERT INTO file_records (id, filename, filetype, file_id, category, zone, branch,
                file_number, compression_applied, last_modified, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING id, filename, filetype, file_id, category, zone, branch,
                file_number, compression_applied, last_modified, created_at"#,
        )
        .bind(id)
        .bind(&data.filename)
        .bind(&data.filetype)
        .bind(data.file_id)
        .bind(&data.scope.category)
        .bind(&data.scope.zone)
        .bind(&data.scope.branch)
        .bind(&data.file_number)
        .bind(data.compression_applied)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM file_records WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
