//! Chunked binary storage on top of SQLite.
//!
//! Follows the GridFS layout: every stored file gets one document in
//! `blob_files` (name, content type, total length, chunk size, free-form JSON
//! metadata) and its bytes are split across `blob_chunks` rows numbered
//! `0..n`. Readers reassemble a file by fetching chunks in order, one row at a
//! time, so downloads never hold the whole file in memory.
//!
//! Writes take a `&mut SqliteConnection` so callers can compose them with
//! other statements inside a single transaction.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use sqlx::{Executor, FromRow, Sqlite, SqliteConnection, SqlitePool, types::Json};
use thiserror::Error;
use uuid::Uuid;

/// 255 KiB, the GridFS default.
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("blob file {0} not found")]
    FileNotFound(Uuid),
    #[error("blob file {file_id} is missing chunk {n}")]
    MissingChunk { file_id: Uuid, n: i64 },
    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(usize),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// The `blob_files` document describing one stored file.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BlobFile {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub length: i64,
    pub chunk_size: i64,
    pub upload_date: DateTime<Utc>,
    pub metadata: Json<serde_json::Value>,
}

impl BlobFile {
    pub fn chunk_count(&self) -> i64 {
        if self.length == 0 || self.chunk_size <= 0 {
            return 0;
        }
        (self.length + self.chunk_size - 1) / self.chunk_size
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BlobStore {
    chunk_size: usize,
}

impl Default for BlobStore {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(chunk_size: usize) -> Result<Self, BlobStoreError> {
        if chunk_size == 0 {
            return Err(BlobStoreError::InvalidChunkSize(chunk_size));
        }
        Ok(Self { chunk_size })
    }

    /// Store `data` as a new blob file and return its document.
    pub async fn put(
        &self,
        conn: &mut SqliteConnection,
        filename: &str,
        content_type: &str,
        data: &[u8],
        metadata: serde_json::Value,
    ) -> Result<BlobFile, BlobStoreError> {
        let id = Uuid::new_v4();
        let length = data.len() as i64;
        let chunk_size = self.chunk_size as i64;
        let upload_date = Utc::now();

        let file = sqlx::query_as::<_, BlobFile>(
            r#"INSERT INTO blob_files (id, filename, content_type, length, chunk_size, upload_date, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, filename, content_type, length, chunk_size, upload_date, metadata"#,
        )
        .bind(id)
        .bind(filename)
        .bind(content_type)
        .bind(length)
        .bind(chunk_size)
        .bind(upload_date)
        .bind(Json(metadata))
        .fetch_one(&mut *conn)
        .await?;

        for (n, chunk) in data.chunks(self.chunk_size).enumerate() {
            sqlx::query("INSERT INTO blob_chunks (files_id, n, data) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(n as i64)
                .bind(chunk)
                .execute(&mut *conn)
                .await?;
        }

        tracing::debug!(
            file_id = %id,
            filename = %filename,
            length = length,
            chunks = file.chunk_count(),
            "Stored blob file"
        );

        Ok(file)
    }

    pub async fn find<'e, E>(executor: E, id: Uuid) -> Result<Option<BlobFile>, BlobStoreError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        Ok(sqlx::query_as::<_, BlobFile>(
            r#"SELECT id, filename, content_type, length, chunk_size, upload_date, metadata
            FROM blob_files
            WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?)
    }

    /// Stream a file's bytes chunk by chunk, in order.
    pub fn stream(
        pool: SqlitePool,
        file: &BlobFile,
    ) -> impl Stream<Item = Result<Bytes, BlobStoreError>> + Send + 'static {
        let file_id = file.id;
        let chunk_count = file.chunk_count();

        async_stream::try_stream! {
            for n in 0..chunk_count {
                let data: Option<Vec<u8>> = sqlx::query_scalar(
                    "SELECT data FROM blob_chunks WHERE files_id = $1 AND n = $2",
                )
                .bind(file_id)
                .bind(n)
                .fetch_optional(&pool)
                .await?;

                let data = data.ok_or(BlobStoreError::MissingChunk { file_id, n })?;
                yield Bytes::from(data);
            }
        }
    }

    /// Remove a file document and all of its chunks.
    pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> Result<(), BlobStoreError> {
        sqlx::query("DELETE FROM blob_chunks WHERE files_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        let result = sqlx::query("DELETE FROM blob_files WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BlobStoreError::FileNotFound(id));
        }

        Ok(())
    }
}
