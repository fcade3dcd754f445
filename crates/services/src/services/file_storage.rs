//! The document upload pipeline.
//!
//! Metadata lives in `file_records`, bytes live in the chunked blob store.
//! Upload and delete touch both inside one SQLite transaction, so a record
//! exists exactly when its blob does.

use bytes::Bytes;
use db::{
    BlobFile, BlobStore, BlobStoreError, DBService,
    models::file_record::{CreateFileRecord, FileRecord, FileScope},
};
use futures::stream::BoxStream;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use super::{
    compression::{self, CompressionOptions},
    upload_policy::{PolicyViolation, UploadPolicy, normalize_filename},
};

#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("File not found")]
    NotFound,
    #[error("No files found for this category, zone, and branch.")]
    NoFilesInScope,
    #[error("A file named {0} already exists")]
    DuplicateFilename(String),
    #[error("File number {0} was taken by a concurrent upload")]
    NumberCollision(String),
    #[error("Blob {0} is missing for an existing file record")]
    BlobMissing(Uuid),
    #[error(transparent)]
    Policy(#[from] PolicyViolation),
    #[error(transparent)]
    BlobStore(#[from] BlobStoreError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A file received from a client, before validation.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// An open download: the metadata plus a stream over the blob chunks.
pub struct FileDownload {
    pub record: FileRecord,
    pub blob: BlobFile,
    pub stream: BoxStream<'static, Result<Bytes, BlobStoreError>>,
}

#[derive(Clone)]
pub struct FileStorage {
    db: DBService,
    blob_store: BlobStore,
    policy: UploadPolicy,
    compression: CompressionOptions,
}

impl FileStorage {
    pub fn new(db: DBService, policy: UploadPolicy, compression: CompressionOptions) -> Self {
        Self {
            db,
            blob_store: BlobStore::new(),
            policy,
            compression,
        }
    }

    pub fn with_blob_store(mut self, blob_store: BlobStore) -> Self {
        self.blob_store = blob_store;
        self
    }

    /// Validate, compress and store a file under `scope`.
    pub async fn upload(
        &self,
        scope: &FileScope,
        file: UploadedFile,
    ) -> Result<FileRecord, FileStorageError> {
        let kind = self.policy.validate(&file.content_type, file.data.len())?;
        let filename = normalize_filename(&file.filename)?;

        if FileRecord::find_by_filename(&self.db.pool, &filename)
            .await?
            .is_some()
        {
            return Err(FileStorageError::DuplicateFilename(filename));
        }

        let compressed = compression::compress(kind, file.data, self.compression).await;

        // Deferred read-then-write transactions fail with SQLITE_BUSY under WAL.
        let mut tx = self.db.pool.begin_with("BEGIN IMMEDIATE").await?;

        let file_number = FileRecord::next_file_number(&mut tx, scope).await?;

        let blob = self
            .blob_store
            .put(
                &mut tx,
                &filename,
                &file.content_type,
                &compressed.data,
                json!({
                    "category": scope.category,
                    "zone": scope.zone,
                    "branch": scope.branch,
                    "fileNumber": file_number,
                    "compressionApplied": compressed.compression_applied,
                }),
            )
            .await?;

        let record = FileRecord::create(
            &mut tx,
            &CreateFileRecord {
                filename: filename.clone(),
                filetype: file.content_type,
                file_id: blob.id,
                scope: scope.clone(),
                file_number: file_number.clone(),
                compression_applied: compressed.compression_applied,
            },
        )
        .await
        .map_err(|e| classify_insert_error(e, &filename, &file_number))?;

        tx.commit().await?;

        tracing::info!(
            filename = %record.filename,
            file_id = %record.file_id,
            file_number = %record.file_number,
            category = %scope.category,
            zone = %scope.zone,
            branch = %scope.branch,
            size = blob.length,
            compression_applied = record.compression_applied,
            "File uploaded"
        );

        Ok(record)
    }

    /// All files in a scope, ordered by file number.
    pub async fn list(&self, scope: &FileScope) -> Result<Vec<FileRecord>, FileStorageError> {
        let records = FileRecord::find_by_scope(&self.db.pool, scope).await?;
        if records.is_empty() {
            return Err(FileStorageError::NoFilesInScope);
        }
        Ok(records)
    }

    /// Look up a file by name and open a chunked stream over its bytes.
    pub async fn open_download(&self, filename: &str) -> Result<FileDownload, FileStorageError> {
        let record = FileRecord::find_by_filename(&self.db.pool, filename)
            .await?
            .ok_or(FileStorageError::NotFound)?;

        let blob = BlobStore::find(&self.db.pool, record.file_id)
            .await?
            .ok_or(FileStorageError::BlobMissing(record.file_id))?;

        let stream = Box::pin(BlobStore::stream(self.db.pool.clone(), &blob));

        Ok(FileDownload {
            record,
            blob,
            stream,
        })
    }

    /// Remove a file's metadata and blob together.
    pub async fn delete(&self, scope: &FileScope, filename: &str) -> Result<(), FileStorageError> {
        let filename = filename.trim();
        let mut tx = self.db.pool.begin_with("BEGIN IMMEDIATE").await?;

        let record = FileRecord::find_in_scope(&mut *tx, scope, filename)
            .await?
            .ok_or(FileStorageError::NotFound)?;

        FileRecord::delete(&mut tx, record.id).await?;
        BlobStore::delete(&mut tx, record.file_id).await?;

        tx.commit().await?;

        tracing::info!(
            filename = %filename,
            file_id = %record.file_id,
            "File deleted"
        );

        Ok(())
    }
}

fn classify_insert_error(error: sqlx::Error, filename: &str, file_number: &str) -> FileStorageError {
    if !db::is_unique_violation(&error) {
        return error.into();
    }
    let message = match &error {
        sqlx::Error::Database(db_error) => db_error.message().to_string(),
        _ => String::new(),
    };
    if message.contains("file_records.filename") {
        FileStorageError::DuplicateFilename(filename.to_string())
    } else {
        FileStorageError::NumberCollision(file_number.to_string())
    }
}
