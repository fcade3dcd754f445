//! Integration tests for chunked blob storage.

mod common;

use common::{chunk_rows, setup_db};
use db::{BlobStore, BlobStoreError};
use futures::TryStreamExt;
use serde_json::json;

fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_put_splits_into_chunks_and_reads_back() {
    let (db, _temp_dir) = setup_db().await;
    let store = BlobStore::with_chunk_size(1024).unwrap();
    let data = sample_bytes(1024 * 3 + 17);

    let mut conn = db.pool.acquire().await.unwrap();
    let file = store
        .put(&mut conn, "audit.pdf", "application/pdf", &data, json!({"zone": "North"}))
        .await
        .unwrap();
    drop(conn);

    assert_eq!(file.length, data.len() as i64);
    assert_eq!(file.chunk_size, 1024);
    assert_eq!(file.chunk_count(), 4);
    assert_eq!(file.metadata.0["zone"], "North");
    assert_eq!(chunk_rows(&db.pool, file.id).await, 4);

    let stored = BlobStore::find(&db.pool, file.id)
        .await
        .unwrap()
        .expect("blob should exist");
    let chunks: Vec<bytes::Bytes> = BlobStore::stream(db.pool.clone(), &stored)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(chunks.concat(), data);
}

#[tokio::test]
async fn test_stream_yields_chunks_in_order() {
    let (db, _temp_dir) = setup_db().await;
    let store = BlobStore::with_chunk_size(100).unwrap();
    let data = sample_bytes(250);

    let mut conn = db.pool.acquire().await.unwrap();
    let file = store
        .put(&mut conn, "scan.png", "image/png", &data, json!({}))
        .await
        .unwrap();
    drop(conn);

    let chunks: Vec<bytes::Bytes> = BlobStore::stream(db.pool.clone(), &file)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].len(), 100);
    assert_eq!(chunks[2].len(), 50);
    assert_eq!(chunks.concat(), data);
}

#[tokio::test]
async fn test_empty_file_has_no_chunks() {
    let (db, _temp_dir) = setup_db().await;
    let mut conn = db.pool.acquire().await.unwrap();
    let file = BlobStore::new()
        .put(&mut conn, "empty.csv", "text/csv", &[], json!({}))
        .await
        .unwrap();
    drop(conn);

    assert_eq!(file.chunk_count(), 0);
    let chunks: Vec<bytes::Bytes> = BlobStore::stream(db.pool.clone(), &file)
        .try_collect()
        .await
        .unwrap();
    assert!(chunks.is_empty());
}

#[tokio::test]
async fn test_stream_reports_missing_chunk() {
    let (db, _temp_dir) = setup_db().await;
    let store = BlobStore::with_chunk_size(10).unwrap();

    let mut conn = db.pool.acquire().await.unwrap();
    let file = store
        .put(&mut conn, "broken.pdf", "application/pdf", &sample_bytes(30), json!({}))
        .await
        .unwrap();
    drop(conn);

    sqlx::query("DELETE FROM blob_chunks WHERE files_id = $1 AND n = 1")
        .bind(file.id)
        .execute(&db.pool)
        .await
        .unwrap();

    let result: Result<Vec<bytes::Bytes>, _> =
        BlobStore::stream(db.pool.clone(), &file).try_collect().await;
    assert!(matches!(
        result,
        Err(BlobStoreError::MissingChunk { n: 1, .. })
    ));
}

#[tokio::test]
async fn test_delete_removes_document_and_chunks() {
    let (db, _temp_dir) = setup_db().await;
    let store = BlobStore::with_chunk_size(8).unwrap();

    let mut conn = db.pool.acquire().await.unwrap();
    let file = store
        .put(&mut conn, "old.xlsx", "application/pdf", &sample_bytes(40), json!({}))
        .await
        .unwrap();

    BlobStore::delete(&mut conn, file.id).await.unwrap();

    assert!(BlobStore::find(&mut *conn, file.id).await.unwrap().is_none());
    assert_eq!(chunk_rows(&mut *conn, file.id).await, 0);

    let again = BlobStore::delete(&mut conn, file.id).await;
    assert!(matches!(again, Err(BlobStoreError::FileNotFound(id)) if id == file.id));
}
