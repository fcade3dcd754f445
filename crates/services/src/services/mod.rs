//! Service modules for the record portal.
//!
//! - [`upload_policy`] - accepted MIME types, size limits, filename rules
//! - [`compression`] - image downscaling and re-encoding before storage
//! - [`file_storage`] - the upload/list/download/delete pipeline over the blob store

pub mod compression;
pub mod file_storage;
pub mod upload_policy;
