//! Rules an upload must satisfy before anything is written.

use thiserror::Error;

pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 20 * 1024 * 1024;

pub const INVALID_FILE_TYPE_MESSAGE: &str =
    "Invalid file type! Only PNG, JPEG, WebP, PDF, DOCX, XLS, XLSX, and CSV files are allowed.";

/// Every MIME type the portal accepts.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/csv",
    "application/txt",
];

/// Image formats that go through compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Webp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image(ImageKind),
    Document,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("{msg}", msg = INVALID_FILE_TYPE_MESSAGE)]
    InvalidFileType(String),
    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("Filename is required")]
    EmptyFilename,
}

#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_image_bytes: usize,
    pub max_document_bytes: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl UploadPolicy {
    /// Classify a content type, ignoring parameters such as `; charset=utf-8`.
    pub fn classify(content_type: &str) -> Result<FileKind, PolicyViolation> {
        let essence = essence(content_type);
        if !ALLOWED_MIME_TYPES.contains(&essence.as_str()) {
            return Err(PolicyViolation::InvalidFileType(content_type.to_string()));
        }

        Ok(match essence.as_str() {
            "image/png" => FileKind::Image(ImageKind::Png),
            "image/jpeg" => FileKind::Image(ImageKind::Jpeg),
            "image/webp" => FileKind::Image(ImageKind::Webp),
            _ => FileKind::Document,
        })
    }

    pub fn limit_for(&self, kind: FileKind) -> usize {
        match kind {
            FileKind::Image(_) => self.max_image_bytes,
            FileKind::Document => self.max_document_bytes,
        }
    }

    /// Check type and size of an incoming file.
    pub fn validate(&self, content_type: &str, size: usize) -> Result<FileKind, PolicyViolation> {
        let kind = Self::classify(content_type)?;
        let limit = self.limit_for(kind);
        if size > limit {
            return Err(PolicyViolation::TooLarge { size, limit });
        }
        Ok(kind)
    }
}

/// Lowercased `type/subtype` without parameters.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Trim the name and replace every run of whitespace with a single `_`.
pub fn normalize_filename(filename: &str) -> Result<String, PolicyViolation> {
    let normalized = filename.split_whitespace().collect::<Vec<_>>().join("_");
    if normalized.is_empty() {
        return Err(PolicyViolation::EmptyFilename);
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_allowed_types() {
        assert_eq!(
            UploadPolicy::classify("image/png"),
            Ok(FileKind::Image(ImageKind::Png))
        );
        assert_eq!(
            UploadPolicy::classify("IMAGE/JPEG"),
            Ok(FileKind::Image(ImageKind::Jpeg))
        );
        assert_eq!(
            UploadPolicy::classify("text/csv; charset=utf-8"),
            Ok(FileKind::Document)
        );
        assert_eq!(
            UploadPolicy::classify("application/vnd.ms-excel"),
            Ok(FileKind::Document)
        );
    }

    #[test]
    fn test_classify_rejects_unknown_types() {
        for mime in ["image/gif", "application/zip", "text/plain", ""] {
            assert!(matches!(
                UploadPolicy::classify(mime),
                Err(PolicyViolation::InvalidFileType(_))
            ));
        }
        assert_eq!(
            PolicyViolation::InvalidFileType("image/gif".into()).to_string(),
            INVALID_FILE_TYPE_MESSAGE
        );
    }

    #[test]
    fn test_size_limits_depend_on_kind() {
        let policy = UploadPolicy {
            max_image_bytes: 10,
            max_document_bytes: 20,
        };

        assert!(policy.validate("image/webp", 10).is_ok());
        assert_eq!(
            policy.validate("image/webp", 11),
            Err(PolicyViolation::TooLarge { size: 11, limit: 10 })
        );
        assert!(policy.validate("application/pdf", 20).is_ok());
        assert_eq!(
            policy.validate("application/pdf", 21),
            Err(PolicyViolation::TooLarge { size: 21, limit: 20 })
        );
    }

    #[test]
    fn test_normalize_filename() {
        assert_eq!(
            normalize_filename("  trade license 2024.pdf ").unwrap(),
            "trade_license_2024.pdf"
        );
        assert_eq!(
            normalize_filename("fire\t\tcert  copy.png").unwrap(),
            "fire_cert_copy.png"
        );
        assert_eq!(normalize_filename("plain.csv").unwrap(), "plain.csv");
        assert_eq!(
            normalize_filename(" \t "),
            Err(PolicyViolation::EmptyFilename)
        );
    }
}
