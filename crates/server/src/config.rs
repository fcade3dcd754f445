//! Server configuration loaded from environment variables.
//!
//! Required:
//! - `PORTAL_JWT_SECRET`: HS256 secret used to verify bearer tokens
//!
//! Optional:
//! - `HOST`: bind host (default `127.0.0.1`)
//! - `BACKEND_PORT` / `PORT`: bind port (default `5000`)
//! - `PORTAL_MAX_IMAGE_BYTES`: image upload limit (default 10 MiB)
//! - `PORTAL_MAX_DOCUMENT_BYTES`: document upload limit (default 20 MiB)
//! - `PORTAL_STRICT_COMPRESSION`: keep originals that re-encoding cannot shrink (default `true`)

use secrecy::SecretString;
use services::services::{
    compression::CompressionOptions,
    upload_policy::{DEFAULT_MAX_DOCUMENT_BYTES, DEFAULT_MAX_IMAGE_BYTES, UploadPolicy},
};
use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),
    #[error("environment variable {name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub upload_policy: UploadPolicy,
    pub compression: CompressionOptions,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("PORTAL_JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .map(SecretString::from)
            .ok_or(ConfigError::Missing("PORTAL_JWT_SECRET"))?;

        let host = lookup("HOST")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port_var = lookup("BACKEND_PORT")
            .map(|value| ("BACKEND_PORT", value))
            .or_else(|| lookup("PORT").map(|value| ("PORT", value)));
        let port = match port_var {
            Some((name, value)) => parse_var(name, &value)?,
            None => {
                tracing::info!("No PORT environment variable set, using {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let max_image_bytes = match lookup("PORTAL_MAX_IMAGE_BYTES") {
            Some(value) => parse_positive("PORTAL_MAX_IMAGE_BYTES", &value)?,
            None => DEFAULT_MAX_IMAGE_BYTES,
        };
        let max_document_bytes = match lookup("PORTAL_MAX_DOCUMENT_BYTES") {
            Some(value) => parse_positive("PORTAL_MAX_DOCUMENT_BYTES", &value)?,
            None => DEFAULT_MAX_DOCUMENT_BYTES,
        };

        let strict = match lookup("PORTAL_STRICT_COMPRESSION") {
            Some(value) => match value.trim() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "PORTAL_STRICT_COMPRESSION",
                        value,
                    });
                }
            },
            None => true,
        };

        Ok(Self {
            host,
            port,
            jwt_secret,
            upload_policy: UploadPolicy {
                max_image_bytes,
                max_document_bytes,
            },
            compression: CompressionOptions {
                strict,
                ..Default::default()
            },
        })
    }

    /// Largest request body the upload route has to accept.
    pub fn upload_body_limit(&self) -> usize {
        let largest = self
            .upload_policy
            .max_image_bytes
            .max(self.upload_policy.max_document_bytes);
        // Room for multipart boundaries and headers.
        largest + 1024 * 1024
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn parse_positive(name: &'static str, value: &str) -> Result<usize, ConfigError> {
    let parsed: usize = parse_var(name, value)?;
    if parsed == 0 {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        });
    }
    Ok(parsed)
}
