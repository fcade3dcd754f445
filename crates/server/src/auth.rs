//! Bearer token verification.
//!
//! Tokens are HS256 JWTs signed with `PORTAL_JWT_SECRET`. The portal only
//! verifies them; issuing happens elsewhere.

use std::{collections::HashSet, sync::Arc};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::{AppState, error::ApiError};

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("invalid token")]
    InvalidToken,
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Claims carried by a portal access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated caller, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub role: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct JwtService {
    secret: Arc<SecretString>,
}

impl JwtService {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret: Arc::new(secret),
        }
    }

    /// Sign a token for `user_id` valid for `ttl`.
    pub fn issue(
        &self,
        user_id: &str,
        role: Option<&str>,
        ttl: ChronoDuration,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            role: role.map(str::to_string),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &key)?)
    }

    pub fn verify(&self, token: &str) -> Result<AuthContext, JwtError> {
        if token.trim().is_empty() {
            return Err(JwtError::InvalidToken);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.required_spec_claims = HashSet::from(["sub".to_string(), "exp".to_string()]);
        validation.leeway = 30;

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let claims = decode::<AccessClaims>(token, &key, &validation)?.claims;

        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(JwtError::InvalidToken)?;

        Ok(AuthContext {
            user_id: claims.sub,
            role: claims.role,
            expires_at,
        })
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = match req.headers().typed_get::<Authorization<Bearer>>() {
        Some(Authorization(token)) => token.token().to_owned(),
        None => return Err(ApiError::Unauthorized("No token provided".to_string())),
    };

    let context = state.jwt().verify(&bearer).map_err(|error| {
        warn!(?error, "failed to verify access token");
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(SecretString::from("test-secret".to_string()))
    }

    #[test]
    fn test_issue_and_verify() {
        let jwt = service();
        let token = jwt
            .issue("user-1", Some("admin"), ChronoDuration::hours(1))
            .unwrap();

        let context = jwt.verify(&token).unwrap();
        assert_eq!(context.user_id, "user-1");
        assert_eq!(context.role.as_deref(), Some("admin"));
        assert!(context.expires_at > Utc::now());
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = service();
        let token = jwt
            .issue("user-1", None, ChronoDuration::minutes(-10))
            .unwrap();
        assert!(jwt.verify(&token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service()
            .issue("user-1", None, ChronoDuration::hours(1))
            .unwrap();
        let other = JwtService::new(SecretString::from("another-secret".to_string()));
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(service().verify("  "), Err(JwtError::InvalidToken)));
    }
}
