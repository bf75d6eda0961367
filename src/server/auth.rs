//! Bearer token authentication for protected market endpoints.
//!
//! Access tokens are HS256 JWTs issued by the identity service that shares
//! `auth.jwt_secret`. Only the signature, expiry and token type are checked.

use super::{AppState, error::ApiError};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub exp: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No bearer token in request")]
    MissingToken,
    #[error("Token verification is not configured")]
    NotConfigured,
    #[error("Token has expired")]
    Expired,
    #[error("Token is not an access token")]
    WrongTokenType,
    #[error("Token is invalid")]
    Invalid,
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl TokenVerifier {
    /// Without a secret every token is rejected.
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            key: secret.map(|s| DecodingKey::from_secret(s.as_bytes())),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let key = self.key.as_ref().ok_or(AuthError::NotConfigured)?;
        let data = decode::<AccessClaims>(token, key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            }
        })?;

        match data.claims.token_type.as_deref() {
            None | Some("access") => Ok(data.claims),
            Some(_) => Err(AuthError::WrongTokenType),
        }
    }

    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<AccessClaims, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
        self.verify(token)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extractor that admits only requests carrying a valid access token.
#[derive(Debug, Clone)]
pub struct Authenticated(pub AccessClaims);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .verifier
            .verify_headers(&parts.headers)
            .map(Authenticated)
            .map_err(|e| {
                debug!("Rejected request to {}: {}", parts.uri.path(), e);
                ApiError::unauthorized()
            })
    }
}
