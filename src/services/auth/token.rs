use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::auth::credential::BearerToken;

/// Errors from decoding / verifying a bearer token.
///
/// These never reach clients; the gate folds all of them into one rejection.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(&'static str),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
    #[error("subject does not match resolved identity")]
    SubjectMismatch,
    #[error("identity has no username")]
    UnknownIdentity,
    #[error("invalid key material")]
    KeyMaterial,
}

/// Claims carried by access tokens.
///
/// `aud` may be a string or an array; it is only inspected by jsonwebtoken
/// when an audience is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct UnverifiedHeader {
    alg: String,
}

#[derive(Deserialize)]
struct UnverifiedPayload {
    #[serde(default)]
    sub: Option<String>,
}

/// Read the `sub` claim without checking the signature.
///
/// Only used to pick which identity to resolve; the result must not be trusted
/// until the token is verified against that identity.
pub fn extract_subject(token: &BearerToken) -> Result<String, TokenError> {
    let mut parts = token.as_str().split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed("expected three segments"));
    };
    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(TokenError::Malformed("empty segment"));
    }

    let header: UnverifiedHeader = decode_segment(header)?;
    if header.alg.trim().is_empty() {
        return Err(TokenError::Malformed("empty alg"));
    }

    let payload: UnverifiedPayload = decode_segment(payload)?;
    match payload.sub {
        Some(sub) if !sub.trim().is_empty() => Ok(sub),
        _ => Err(TokenError::Malformed("missing sub")),
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed("invalid base64url"))?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed("invalid json"))
}
