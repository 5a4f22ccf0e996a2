//! Bearer credential extraction from the `Authorization` header.
//!
//! Absence is a normal outcome here (anonymous requests, other schemes), so
//! every function returns `Option` and never errors.

use std::fmt;

use axum::http::{HeaderMap, header};

/// Scheme tag recognised by the gate (case-sensitive, single space).
pub const BEARER_PREFIX: &str = "Bearer ";

/// Raw, not yet verified token taken from a bearer credential.
///
/// Holds exactly one attribute: the token string with the scheme tag removed.
/// It carries no authorities until the gate has verified it.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the credential
        f.debug_tuple("BearerToken").field(&"<redacted>").finish()
    }
}

/// Parse a raw header value into a bearer credential.
///
/// - `None` / empty / wrong scheme => `None`
/// - `"Bearer "` followed only by whitespace => `None`
pub fn extract_bearer(header_value: Option<&str>) -> Option<BearerToken> {
    let token = header_value?.strip_prefix(BEARER_PREFIX)?.trim();
    if token.is_empty() {
        return None;
    }

    Some(BearerToken(token.to_string()))
}

/// Raw `Authorization` value; a value that is not valid UTF-8 is treated as absent.
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn accepts_bearer_scheme() {
        let token = extract_bearer(Some("Bearer abc.def.ghi")).unwrap();
        assert_eq!(token.as_str(), "abc.def.ghi");
    }

    #[test]
    fn rejects_malformed_headers_without_panicking() {
        for raw in [
            None,
            Some(""),
            Some("Bearer"),
            Some("Bearer "),
            Some("Bearer    "),
            Some("bearer abc"),
            Some("Basic xyz"),
            Some("abc.def.ghi"),
        ] {
            assert!(extract_bearer(raw).is_none(), "accepted {raw:?}");
        }
    }

    #[test]
    fn reads_authorization_header() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer(authorization_header(&headers)).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t0k"));
        let token = extract_bearer(authorization_header(&headers)).unwrap();
        assert_eq!(token.as_str(), "t0k");
    }

    #[test]
    fn non_utf8_header_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
        );
        assert!(authorization_header(&headers).is_none());
    }

    #[test]
    fn debug_does_not_leak_token() {
        let token = extract_bearer(Some("Bearer secret-token")).unwrap();
        assert!(!format!("{token:?}").contains("secret-token"));
    }
}
