//! Authentication gate: extract → resolve identity → verify.
//!
//! One verification core, two call shapes:
//! - [`EdgeGate`]: async, resolves identities through [`IdentityStore`]
//! - [`ServiceGate`]: blocking, resolves identities through [`BlockingIdentityStore`]
//!
//! Every failure after extraction ends in the same [`Rejection`], whose
//! client-visible reason is always [`INVALID_CREDENTIALS`].

use serde::Serialize;
use std::{collections::BTreeSet, fmt, sync::Arc};

use crate::services::auth::{
    credential::{BearerToken, extract_bearer},
    identity::{BlockingIdentityStore, Identity, IdentityStore, IdentityStoreError, Role},
    token::extract_subject,
    verifier::TokenVerifier,
};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Authenticated principal surfaced to downstream code.
///
/// Never carries the raw token or its claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: String,
    pub authorities: BTreeSet<Role>,
}

/// Why a credential was rejected. Logged, never returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionCause {
    MalformedToken,
    UnknownSubject,
    SignatureOrExpiryInvalid,
    LookupFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    cause: RejectionCause,
}

impl Rejection {
    fn new(cause: RejectionCause) -> Self {
        Self { cause }
    }

    /// Client-visible reason; identical for every cause.
    pub fn reason(&self) -> &'static str {
        INVALID_CREDENTIALS
    }

    pub(crate) fn cause(&self) -> RejectionCause {
        self.cause
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

impl std::error::Error for Rejection {}

/// Terminal verdict for a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationResult {
    Authenticated(Principal),
    Rejected(Rejection),
}

impl AuthenticationResult {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Shared, synchronous verification core.
///
/// The gates differ only in how they perform the identity lookup between
/// [`GateCore::subject`] and [`GateCore::settle`].
#[derive(Debug, Clone)]
struct GateCore {
    verifier: Arc<TokenVerifier>,
}

impl GateCore {
    /// ExtractedCredential -> SubjectKnown
    fn subject(&self, token: &BearerToken) -> Result<String, Rejection> {
        extract_subject(token).map_err(|err| {
            tracing::debug!(error = %err, "bearer token could not be decoded");
            Rejection::new(RejectionCause::MalformedToken)
        })
    }

    /// SubjectKnown (+ lookup result) -> Authenticated | Rejected
    fn settle(
        &self,
        token: &BearerToken,
        lookup: Result<Option<Identity>, IdentityStoreError>,
    ) -> AuthenticationResult {
        let identity = match lookup {
            Ok(found) => found.unwrap_or_else(Identity::unknown),
            Err(err) => {
                tracing::warn!(error = %err, "identity lookup failed");
                return reject(RejectionCause::LookupFailed);
            }
        };

        // Checked before any signature work: never verify against the sentinel.
        let Some(username) = identity.username() else {
            return reject(RejectionCause::UnknownSubject);
        };

        match self
            .verifier
            .verify_at(&identity, token, chrono::Utc::now().timestamp())
        {
            Ok(_) => AuthenticationResult::Authenticated(Principal {
                username: username.to_string(),
                authorities: identity.authorities().clone(),
            }),
            Err(err) => {
                tracing::warn!(user = %username, error = %err, "access token verification failed");
                reject(RejectionCause::SignatureOrExpiryInvalid)
            }
        }
    }
}

fn reject(cause: RejectionCause) -> AuthenticationResult {
    AuthenticationResult::Rejected(Rejection::new(cause))
}

/// Non-blocking gate used at the edge (HTTP middleware).
#[derive(Clone)]
pub struct EdgeGate {
    core: GateCore,
    store: Arc<dyn IdentityStore>,
}

impl fmt::Debug for EdgeGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeGate")
            .field("verifier", &self.core.verifier)
            .finish_non_exhaustive()
    }
}

impl EdgeGate {
    pub fn new(verifier: Arc<TokenVerifier>, store: Arc<dyn IdentityStore>) -> Self {
        Self {
            core: GateCore { verifier },
            store,
        }
    }

    /// Authenticate a raw `Authorization` header value.
    ///
    /// Returns `None` when the value is not a bearer credential at all; that
    /// request is not this gate's concern and continues unauthenticated.
    pub async fn authenticate(&self, header_value: Option<&str>) -> Option<AuthenticationResult> {
        let token = extract_bearer(header_value)?;
        Some(self.authenticate_token(&token).await)
    }

    pub async fn authenticate_token(&self, token: &BearerToken) -> AuthenticationResult {
        let subject = match self.core.subject(token) {
            Ok(subject) => subject,
            Err(rejection) => return AuthenticationResult::Rejected(rejection),
        };

        // Single suspension point. Dropping this future drops the lookup.
        let lookup = self.store.find_by_username(&subject).await;

        self.core.settle(token, lookup)
    }
}

/// Blocking gate used inside downstream services.
///
/// Touches no shared mutable state; safe to call from any worker thread.
#[derive(Clone)]
pub struct ServiceGate {
    core: GateCore,
    store: Arc<dyn BlockingIdentityStore>,
}

impl fmt::Debug for ServiceGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceGate")
            .field("verifier", &self.core.verifier)
            .finish_non_exhaustive()
    }
}

impl ServiceGate {
    pub fn new(verifier: Arc<TokenVerifier>, store: Arc<dyn BlockingIdentityStore>) -> Self {
        Self {
            core: GateCore { verifier },
            store,
        }
    }

    pub fn authenticate_token(&self, token: &BearerToken) -> AuthenticationResult {
        let subject = match self.core.subject(token) {
            Ok(subject) => subject,
            Err(rejection) => return AuthenticationResult::Rejected(rejection),
        };

        let lookup = self.store.find_by_username_blocking(&subject);

        self.core.settle(token, lookup)
    }

    /// `false` for absent / non-bearer headers and for every verification failure.
    pub fn is_valid(&self, header_value: Option<&str>) -> bool {
        extract_bearer(header_value)
            .map(|token| self.authenticate_token(&token).is_authenticated())
            .unwrap_or(false)
    }

    /// Subject of the bearer token, or `None` on any failure.
    pub fn extract_username(&self, header_value: Option<&str>) -> Option<String> {
        let token = extract_bearer(header_value)?;
        self.core.subject(&token).ok()
    }

    /// Username of a valid bearer credential; `None` means unauthorized.
    pub fn authorize(&self, header_value: Option<&str>) -> Option<String> {
        if !self.is_valid(header_value) {
            return None;
        }
        self.extract_username(header_value)
    }
}
