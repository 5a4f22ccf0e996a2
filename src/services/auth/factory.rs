/// Factory: build both gates from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::{
    gate::{EdgeGate, ServiceGate},
    identity::InMemoryIdentityStore,
    verifier::{SigningSecret, TokenVerifier},
};

/// Gates sharing one verifier and one identity snapshot.
#[derive(Debug, Clone)]
pub struct AuthGates {
    pub edge: Arc<EdgeGate>,
    pub service: Arc<ServiceGate>,
}

pub fn build_gates(config: &Config) -> Result<AuthGates, AppError> {
    let store = match &config.identity_fixtures_path {
        Some(path) => InMemoryIdentityStore::from_file(path).map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "failed to load identities");
            AppError::Internal
        })?,
        None => InMemoryIdentityStore::default(),
    };
    if store.is_empty() {
        tracing::warn!("identity store is empty; every bearer token will be rejected");
    } else {
        tracing::info!(identities = store.len(), "identity store loaded");
    }

    Ok(build_gates_with(config, Arc::new(store)))
}

pub fn build_gates_with(config: &Config, store: Arc<InMemoryIdentityStore>) -> AuthGates {
    let verifier = Arc::new(TokenVerifier::new(
        SigningSecret::new(config.auth_signing_secret.as_bytes()),
        config.auth_issuer.as_deref(),
        config.auth_audience.as_deref(),
        config.access_token_leeway_seconds,
    ));

    AuthGates {
        edge: Arc::new(EdgeGate::new(verifier.clone(), store.clone())),
        service: Arc::new(ServiceGate::new(verifier, store)),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::services::auth::{
        identity::Identity,
        verifier::testing::{TEST_SECRET, mint},
    };

    fn config(fixtures: Option<&str>) -> Config {
        let fixtures = fixtures.map(str::to_string);
        Config::from_lookup(move |key| match key {
            "AUTH_SIGNING_SECRET" => Some(TEST_SECRET.to_string()),
            "IDENTITY_FIXTURES_PATH" => fixtures.clone(),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn loads_demo_identities() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/identities.json");
        let gates = build_gates(&config(path.to_str())).unwrap();

        // Must match the secret hash in demos/identities.json.
        let bob = Identity::new("bob", "$2a$10$N9qo8uLOickgx2ZMRZoMye", []);
        let header = format!("Bearer {}", mint(&bob, "bob"));
        assert_eq!(gates.service.authorize(Some(&header)).as_deref(), Some("bob"));
    }

    #[test]
    fn missing_fixtures_file_fails() {
        assert!(matches!(
            build_gates(&config(Some("/nonexistent/identities.json"))),
            Err(AppError::Internal)
        ));
    }

    #[test]
    fn no_fixtures_means_empty_store() {
        assert!(build_gates(&config(None)).is_ok());
    }
}
