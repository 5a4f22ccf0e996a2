use hmac::{Hmac, Mac};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use sha2::Sha256;
use std::fmt;

use crate::services::auth::{
    credential::BearerToken,
    identity::Identity,
    token::{TokenClaims, TokenError},
};

type HmacSha256 = Hmac<Sha256>;

/// Algorithms the issuer may sign with. Anything else is rejected.
pub const SUPPORTED_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Server-side signing secret.
///
/// The per-identity signing key is `HMAC-SHA256(server secret, identity secret)`,
/// so rotating a user's secret invalidates every token issued for that user.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    pub fn key_for(&self, identity: &Identity) -> Result<Vec<u8>, TokenError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.0).map_err(|_| TokenError::KeyMaterial)?;
        mac.update(identity.secret().as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// HMAC access-token verifier bound to resolved identities.
///
/// - Key material is intentionally not printable via Debug.
/// - Expiry is checked by this type (not jsonwebtoken) so the clock can be injected.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: SigningSecret,
    validation: Validation,
    leeway_seconds: u64,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(
        secret: SigningSecret,
        issuer: Option<&str>,
        audience: Option<&str>,
        leeway_seconds: u64,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = SUPPORTED_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        // set_issuer / set_audience only compare claims that are present
        let mut required = vec!["exp", "sub"];
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }
        match audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                required.push("aud");
            }
            None => validation.validate_aud = false,
        }
        validation.set_required_spec_claims(&required);

        Self {
            secret,
            validation,
            leeway_seconds,
        }
    }

    /// Boolean verdict against the current time.
    pub fn verify(&self, identity: &Identity, token: &BearerToken) -> bool {
        self.verify_at(identity, token, chrono::Utc::now().timestamp())
            .is_ok()
    }

    /// Full verification at `now` (unix seconds).
    ///
    /// Checks, in order:
    /// - the identity is a real one (not the lookup sentinel)
    /// - header algorithm is supported
    /// - signature against the identity-bound key (plus iss/aud when configured)
    /// - `exp` is not before `now - leeway`
    /// - `sub` equals the identity's username
    pub fn verify_at(
        &self,
        identity: &Identity,
        token: &BearerToken,
        now: i64,
    ) -> Result<TokenClaims, TokenError> {
        let username = identity.username().ok_or(TokenError::UnknownIdentity)?;

        let header = jsonwebtoken::decode_header(token.as_str())?;
        if !SUPPORTED_ALGORITHMS.contains(&header.alg) {
            return Err(TokenError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let key = DecodingKey::from_secret(&self.secret.key_for(identity)?);
        let data = jsonwebtoken::decode::<TokenClaims>(token.as_str(), &key, &self.validation)?;
        let claims = data.claims;

        let leeway = i64::try_from(self.leeway_seconds).unwrap_or(i64::MAX);
        if claims.exp < now.saturating_sub(leeway) {
            return Err(TokenError::Expired);
        }

        if claims.sub != username {
            return Err(TokenError::SubjectMismatch);
        }

        Ok(claims)
    }
}


#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

    use super::testing::*;
    use super::*;
    use crate::services::auth::{credential::extract_bearer, identity::Role};

    const NOW: i64 = 1_700_000_000;

    fn alice() -> Identity {
        Identity::new("alice", "$2a$10$alice-hash", [Role::new("ROLE_USER")])
    }

    fn bearer(raw: &str) -> BearerToken {
        extract_bearer(Some(&format!("Bearer {raw}"))).unwrap()
    }

    #[test]
    fn accepts_valid_token_for_identity() {
        let token = mint_with(Algorithm::HS256, &alice(), &claims("alice", NOW + 60));
        let claims = verifier().verify_at(&alice(), &bearer(&token), NOW).unwrap();
        assert_eq!(claims.sub, "alice");
    }

    #[test]
    fn accepts_every_supported_algorithm() {
        for alg in SUPPORTED_ALGORITHMS {
            let token = mint_with(alg, &alice(), &claims("alice", NOW + 60));
            assert!(
                verifier().verify_at(&alice(), &bearer(&token), NOW).is_ok(),
                "{alg:?}"
            );
        }
    }

    #[test]
    fn verify_uses_current_time() {
        let token = mint(&alice(), "alice");
        assert!(verifier().verify(&alice(), &bearer(&token)));
    }

    #[test]
    fn expiry_is_exact_without_leeway() {
        let token = mint_with(Algorithm::HS256, &alice(), &claims("alice", NOW));
        let token = bearer(&token);

        assert!(verifier().verify_at(&alice(), &token, NOW).is_ok());
        assert!(matches!(
            verifier().verify_at(&alice(), &token, NOW + 1),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn configured_leeway_extends_expiry() {
        let verifier = TokenVerifier::new(SigningSecret::new(TEST_SECRET), None, None, 30);
        let token = mint_with(Algorithm::HS256, &alice(), &claims("alice", NOW));
        let token = bearer(&token);

        assert!(verifier.verify_at(&alice(), &token, NOW + 30).is_ok());
        assert!(verifier.verify_at(&alice(), &token, NOW + 31).is_err());
    }

    #[test]
    fn rejects_signature_from_other_identity_secret() {
        let mallory = Identity::new("alice", "attacker-chosen-hash", []);
        let token = mint_with(Algorithm::HS256, &mallory, &claims("alice", NOW + 60));

        assert!(matches!(
            verifier().verify_at(&alice(), &bearer(&token), NOW),
            Err(TokenError::Jwt(_))
        ));
    }

    #[test]
    fn rejects_signature_from_other_server_secret() {
        let other = TokenVerifier::new(SigningSecret::new("another-secret"), None, None, 0);
        let token = mint_with(Algorithm::HS256, &alice(), &claims("alice", NOW + 60));

        assert!(other.verify_at(&alice(), &bearer(&token), NOW).is_err());
    }

    #[test]
    fn binds_subject_to_resolved_identity() {
        // Token for "bob" signed with alice's key must not authenticate alice.
        let token = mint_with(Algorithm::HS256, &alice(), &claims("bob", NOW + 60));
        assert!(matches!(
            verifier().verify_at(&alice(), &bearer(&token), NOW),
            Err(TokenError::SubjectMismatch)
        ));
    }

    #[test]
    fn sentinel_identity_never_verifies() {
        let unknown = Identity::unknown();
        let token = mint_with(Algorithm::HS256, &unknown, &claims("ghost", NOW + 60));
        assert!(matches!(
            verifier().verify_at(&unknown, &bearer(&token), NOW),
            Err(TokenError::UnknownIdentity)
        ));
    }

    #[test]
    fn rejects_unsupported_algorithms() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"alice","exp":9999999999}"#);
        for alg in ["none", "RS256", "ES256", "XX999"] {
            let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"{alg}","typ":"JWT"}}"#));
            let raw = format!("{header}.{payload}.c2ln");
            assert!(
                verifier().verify_at(&alice(), &bearer(&raw), NOW).is_err(),
                "{alg}"
            );
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(!verifier().verify(&alice(), &bearer("definitely.not.ajwt")));
        assert!(!verifier().verify(&alice(), &bearer("garbage")));
    }

    #[test]
    fn checks_issuer_and_audience_when_configured() {
        let verifier = TokenVerifier::new(
            SigningSecret::new(TEST_SECRET),
            Some("quiz-auth"),
            Some("quiz-api"),
            0,
        );

        let mut good = claims("alice", NOW + 60);
        good.iss = Some("quiz-auth".into());
        good.aud = Some(serde_json::json!(["quiz-api"]));
        let token = mint_with(Algorithm::HS256, &alice(), &good);
        assert!(verifier.verify_at(&alice(), &bearer(&token), NOW).is_ok());

        let mut wrong_iss = good.clone();
        wrong_iss.iss = Some("someone-else".into());
        let token = mint_with(Algorithm::HS256, &alice(), &wrong_iss);
        assert!(verifier.verify_at(&alice(), &bearer(&token), NOW).is_err());

        let mut no_aud = good.clone();
        no_aud.aud = None;
        let token = mint_with(Algorithm::HS256, &alice(), &no_aud);
        assert!(verifier.verify_at(&alice(), &bearer(&token), NOW).is_err());

        let mut no_iss = good.clone();
        no_iss.iss = None;
        let token = mint_with(Algorithm::HS256, &alice(), &no_iss);
        assert!(verifier.verify_at(&alice(), &bearer(&token), NOW).is_err());

        // Neither claim present.
        let token = mint_with(Algorithm::HS256, &alice(), &claims("alice", NOW + 60));
        assert!(verifier.verify_at(&alice(), &bearer(&token), NOW).is_err());
    }

    #[test]
    fn issuer_alone_is_required_when_configured() {
        let verifier =
            TokenVerifier::new(SigningSecret::new(TEST_SECRET), Some("quiz-auth"), None, 0);

        let token = mint_with(Algorithm::HS256, &alice(), &claims("alice", NOW + 60));
        assert!(verifier.verify_at(&alice(), &bearer(&token), NOW).is_err());

        let mut with_iss = claims("alice", NOW + 60);
        with_iss.iss = Some("quiz-auth".into());
        let token = mint_with(Algorithm::HS256, &alice(), &with_iss);
        assert!(verifier.verify_at(&alice(), &bearer(&token), NOW).is_ok());
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", verifier());
        assert!(!rendered.contains(TEST_SECRET));
    }
}
