/*
 * Responsibility
 * - Response DTOs for the authenticated-session endpoints
 * - Only username / authorities; never the token or its claims
 */
use serde::Serialize;

use crate::api::v1::extractors::AuthCtx;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub username: String,
    pub authorities: Vec<String>,
}

impl From<AuthCtx> for MeResponse {
    fn from(ctx: AuthCtx) -> Self {
        Self {
            username: ctx.username,
            authorities: ctx
                .authorities
                .into_iter()
                .map(|role| role.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub username: String,
}
