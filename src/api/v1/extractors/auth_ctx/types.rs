/*
 * Responsibility
 * - The authenticated context as seen by handlers
 * - The edge middleware verifies the token and stores this in request extensions;
 *   handlers only ever receive this type (never the raw token or its claims)
 */
use serde::Serialize;
use std::collections::BTreeSet;

use crate::services::auth::{Principal, identity::Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthCtx {
    pub username: String,
    pub authorities: BTreeSet<Role>,
}

impl From<Principal> for AuthCtx {
    fn from(principal: Principal) -> Self {
        Self {
            username: principal.username,
            authorities: principal.authorities,
        }
    }
}
