//! Edge authentication: bearer token → `AuthCtx` in request extensions.
//!
//! Outcomes of the edge gate:
//! - not a bearer credential: request continues anonymously (routes that need a
//!   principal answer 401 through `AuthCtxExtractor`)
//! - rejected: 401 with the uniform "Invalid credentials" body
//! - authenticated: the principal is inserted as `AuthCtx` for the extractor

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{AuthenticationResult, credential};
use crate::state::AppState;

/// Attach the edge gate to every route of `router`.
///
/// ```ignore
/// let v1 = middleware::auth::access::apply(api::v1::routes(), state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // from_fn cannot supply State; pass it explicitly
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let outcome = state
        .edge_gate
        .authenticate(credential::authorization_header(req.headers()))
        .await;

    match outcome {
        None => {}
        Some(AuthenticationResult::Authenticated(principal)) => {
            tracing::debug!(user = %principal.username, "request authenticated");
            req.extensions_mut().insert(AuthCtx::from(principal));
        }
        Some(AuthenticationResult::Rejected(rejection)) => {
            tracing::warn!(
                cause = ?rejection.cause(),
                method = %req.method(),
                path = %req.uri().path(),
                "bearer credential rejected"
            );
            return Err(AppError::Unauthorized);
        }
    }

    Ok(next.run(req).await)
}
