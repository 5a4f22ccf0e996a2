/*
 * Responsibility
 * - GET /api/v1/me: principal authenticated by the edge gate
 * - GET /svc/v1/whoami: username authorized by the in-service gate
 */
use std::convert::Infallible;

use axum::{Json, extract::State, http::HeaderMap};

use crate::{
    api::v1::{
        boundary::guarded,
        dto::session::{MeResponse, WhoAmIResponse},
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    services::auth::credential::authorization_header,
    state::AppState,
};

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse::from(ctx))
}

pub async fn whoami(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<WhoAmIResponse>, AppError> {
    let res = guarded(
        &state.service_gate,
        authorization_header(&headers),
        |username| {
            Ok::<_, Infallible>(WhoAmIResponse {
                username: username.to_string(),
            })
        },
    )?;

    Ok(Json(res))
}
