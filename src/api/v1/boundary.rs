/*
 * Responsibility
 * - In-service authorization at the endpoint boundary
 * - Two-tier mapping: no valid username -> 401, business failure -> generic 400
 */
use std::fmt::Display;

use crate::error::AppError;
use crate::services::auth::ServiceGate;

/// Run `op` for the username authorized by `header_value`.
///
/// The business error is logged but never surfaced; callers get a bare 400.
pub fn guarded<T, E, F>(gate: &ServiceGate, header_value: Option<&str>, op: F) -> Result<T, AppError>
where
    E: Display,
    F: FnOnce(&str) -> Result<T, E>,
{
    let Some(username) = gate.authorize(header_value) else {
        return Err(AppError::Unauthorized);
    };

    op(&username).map_err(|e| {
        tracing::info!(user = %username, error = %e, "request failed after authorization");
        AppError::BadRequest
    })
}
