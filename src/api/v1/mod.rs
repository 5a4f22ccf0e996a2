/*
 * Responsibility
 * - v1 public surface (routes(), service_routes())
 */
pub mod boundary;
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::{routes, service_routes};
