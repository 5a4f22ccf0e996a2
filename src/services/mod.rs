/*
 * Responsibility
 * - Domain services (authentication gate, identity lookup)
 */
pub mod auth;
