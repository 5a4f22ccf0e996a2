/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 * - Cheap to Clone (Arc inside)
 */
use std::sync::Arc;

use crate::services::auth::{EdgeGate, ServiceGate, factory::AuthGates};

#[derive(Clone, Debug)]
pub struct AppState {
    pub edge_gate: Arc<EdgeGate>,
    pub service_gate: Arc<ServiceGate>,
}

impl AppState {
    pub fn new(gates: AuthGates) -> Self {
        Self {
            edge_gate: gates.edge,
            service_gate: gates.service,
        }
    }
}
