pub mod credential;
pub mod factory;
pub mod gate;
pub mod identity;
pub mod token;
pub mod verifier;

pub use factory::build_gates;
pub use gate::{AuthenticationResult, EdgeGate, Principal, ServiceGate};
