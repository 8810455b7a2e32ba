//! Credential manager implementations

pub mod simulated;

pub use simulated::{Scripted, SimulatedCredentialManager};
