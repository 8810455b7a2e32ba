//! Fixture scripts for the simulated platform
//!
//! ```json
//! {
//!   "create": [{"outcome": "fail", "error": {"type_name": "X", "message": "cancelled"}}],
//!   "get": [{"outcome": "succeed", "response": {"credential": {"type": "publicKey", "authenticationResponseJson": "{}"}}}]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use webauthn_bridge::platforms::{Scripted, SimulatedCredentialManager};
use webauthn_bridge::{CreateCredentialResponse, GetCredentialResponse};

use crate::config::ConfigError;

/// Scripted platform reactions, consumed in order per operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureScript {
    #[serde(default)]
    pub create: Vec<Scripted<CreateCredentialResponse>>,
    #[serde(default)]
    pub get: Vec<Scripted<GetCredentialResponse>>,
}

impl FixtureScript {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FixtureRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents).map_err(|source| ConfigError::FixtureParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Queue every step onto a simulator
    pub fn install(self, manager: &SimulatedCredentialManager) {
        for step in self.create {
            manager.push_create(step);
        }
        for step in self.get {
            manager.push_get(step);
        }
    }
}
