//! Call-scoped data model
//!
//! All values here live for a single bridge call and are discarded once the
//! caller has been resolved or rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

/// First platform API level that ships the native credential manager
pub const MIN_SUPPORTED_API_LEVEL: u32 = 28;

/// The two ceremonies the bridge can forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Credential creation (`navigator.credentials.create`)
    Registration,
    /// Assertion (`navigator.credentials.get`)
    Authentication,
}

impl OperationKind {
    /// Lowercase noun used inside payload messages
    pub fn noun(&self) -> &'static str {
        match self {
            OperationKind::Registration => "registration",
            OperationKind::Authentication => "authentication",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Registration => write!(f, "Registration"),
            OperationKind::Authentication => write!(f, "Authentication"),
        }
    }
}

/// A translated request, ready to hand to the native credential manager
///
/// The wrapped document is the caller's JSON exactly as supplied. It is
/// believed to be `PublicKeyCredentialCreationOptions` (registration) or
/// `PublicKeyCredentialRequestOptions` (authentication); field-level
/// validation is left to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialRequest {
    Registration(String),
    Authentication(String),
}

impl CredentialRequest {
    /// Which ceremony this request drives
    pub fn kind(&self) -> OperationKind {
        match self {
            CredentialRequest::Registration(_) => OperationKind::Registration,
            CredentialRequest::Authentication(_) => OperationKind::Authentication,
        }
    }

    /// The untouched request document
    pub fn json(&self) -> &str {
        match self {
            CredentialRequest::Registration(json) | CredentialRequest::Authentication(json) => json,
        }
    }
}

/// Concrete credential kinds a platform may hand back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialKind {
    PublicKey,
    Password,
    /// Any other platform credential type, identified by its type name
    Other(String),
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialKind::PublicKey => write!(f, "public key credential"),
            CredentialKind::Password => write!(f, "password credential"),
            CredentialKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// What the platform produced on its success path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialResult {
    /// A passkey result carrying the embedded response document, if any
    PublicKeyCredential(Option<String>),
    /// Anything that is not a public-key credential
    OtherCredentialType(CredentialKind),
}

/// The native exception surface: type name plus optional message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformError {
    /// Platform type name of the failure (e.g. `CreateCredentialCancellationException`)
    pub type_name: String,
    /// Human-readable message, when the platform supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PlatformError {
    /// Create a platform error with a message
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: Some(message.into()),
        }
    }

    /// Create a platform error that carries no message
    pub fn without_message(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: None,
        }
    }

    /// The message, or `"Unknown error"` when absent or empty
    pub fn message_or_unknown(&self) -> &str {
        match self.message.as_deref() {
            Some(msg) if !msg.is_empty() => msg,
            _ => "Unknown error",
        }
    }
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message_or_unknown())
    }
}

/// Static description of the host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformInfo {
    /// Platform API level the bridge is running on
    pub api_level: u32,
    /// Lowest API level considered capable
    pub min_api_level: u32,
}

impl PlatformInfo {
    pub fn new(api_level: u32) -> Self {
        Self {
            api_level,
            min_api_level: MIN_SUPPORTED_API_LEVEL,
        }
    }

    pub fn with_min_api_level(mut self, min_api_level: u32) -> Self {
        self.min_api_level = min_api_level;
        self
    }

    pub fn supports_passkeys(&self) -> bool {
        self.api_level >= self.min_api_level
    }
}

/// Result of the `isAvailable` check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
}

/// The single terminal state delivered back to a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeOutcome {
    Resolved(Value),
    Rejected(String),
}

impl BridgeOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, BridgeOutcome::Resolved(_))
    }
}

impl From<Result<Value, BridgeError>> for BridgeOutcome {
    fn from(result: Result<Value, BridgeError>) -> Self {
        match result {
            Ok(value) => BridgeOutcome::Resolved(value),
            Err(err) => BridgeOutcome::Rejected(err.to_string()),
        }
    }
}
