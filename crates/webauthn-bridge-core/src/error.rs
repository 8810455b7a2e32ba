//! Error types for the WebAuthn bridge
//!
//! Every variant renders to a non-empty message suitable for rejecting the
//! caller's pending call directly.

use thiserror::Error;

use crate::types::{CredentialKind, OperationKind};

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Fixed guidance shown when no passkey provider can serve the request
pub const NO_PROVIDERS_MESSAGE: &str =
    "No passkey providers available. Please ensure you have a compatible authenticator.";

/// Why a nominally successful result was unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadDefect {
    /// The response document was null or empty
    Missing,
    /// The response document was not a JSON object
    Unparsable,
}

/// Errors that can reject a bridge call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Caller JSON did not parse; detected before any native call
    #[error("Invalid request format: {0}")]
    MalformedRequest(String),

    /// The platform refused to start the operation
    #[error("{operation} failed: {message}")]
    PlatformRejected {
        operation: OperationKind,
        message: String,
    },

    /// The user dismissed the platform prompt
    #[error("{0} was cancelled by the user")]
    UserCancelled(OperationKind),

    /// No credential provider or authenticator can serve the request
    #[error("{}", NO_PROVIDERS_MESSAGE)]
    NoProvidersAvailable,

    /// The platform returned something other than a public-key credential
    #[error("Unexpected credential type: {0}")]
    UnexpectedCredentialType(CredentialKind),

    /// The platform succeeded but produced no usable response document
    #[error("{}", payload_message(.operation, .defect))]
    NoResponsePayload {
        operation: OperationKind,
        defect: PayloadDefect,
    },

    /// The completion handler was dropped without either path firing
    #[error("{0} failed: the platform dropped the request without completing it")]
    Abandoned(OperationKind),

    /// Any unclassified platform failure, message preserved verbatim
    #[error("{0}")]
    Generic(String),
}

fn payload_message(operation: &OperationKind, defect: &PayloadDefect) -> String {
    match defect {
        PayloadDefect::Missing => format!("No {} response found", operation.noun()),
        PayloadDefect::Unparsable => format!("Failed to parse {} response", operation.noun()),
    }
}

impl BridgeError {
    /// Short, stable code for logs and structured responses
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::MalformedRequest(_) => "MALFORMED_REQUEST",
            BridgeError::PlatformRejected { .. } => "PLATFORM_REJECTED",
            BridgeError::UserCancelled(_) => "USER_CANCELLED",
            BridgeError::NoProvidersAvailable => "NO_PROVIDERS_AVAILABLE",
            BridgeError::UnexpectedCredentialType(_) => "UNEXPECTED_CREDENTIAL_TYPE",
            BridgeError::NoResponsePayload { .. } => "NO_RESPONSE_PAYLOAD",
            BridgeError::Abandoned(_) => "ABANDONED",
            BridgeError::Generic(_) => "GENERIC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            BridgeError::MalformedRequest("expected value at line 1 column 1".into()).to_string(),
            "Invalid request format: expected value at line 1 column 1"
        );
        assert_eq!(
            BridgeError::PlatformRejected {
                operation: OperationKind::Authentication,
                message: "activity is finishing".into(),
            }
            .to_string(),
            "Authentication failed: activity is finishing"
        );
        assert_eq!(
            BridgeError::UserCancelled(OperationKind::Authentication).to_string(),
            "Authentication was cancelled by the user"
        );
        assert_eq!(BridgeError::NoProvidersAvailable.to_string(), NO_PROVIDERS_MESSAGE);
        assert_eq!(
            BridgeError::UnexpectedCredentialType(CredentialKind::Password).to_string(),
            "Unexpected credential type: password credential"
        );
        assert_eq!(
            BridgeError::Generic("Something broke".into()).to_string(),
            "Something broke"
        );
    }

    #[test]
    fn test_payload_messages() {
        let missing = BridgeError::NoResponsePayload {
            operation: OperationKind::Registration,
            defect: PayloadDefect::Missing,
        };
        assert_eq!(missing.to_string(), "No registration response found");

        let garbled = BridgeError::NoResponsePayload {
            operation: OperationKind::Authentication,
            defect: PayloadDefect::Unparsable,
        };
        assert_eq!(garbled.to_string(), "Failed to parse authentication response");
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            BridgeError::MalformedRequest(String::new()),
            BridgeError::PlatformRejected {
                operation: OperationKind::Registration,
                message: String::new(),
            },
            BridgeError::UserCancelled(OperationKind::Registration),
            BridgeError::NoProvidersAvailable,
            BridgeError::UnexpectedCredentialType(CredentialKind::Password),
            BridgeError::NoResponsePayload {
                operation: OperationKind::Registration,
                defect: PayloadDefect::Missing,
            },
            BridgeError::Abandoned(OperationKind::Registration),
            BridgeError::Generic(String::new()),
        ];
        let mut codes: Vec<_> = errors.iter().map(BridgeError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
