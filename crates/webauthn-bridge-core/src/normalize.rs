//! Response and error normalisation
//!
//! Success results are discriminated by credential kind with an exhaustive
//! match: only a public-key credential carrying a JSON object resolves the
//! caller. Failures go through [`ClassifierPatterns`].

use serde_json::Value;
use tracing::{debug, warn};

use crate::classify::ClassifierPatterns;
use crate::error::{BridgeError, PayloadDefect, Result};
use crate::types::{CredentialResult, OperationKind, PlatformError};

/// Extract the caller-facing response document from a native success
pub fn normalize_success(operation: OperationKind, result: CredentialResult) -> Result<Value> {
    match result {
        CredentialResult::PublicKeyCredential(payload) => {
            let payload = match payload {
                Some(json) if !json.trim().is_empty() => json,
                _ => {
                    warn!(operation = %operation, "No response JSON found in the result");
                    return Err(BridgeError::NoResponsePayload {
                        operation,
                        defect: PayloadDefect::Missing,
                    });
                }
            };

            match serde_json::from_str::<Value>(&payload) {
                Ok(value @ Value::Object(_)) => {
                    debug!(operation = %operation, "Credential response extracted");
                    Ok(value)
                }
                Ok(_) => {
                    warn!(operation = %operation, "Response JSON is not an object");
                    Err(BridgeError::NoResponsePayload {
                        operation,
                        defect: PayloadDefect::Unparsable,
                    })
                }
                Err(e) => {
                    warn!(operation = %operation, error = %e, "Failed to parse response JSON");
                    Err(BridgeError::NoResponsePayload {
                        operation,
                        defect: PayloadDefect::Unparsable,
                    })
                }
            }
        }
        CredentialResult::OtherCredentialType(kind) => {
            warn!(
                operation = %operation,
                kind = %kind,
                "Unexpected credential type returned for passkey request"
            );
            Err(BridgeError::UnexpectedCredentialType(kind))
        }
    }
}

/// Map a native failure onto the caller-facing error vocabulary
pub fn normalize_failure(
    operation: OperationKind,
    error: &PlatformError,
    patterns: &ClassifierPatterns,
) -> BridgeError {
    let classification = patterns.classify(error);
    let normalized = classification.into_error(operation);

    warn!(
        operation = %operation,
        error_type = %error.type_name,
        error = %normalized,
        "Credential operation failed"
    );

    normalized
}
