//! Request translation
//!
//! The caller's options document is handed to the platform as-is. The only
//! checks made here are that it parses and that it is a JSON object; anything
//! else is rejected before any native call is attempted.

use serde_json::Value;
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::types::{CredentialRequest, OperationKind};

const NOT_AN_OBJECT: &str = "request must be a JSON object";

/// Build a native request for `kind` from the raw caller JSON
///
/// # Returns
/// * `Ok(CredentialRequest)` - wrapping the original, unmodified string
/// * `Err(BridgeError::MalformedRequest)` - if the input is empty, not JSON,
///   or not a JSON object
pub fn translate(kind: OperationKind, raw: &str) -> Result<CredentialRequest> {
    if raw.trim().is_empty() {
        return Err(BridgeError::MalformedRequest("request body is empty".into()));
    }

    let parsed: Value =
        serde_json::from_str(raw).map_err(|e| BridgeError::MalformedRequest(e.to_string()))?;
    if !parsed.is_object() {
        return Err(BridgeError::MalformedRequest(NOT_AN_OBJECT.into()));
    }

    debug!(operation = %kind, request = raw, "Translating credential request");
    if let Some(user) = parsed.get("user") {
        debug!(
            operation = %kind,
            user_name = user.get("name").and_then(|v| v.as_str()),
            user_display_name = user.get("displayName").and_then(|v| v.as_str()),
            "Request names a user"
        );
    }

    Ok(match kind {
        OperationKind::Registration => CredentialRequest::Registration(raw.to_string()),
        OperationKind::Authentication => CredentialRequest::Authentication(raw.to_string()),
    })
}
