//! Native failure classification
//!
//! Platform credential managers report failures as exceptions whose only
//! stable-ish surface is an English message. The rules here reduce that
//! surface to three outcomes, first match wins:
//!
//! 1. a cancellation indicator → [`ErrorClassification::UserCancelled`]
//! 2. a "no provider" indicator → [`ErrorClassification::NoProvidersAvailable`]
//! 3. anything else → [`ErrorClassification::Generic`] with the message verbatim
//!
//! The substrings vary across platform library releases and locales, so they
//! are held in [`ClassifierPatterns`] rather than hard-coded in the matcher.

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::types::{OperationKind, PlatformError};

/// Substrings the Android credential manager uses for user dismissal
pub const DEFAULT_CANCELLATION_PATTERNS: &[&str] = &["cancelled", "Cancel"];

/// Substrings the Android credential manager uses when no provider can serve a create
pub const DEFAULT_NO_PROVIDER_PATTERNS: &[&str] = &["No create options"];

/// Message substrings driving classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierPatterns {
    /// Case-sensitive substrings marking a user cancellation
    #[serde(default)]
    pub cancellation: Vec<String>,
    /// Case-sensitive substrings marking "no credential provider available"
    #[serde(default)]
    pub no_providers: Vec<String>,
}

impl Default for ClassifierPatterns {
    fn default() -> Self {
        Self {
            cancellation: DEFAULT_CANCELLATION_PATTERNS.iter().map(|s| s.to_string()).collect(),
            no_providers: DEFAULT_NO_PROVIDER_PATTERNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ClassifierPatterns {
    /// Replace the cancellation substrings
    pub fn with_cancellation(mut self, patterns: Vec<String>) -> Self {
        self.cancellation = patterns;
        self
    }

    /// Replace the no-provider substrings
    pub fn with_no_providers(mut self, patterns: Vec<String>) -> Self {
        self.no_providers = patterns;
        self
    }

    /// Classify a native failure. Never panics.
    pub fn classify(&self, error: &PlatformError) -> ErrorClassification {
        let message = error.message_or_unknown();

        if contains_any(message, &self.cancellation) {
            ErrorClassification::UserCancelled
        } else if contains_any(message, &self.no_providers) {
            ErrorClassification::NoProvidersAvailable
        } else {
            ErrorClassification::Generic(message.to_string())
        }
    }
}

fn contains_any(message: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|pattern| !pattern.is_empty() && message.contains(pattern.as_str()))
}

/// User-facing category of a native failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorClassification {
    UserCancelled,
    NoProvidersAvailable,
    /// Unrecognised failure; holds the original (non-empty) message
    Generic(String),
}

impl ErrorClassification {
    /// Turn the classification into the error that rejects the caller
    pub fn into_error(self, operation: OperationKind) -> BridgeError {
        match self {
            ErrorClassification::UserCancelled => BridgeError::UserCancelled(operation),
            ErrorClassification::NoProvidersAvailable => BridgeError::NoProvidersAvailable,
            ErrorClassification::Generic(message) => BridgeError::Generic(message),
        }
    }
}

/// Classify with the default patterns
pub fn classify(error: &PlatformError) -> ErrorClassification {
    ClassifierPatterns::default().classify(error)
}
