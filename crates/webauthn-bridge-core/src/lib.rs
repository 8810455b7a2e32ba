//! # WebAuthn Bridge Core
//!
//! Synchronous building blocks for bridging a WebView to a platform's native
//! public-key credential (passkey) subsystem.
//!
//! ## Pipeline
//!
//! Every call flows one way:
//!
//! 1. **Translate**: the caller's JSON is checked for syntax and wrapped,
//!    unmodified, in a [`CredentialRequest`]
//! 2. **Native call**: performed by the async bridge (see the `webauthn-bridge` crate)
//! 3. **Normalize**: the native result or failure becomes either a JSON
//!    object or a [`BridgeError`] carrying a stable, human-readable message
//!
//! Nothing in this crate performs the WebAuthn ceremony itself. Challenges,
//! attestation and signatures belong to the platform and the relying party.

pub mod classify;
pub mod error;
pub mod normalize;
pub mod translate;
pub mod types;

pub use classify::{classify, ClassifierPatterns, ErrorClassification};
pub use error::{BridgeError, PayloadDefect, Result, NO_PROVIDERS_MESSAGE};
pub use normalize::{normalize_failure, normalize_success};
pub use translate::translate;
pub use types::{
    Availability, BridgeOutcome, CredentialKind, CredentialRequest, CredentialResult,
    OperationKind, PlatformError, PlatformInfo, MIN_SUPPORTED_API_LEVEL,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
