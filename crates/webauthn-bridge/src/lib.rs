//! WebAuthn Bridge
//!
//! Bridges a callback-based native credential manager to single-resolution
//! async calls.
//!
//! ## Architecture
//!
//! - [`platform`]: the native contract ([`CredentialManager`]), the execution
//!   context callbacks are delivered on ([`Executor`]) and the native
//!   request/response shapes
//! - [`completion`]: a per-call promise that settles exactly once
//! - [`bridge`]: the caller-facing [`WebAuthnBridge`]
//! - [`platforms`]: platform implementations (currently a scripted simulator)
//!
//! ## Usage
//!
//! ```ignore
//! use webauthn_bridge::{platforms::SimulatedCredentialManager, WebAuthnBridgeBuilder};
//!
//! let bridge = WebAuthnBridgeBuilder::new(Arc::new(SimulatedCredentialManager::new()))
//!     .executor(Arc::new(MainLoopExecutor::spawn()))
//!     .build();
//!
//! let response = bridge.start_registration(options_json).await?;
//! ```

pub mod bridge;
pub mod completion;
pub mod platform;
pub mod platforms;

pub use bridge::{WebAuthnBridge, WebAuthnBridgeBuilder};
pub use completion::{pending_call, CallState, Completion, PendingCall};
pub use platform::{
    CreateCredentialResponse, CreatePublicKeyCredentialRequest, Credential, CredentialCallback,
    CredentialManager, Executor, GetCredentialRequest, GetCredentialResponse, InlineExecutor,
    MainLoopExecutor, Task,
};

pub use webauthn_bridge_core::{
    Availability, BridgeError, BridgeOutcome, ClassifierPatterns, OperationKind, PlatformError,
    PlatformInfo, Result,
};
