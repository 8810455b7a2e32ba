//! WebAuthn Bridge Host
//!
//! Exposes the WebAuthn bridge to a web layer as a named plugin:
//!
//! - `WebAuthn.isAvailable()` - `{ "available": bool }`
//! - `WebAuthn.startRegistration(options)` - registration response or rejection
//! - `WebAuthn.startAuthentication(options)` - authentication response or rejection
//!
//! Calls arrive as JSON lines on a byte stream (stdin for the binary) and
//! each is answered with exactly one `resolved` or `rejected` line.

pub mod config;
pub mod fixtures;
pub mod logging;
pub mod plugin;
pub mod transport;

pub use config::{ConfigError, HostConfig};
pub use fixtures::FixtureScript;
pub use plugin::{Plugin, PluginCall, PluginRegistry, PluginRegistryBuilder, WebAuthnPlugin};
pub use transport::{serve, CallMessage, ResponseMessage, TransportError};
