//! Plugin calls and the plugin registry
//!
//! A [`PluginCall`] is the host's view of one call from the web layer. It is
//! answered exactly once: `resolve` and `reject` consume it, and dropping an
//! unanswered call rejects it.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use webauthn_bridge::{BridgeOutcome, WebAuthnBridge};

/// Rejection used when a call is dropped without an answer
pub const DROPPED_CALL_MESSAGE: &str = "Call dropped without response";

/// One pending call from the web layer
#[derive(Debug)]
pub struct PluginCall {
    data: Value,
    responder: Option<oneshot::Sender<BridgeOutcome>>,
}

impl PluginCall {
    /// Create a call and the receiver its single outcome arrives on
    pub fn new(data: Value) -> (Self, oneshot::Receiver<BridgeOutcome>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                data,
                responder: Some(tx),
            },
            rx,
        )
    }

    /// Call arguments as sent by the web layer
    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn resolve(mut self, value: Value) {
        self.respond(BridgeOutcome::Resolved(value));
    }

    pub fn reject(mut self, message: impl Into<String>) {
        self.respond(BridgeOutcome::Rejected(message.into()));
    }

    fn respond(&mut self, outcome: BridgeOutcome) {
        if let Some(tx) = self.responder.take() {
            if tx.send(outcome).is_err() {
                debug!("Caller went away before the call was answered");
            }
        }
    }
}

impl Drop for PluginCall {
    fn drop(&mut self) {
        if self.responder.is_some() {
            warn!("Plugin call dropped without response");
            self.respond(BridgeOutcome::Rejected(DROPPED_CALL_MESSAGE.into()));
        }
    }
}

/// A named group of methods callable from the web layer
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Name the web layer addresses this plugin by
    fn name(&self) -> &str;

    /// Methods this plugin answers
    fn methods(&self) -> &[&'static str];

    /// Handle one call. Must resolve or reject `call`, or drop it.
    async fn invoke(&self, method: &str, call: PluginCall);
}

/// The WebAuthn plugin: `isAvailable`, `startRegistration`, `startAuthentication`
pub struct WebAuthnPlugin {
    bridge: Arc<WebAuthnBridge>,
}

impl WebAuthnPlugin {
    pub const NAME: &'static str = "WebAuthn";
    const METHODS: &'static [&'static str] =
        &["isAvailable", "startRegistration", "startAuthentication"];

    pub fn new(bridge: Arc<WebAuthnBridge>) -> Self {
        Self { bridge }
    }
}

/// The options document as the bridge expects it: the web layer may send
/// either the options object itself or its JSON serialisation.
fn request_json(data: &Value) -> String {
    match data {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Plugin for WebAuthnPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn methods(&self) -> &[&'static str] {
        Self::METHODS
    }

    async fn invoke(&self, method: &str, call: PluginCall) {
        let result = match method {
            "isAvailable" => {
                serde_json::to_value(self.bridge.is_available()).map_err(|e| e.to_string())
            }
            "startRegistration" => self
                .bridge
                .start_registration(&request_json(call.data()))
                .await
                .map_err(|e| e.to_string()),
            "startAuthentication" => self
                .bridge
                .start_authentication(&request_json(call.data()))
                .await
                .map_err(|e| e.to_string()),
            other => Err(format!("Method {} is not implemented", other)),
        };

        match result {
            Ok(value) => call.resolve(value),
            Err(message) => call.reject(message),
        }
    }
}

/// Plugin Registry - routes calls to plugins by name
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// Register a plugin under its own name
    pub fn register_plugin<P: Plugin + 'static>(&mut self, plugin: P) {
        let name = plugin.name().to_string();
        info!(plugin = %name, methods = ?plugin.methods(), "Registered plugin");
        self.plugins.insert(name, Arc::new(plugin));
    }

    pub fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(name).cloned()
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.keys().cloned().collect()
    }

    /// Route one call and wait for its single outcome
    pub async fn dispatch(&self, plugin: &str, method: &str, data: Value) -> BridgeOutcome {
        let Some(handler) = self.plugins.get(plugin) else {
            warn!(plugin = %plugin, "No plugin registered under this name");
            return BridgeOutcome::Rejected(format!("Plugin {} is not implemented", plugin));
        };

        if !handler.methods().contains(&method) {
            warn!(plugin = %plugin, method = %method, "Unknown plugin method");
            return BridgeOutcome::Rejected(format!("Method {} is not implemented", method));
        }

        debug!(plugin = %plugin, method = %method, "Dispatching plugin call");
        let (call, rx) = PluginCall::new(data);
        handler.invoke(method, call).await;

        rx.await
            .unwrap_or_else(|_| BridgeOutcome::Rejected(DROPPED_CALL_MESSAGE.into()))
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating a PluginRegistry with plugins
pub struct PluginRegistryBuilder {
    registry: PluginRegistry,
}

impl PluginRegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: PluginRegistry::new(),
        }
    }

    pub fn with_plugin<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        self.registry.register_plugin(plugin);
        self
    }

    pub fn build(self) -> PluginRegistry {
        self.registry
    }
}

impl Default for PluginRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use webauthn_bridge::platforms::{Scripted, SimulatedCredentialManager};
    use webauthn_bridge::{CreateCredentialResponse, PlatformInfo, WebAuthnBridgeBuilder};

    struct SilentPlugin;

    #[async_trait]
    impl Plugin for SilentPlugin {
        fn name(&self) -> &str {
            "Silent"
        }

        fn methods(&self) -> &[&'static str] {
            &["ignore"]
        }

        async fn invoke(&self, _method: &str, _call: PluginCall) {}
    }

    fn webauthn_registry(manager: Arc<SimulatedCredentialManager>, api_level: u32) -> PluginRegistry {
        let bridge = WebAuthnBridgeBuilder::new(manager)
            .platform(PlatformInfo::new(api_level))
            .build();
        PluginRegistryBuilder::new()
            .with_plugin(WebAuthnPlugin::new(Arc::new(bridge)))
            .with_plugin(SilentPlugin)
            .build()
    }

    #[tokio::test]
    async fn test_call_answered_once() {
        let (call, rx) = PluginCall::new(json!({}));
        call.resolve(json!({"ok": true}));
        assert_eq!(rx.await.unwrap(), BridgeOutcome::Resolved(json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_dropped_call_rejects() {
        let registry = webauthn_registry(Arc::new(SimulatedCredentialManager::new()), 28);
        let outcome = registry.dispatch("Silent", "ignore", json!({})).await;
        assert_eq!(outcome, BridgeOutcome::Rejected(DROPPED_CALL_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_is_available() {
        let registry = webauthn_registry(Arc::new(SimulatedCredentialManager::new()), 27);
        let outcome = registry.dispatch("WebAuthn", "isAvailable", json!({})).await;
        assert_eq!(outcome, BridgeOutcome::Resolved(json!({"available": false})));
    }

    #[tokio::test]
    async fn test_registration_with_object_and_string_data() {
        let manager = Arc::new(SimulatedCredentialManager::new());
        for _ in 0..2 {
            manager.push_create(Scripted::Succeed {
                response: CreateCredentialResponse::PublicKey {
                    registration_response_json: Some(r#"{"id":"abc"}"#.into()),
                },
            });
        }
        let registry = webauthn_registry(manager.clone(), 28);

        let options = json!({"challenge": "Y2hhbGxlbmdl", "user": {"name": "a", "displayName": "A"}});
        let by_object = registry
            .dispatch("WebAuthn", "startRegistration", options.clone())
            .await;
        let by_string = registry
            .dispatch("WebAuthn", "startRegistration", json!(options.to_string()))
            .await;

        assert_eq!(by_object, BridgeOutcome::Resolved(json!({"id": "abc"})));
        assert_eq!(by_string, by_object);

        let requests = manager.recorded_requests();
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn test_non_object_data_rejected_before_platform() {
        let manager = Arc::new(SimulatedCredentialManager::new());
        let registry = webauthn_registry(manager.clone(), 28);

        for data in [Value::Null, json!(42), json!("[1]"), json!("\"s\"")] {
            let outcome = registry
                .dispatch("WebAuthn", "startRegistration", data)
                .await;
            assert_eq!(
                outcome,
                BridgeOutcome::Rejected(
                    "Invalid request format: request must be a JSON object".into()
                )
            );
        }
        assert_eq!(manager.create_calls(), 0);
        assert!(manager.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_plugin_and_method() {
        let registry = webauthn_registry(Arc::new(SimulatedCredentialManager::new()), 28);

        assert_eq!(
            registry.dispatch("Camera", "takePhoto", json!({})).await,
            BridgeOutcome::Rejected("Plugin Camera is not implemented".into())
        );
        assert_eq!(
            registry.dispatch("WebAuthn", "deleteCredential", json!({})).await,
            BridgeOutcome::Rejected("Method deleteCredential is not implemented".into())
        );
    }

    #[test]
    fn test_registry() {
        let registry = webauthn_registry(Arc::new(SimulatedCredentialManager::new()), 28);
        assert!(registry.has_plugin("WebAuthn"));
        assert!(!registry.has_plugin("Camera"));
        assert_eq!(registry.plugin_names().len(), 2);
        assert!(registry.get_plugin("Silent").is_some());
    }
}
