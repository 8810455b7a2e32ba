//! WebAuthn Bridge - forwards caller requests to the native credential manager

use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use webauthn_bridge_core::{
    normalize_failure, normalize_success, translate, Availability, BridgeError,
    ClassifierPatterns, CredentialRequest, OperationKind, PlatformError, PlatformInfo, Result,
    MIN_SUPPORTED_API_LEVEL,
};

use crate::completion::{pending_call, Completion};
use crate::platform::{
    CreateCredentialResponse, CreatePublicKeyCredentialRequest, CredentialCallback,
    CredentialManager, Executor, GetCredentialRequest, GetCredentialResponse, InlineExecutor,
};

type NativeResult<T> = std::result::Result<T, PlatformError>;

/// WebAuthn Bridge - one instance per process
///
/// Holds the native credential manager and the execution context callbacks
/// are delivered on. Both are read-only capabilities shared by every call;
/// calls share no other state.
pub struct WebAuthnBridge {
    manager: Arc<dyn CredentialManager>,
    executor: Arc<dyn Executor>,
    platform: PlatformInfo,
    patterns: Arc<ClassifierPatterns>,
}

impl WebAuthnBridge {
    /// Static capability check; never touches the credential manager
    pub fn is_available(&self) -> Availability {
        Availability {
            available: self.platform.supports_passkeys(),
        }
    }

    /// Create a passkey from `PublicKeyCredentialCreationOptions` JSON
    pub async fn start_registration(&self, request_json: &str) -> Result<Value> {
        let request = translate(OperationKind::Registration, request_json)?;
        self.call(request).await
    }

    /// Assert a passkey from `PublicKeyCredentialRequestOptions` JSON
    pub async fn start_authentication(&self, request_json: &str) -> Result<Value> {
        let request = translate(OperationKind::Authentication, request_json)?;
        self.call(request).await
    }

    /// Issue an already translated request and wait for its single outcome
    pub async fn call(&self, request: CredentialRequest) -> Result<Value> {
        let operation = request.kind();
        let (pending, completion) = pending_call(operation);

        completion.mark_submitted();
        let submitted = match request {
            CredentialRequest::Registration(json) => self.manager.create_credential(
                CreatePublicKeyCredentialRequest::new(json),
                self.executor.clone(),
                self.create_callback(completion.clone()),
            ),
            CredentialRequest::Authentication(json) => self.manager.get_credential(
                GetCredentialRequest::new(json),
                self.executor.clone(),
                self.get_callback(completion.clone()),
            ),
        };

        if let Err(err) = submitted {
            warn!(
                operation = %operation,
                error_type = %err.type_name,
                error = %err.message_or_unknown(),
                "Platform refused to start credential operation"
            );
            completion.settle(Err(BridgeError::PlatformRejected {
                operation,
                message: err.message_or_unknown().to_string(),
            }));
        }
        // Only the platform's handle may settle from here on
        drop(completion);

        let outcome = pending.wait().await;
        match &outcome {
            Ok(_) => info!(operation = %operation, "Credential operation succeeded"),
            Err(e) => warn!(
                operation = %operation,
                code = e.code(),
                error = %e,
                "Credential operation rejected"
            ),
        }
        outcome
    }

    fn create_callback(&self, completion: Completion) -> CredentialCallback<CreateCredentialResponse> {
        let patterns = self.patterns.clone();
        CredentialCallback::new(move |result: NativeResult<CreateCredentialResponse>| {
            let outcome = match result {
                Ok(response) => normalize_success(
                    OperationKind::Registration,
                    response.into_credential_result(),
                ),
                Err(err) => Err(normalize_failure(OperationKind::Registration, &err, &patterns)),
            };
            completion.settle(outcome);
        })
    }

    fn get_callback(&self, completion: Completion) -> CredentialCallback<GetCredentialResponse> {
        let patterns = self.patterns.clone();
        CredentialCallback::new(move |result: NativeResult<GetCredentialResponse>| {
            let outcome = match result {
                Ok(response) => normalize_success(
                    OperationKind::Authentication,
                    response.into_credential_result(),
                ),
                Err(err) => Err(normalize_failure(OperationKind::Authentication, &err, &patterns)),
            };
            completion.settle(outcome);
        })
    }

    pub fn platform(&self) -> PlatformInfo {
        self.platform
    }

    pub fn patterns(&self) -> &ClassifierPatterns {
        &self.patterns
    }
}

/// Builder for creating a WebAuthnBridge
pub struct WebAuthnBridgeBuilder {
    manager: Arc<dyn CredentialManager>,
    executor: Arc<dyn Executor>,
    platform: PlatformInfo,
    patterns: ClassifierPatterns,
}

impl WebAuthnBridgeBuilder {
    /// Start from a credential manager; callbacks run inline until an executor is set
    pub fn new(manager: Arc<dyn CredentialManager>) -> Self {
        Self {
            manager,
            executor: Arc::new(InlineExecutor),
            platform: PlatformInfo::new(MIN_SUPPORTED_API_LEVEL),
            patterns: ClassifierPatterns::default(),
        }
    }

    /// Set the execution context completion handlers are delivered on
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    /// Describe the platform for the availability check
    pub fn platform(mut self, platform: PlatformInfo) -> Self {
        self.platform = platform;
        self
    }

    /// Override the failure classification substrings
    pub fn patterns(mut self, patterns: ClassifierPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn build(self) -> WebAuthnBridge {
        info!(
            platform = self.manager.description(),
            api_level = self.platform.api_level,
            min_api_level = self.platform.min_api_level,
            "WebAuthn bridge ready"
        );
        WebAuthnBridge {
            manager: self.manager,
            executor: self.executor,
            platform: self.platform,
            patterns: Arc::new(self.patterns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Credential;
    use crate::platforms::{Scripted, SimulatedCredentialManager};
    use serde_json::json;
    use webauthn_bridge_core::NO_PROVIDERS_MESSAGE;

    const REGISTRATION: &str = r#"{"challenge":"Y2hhbGxlbmdl","rp":{"name":"Example"},"user":{"id":"dXNlcg","name":"a","displayName":"A"},"pubKeyCredParams":[{"type":"public-key","alg":-7}]}"#;
    const AUTHENTICATION: &str = r#"{"challenge":"Y2hhbGxlbmdl","rpId":"example.com"}"#;

    fn bridge(manager: Arc<SimulatedCredentialManager>) -> WebAuthnBridge {
        WebAuthnBridgeBuilder::new(manager).build()
    }

    #[tokio::test]
    async fn test_registration_success() {
        let manager = Arc::new(SimulatedCredentialManager::new());
        manager.push_create(Scripted::Succeed {
            response: CreateCredentialResponse::PublicKey {
                registration_response_json: Some(r#"{"id":"abc","type":"public-key"}"#.into()),
            },
        });

        let result = bridge(manager.clone()).start_registration(REGISTRATION).await;

        assert_eq!(result, Ok(json!({"id": "abc", "type": "public-key"})));
        assert_eq!(manager.recorded_requests(), vec![REGISTRATION.to_string()]);
    }

    #[tokio::test]
    async fn test_authentication_password_credential() {
        let manager = Arc::new(SimulatedCredentialManager::new());
        manager.push_get(Scripted::Succeed {
            response: GetCredentialResponse::new(Credential::Password { id: "alice".into() }),
        });

        let err = bridge(manager).start_authentication(AUTHENTICATION).await.unwrap_err();
        assert_eq!(err.to_string(), "Unexpected credential type: password credential");
    }

    #[tokio::test]
    async fn test_malformed_request_skips_platform() {
        let manager = Arc::new(SimulatedCredentialManager::new());

        let err = bridge(manager.clone()).start_registration("{oops").await.unwrap_err();

        assert!(matches!(err, BridgeError::MalformedRequest(_)));
        assert_eq!(manager.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_submission_refused() {
        let manager = Arc::new(SimulatedCredentialManager::new());
        manager.push_get(Scripted::RefuseSubmission {
            error: PlatformError::new("IllegalStateException", "Activity is not attached"),
        });

        let err = bridge(manager).start_authentication(AUTHENTICATION).await.unwrap_err();
        assert_eq!(err.to_string(), "Authentication failed: Activity is not attached");
    }

    #[tokio::test]
    async fn test_failure_classified() {
        let manager = Arc::new(SimulatedCredentialManager::new());
        manager.push_create(Scripted::Fail {
            error: PlatformError::new(
                "CreateCredentialNoCreateOptionException",
                "No create options available",
            ),
        });

        let err = bridge(manager).start_registration(REGISTRATION).await.unwrap_err();
        assert_eq!(err.to_string(), NO_PROVIDERS_MESSAGE);
    }

    #[tokio::test]
    async fn test_custom_patterns_applied() {
        let manager = Arc::new(SimulatedCredentialManager::new());
        manager.push_get(Scripted::Fail {
            error: PlatformError::new("X", "Vorgang abgebrochen"),
        });

        let bridge = WebAuthnBridgeBuilder::new(manager)
            .patterns(ClassifierPatterns::default().with_cancellation(vec!["abgebrochen".into()]))
            .build();

        let err = bridge.start_authentication(AUTHENTICATION).await.unwrap_err();
        assert_eq!(err, BridgeError::UserCancelled(OperationKind::Authentication));
    }

    #[test]
    fn test_availability() {
        let manager = Arc::new(SimulatedCredentialManager::new());

        let old = WebAuthnBridgeBuilder::new(manager.clone())
            .platform(PlatformInfo::new(27))
            .build();
        assert_eq!(old.is_available(), Availability { available: false });

        let current = WebAuthnBridgeBuilder::new(manager.clone())
            .platform(PlatformInfo::new(34))
            .build();
        assert_eq!(current.is_available(), Availability { available: true });

        assert_eq!(manager.create_calls() + manager.get_calls(), 0);
    }

    #[test]
    fn test_builder_settings_retained() {
        let patterns = ClassifierPatterns::default().with_no_providers(vec!["no provider".into()]);
        let bridge = WebAuthnBridgeBuilder::new(Arc::new(SimulatedCredentialManager::new()))
            .platform(PlatformInfo::new(30).with_min_api_level(33))
            .patterns(patterns.clone())
            .build();

        assert_eq!(bridge.platform(), PlatformInfo::new(30).with_min_api_level(33));
        assert_eq!(bridge.patterns(), &patterns);
        assert!(!bridge.is_available().available);
    }
}
