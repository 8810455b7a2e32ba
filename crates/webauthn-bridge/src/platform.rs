//! Native credential manager contract
//!
//! The platform API is callback based: a request is submitted together with
//! an execution context and a completion handler, and exactly one of the
//! handler's two paths fires later on that context. Submission itself may
//! fail synchronously, in which case the handler never fires.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

use webauthn_bridge_core::{CredentialKind, CredentialResult, PlatformError};

/// A unit of work posted to an [`Executor`]
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Execution context completion handlers are delivered on
pub trait Executor: Send + Sync {
    fn execute(&self, task: Task);
}

/// Runs tasks immediately on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, task: Task) {
        task()
    }
}

/// A single "main loop": one tokio task runs posted work strictly in order
///
/// This is the equivalent of posting to the UI thread's looper. All
/// completion handlers of all calls run on the same task, one at a time.
#[derive(Clone)]
pub struct MainLoopExecutor {
    tx: mpsc::UnboundedSender<Task>,
}

impl MainLoopExecutor {
    /// Spawn the loop on the current tokio runtime
    ///
    /// # Panics
    /// When called outside a tokio runtime.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                task();
            }
            debug!("Main loop stopped");
        });
        Self { tx }
    }
}

impl Executor for MainLoopExecutor {
    fn execute(&self, task: Task) {
        // A dropped task drops its completion handler, which the caller
        // observes as an abandoned call rather than a hang.
        if self.tx.send(task).is_err() {
            error!("Main loop is gone, dropping posted task");
        }
    }
}

impl fmt::Debug for MainLoopExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainLoopExecutor")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Native "create public key credential" request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePublicKeyCredentialRequest {
    /// `PublicKeyCredentialCreationOptions` as JSON, exactly as the caller supplied it
    pub request_json: String,
}

impl CreatePublicKeyCredentialRequest {
    pub fn new(request_json: impl Into<String>) -> Self {
        Self {
            request_json: request_json.into(),
        }
    }
}

/// Native "get credential" request carrying a single public-key option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetCredentialRequest {
    /// `PublicKeyCredentialRequestOptions` as JSON, exactly as the caller supplied it
    pub public_key_request_json: String,
}

impl GetCredentialRequest {
    pub fn new(public_key_request_json: impl Into<String>) -> Self {
        Self {
            public_key_request_json: public_key_request_json.into(),
        }
    }
}

/// What the platform hands back from a create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CreateCredentialResponse {
    #[serde(rename_all = "camelCase")]
    PublicKey {
        #[serde(default)]
        registration_response_json: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Other { type_name: String },
}

impl CreateCredentialResponse {
    pub fn into_credential_result(self) -> CredentialResult {
        match self {
            CreateCredentialResponse::PublicKey {
                registration_response_json,
            } => CredentialResult::PublicKeyCredential(registration_response_json),
            CreateCredentialResponse::Other { type_name } => {
                CredentialResult::OtherCredentialType(CredentialKind::Other(type_name))
            }
        }
    }
}

/// A credential returned by a get
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Credential {
    #[serde(rename_all = "camelCase")]
    PublicKey {
        #[serde(default)]
        authentication_response_json: Option<String>,
    },
    Password { id: String },
    #[serde(rename_all = "camelCase")]
    Custom { type_name: String },
}

/// What the platform hands back from a get
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetCredentialResponse {
    pub credential: Credential,
}

impl GetCredentialResponse {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    pub fn into_credential_result(self) -> CredentialResult {
        match self.credential {
            Credential::PublicKey {
                authentication_response_json,
            } => CredentialResult::PublicKeyCredential(authentication_response_json),
            Credential::Password { .. } => {
                CredentialResult::OtherCredentialType(CredentialKind::Password)
            }
            Credential::Custom { type_name } => {
                CredentialResult::OtherCredentialType(CredentialKind::Other(type_name))
            }
        }
    }
}

/// Completion handler handed to the platform
///
/// Both paths consume the handler, so a platform implementation can fire
/// at most one of them, at most once.
pub struct CredentialCallback<T> {
    complete: Box<dyn FnOnce(Result<T, PlatformError>) + Send + 'static>,
}

impl<T> CredentialCallback<T> {
    pub fn new<F>(complete: F) -> Self
    where
        F: FnOnce(Result<T, PlatformError>) + Send + 'static,
    {
        Self {
            complete: Box::new(complete),
        }
    }

    /// Success path
    pub fn on_result(self, result: T) {
        (self.complete)(Ok(result))
    }

    /// Failure path
    pub fn on_error(self, error: PlatformError) {
        (self.complete)(Err(error))
    }
}

impl<T> fmt::Debug for CredentialCallback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCallback").finish_non_exhaustive()
    }
}

/// The platform credential manager
///
/// Implementations return `Err` only when the request cannot even be
/// started; after returning `Ok` they must eventually fire (or drop) the
/// callback on `executor`.
pub trait CredentialManager: Send + Sync {
    fn create_credential(
        &self,
        request: CreatePublicKeyCredentialRequest,
        executor: Arc<dyn Executor>,
        callback: CredentialCallback<CreateCredentialResponse>,
    ) -> Result<(), PlatformError>;

    fn get_credential(
        &self,
        request: GetCredentialRequest,
        executor: Arc<dyn Executor>,
        callback: CredentialCallback<GetCredentialResponse>,
    ) -> Result<(), PlatformError>;

    /// Get a description of this platform (for logging)
    fn description(&self) -> &str {
        "credential manager"
    }
}
