//! Simulated Credential Manager
//!
//! A scripted stand-in for the platform credential manager. Each submission
//! pops the next scripted step for its operation:
//!
//! - `Succeed` - fire the success path with the given response
//! - `Fail` - fire the failure path with the given platform error
//! - `RefuseSubmission` - fail synchronously; no callback ever fires
//! - `DropCallback` - accept the request and never complete it
//!
//! With an empty script, creates fail the way a device without passkey
//! providers does and gets fail with "no credential".

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

use webauthn_bridge_core::PlatformError;

use crate::platform::{
    CreateCredentialResponse, CreatePublicKeyCredentialRequest, CredentialCallback,
    CredentialManager, Executor, GetCredentialRequest, GetCredentialResponse,
};

/// One scripted platform reaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Scripted<T> {
    Succeed { response: T },
    Fail { error: PlatformError },
    RefuseSubmission { error: PlatformError },
    DropCallback,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted credential manager for tests and offline hosts
#[derive(Debug, Default)]
pub struct SimulatedCredentialManager {
    create_script: Mutex<VecDeque<Scripted<CreateCredentialResponse>>>,
    get_script: Mutex<VecDeque<Scripted<GetCredentialResponse>>>,
    delay: Option<Duration>,
    create_calls: AtomicUsize,
    get_calls: AtomicUsize,
    requests: Mutex<Vec<String>>,
}

impl SimulatedCredentialManager {
    /// Create a simulator with empty scripts that completes synchronously
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver completions from a background task after `delay`
    ///
    /// Requires a tokio runtime at submission time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue the reaction to the next create
    pub fn push_create(&self, step: Scripted<CreateCredentialResponse>) {
        lock(&self.create_script).push_back(step);
    }

    /// Queue the reaction to the next get
    pub fn push_get(&self, step: Scripted<GetCredentialResponse>) {
        lock(&self.get_script).push_back(step);
    }

    /// Number of create submissions attempted
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of get submissions attempted
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Request documents received, in submission order
    pub fn recorded_requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    fn run<T: Send + 'static>(
        &self,
        step: Scripted<T>,
        executor: Arc<dyn Executor>,
        callback: CredentialCallback<T>,
    ) -> Result<(), PlatformError> {
        let complete: Box<dyn FnOnce() + Send> = match step {
            Scripted::Succeed { response } => Box::new(move || callback.on_result(response)),
            Scripted::Fail { error } => Box::new(move || callback.on_error(error)),
            Scripted::RefuseSubmission { error } => return Err(error),
            Scripted::DropCallback => {
                debug!("Simulated platform dropping completion handler");
                return Ok(());
            }
        };

        match self.delay {
            Some(delay) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    executor.execute(complete);
                });
            }
            None => executor.execute(complete),
        }
        Ok(())
    }
}

impl CredentialManager for SimulatedCredentialManager {
    fn create_credential(
        &self,
        request: CreatePublicKeyCredentialRequest,
        executor: Arc<dyn Executor>,
        callback: CredentialCallback<CreateCredentialResponse>,
    ) -> Result<(), PlatformError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.request_json);

        let step = lock(&self.create_script).pop_front().unwrap_or_else(|| Scripted::Fail {
            error: PlatformError::new(
                "CreateCredentialNoCreateOptionException",
                "No create options available.",
            ),
        });
        self.run(step, executor, callback)
    }

    fn get_credential(
        &self,
        request: GetCredentialRequest,
        executor: Arc<dyn Executor>,
        callback: CredentialCallback<GetCredentialResponse>,
    ) -> Result<(), PlatformError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.public_key_request_json);

        let step = lock(&self.get_script).pop_front().unwrap_or_else(|| Scripted::Fail {
            error: PlatformError::new("NoCredentialException", "No credentials available"),
        });
        self.run(step, executor, callback)
    }

    fn description(&self) -> &str {
        "simulated credential manager"
    }
}
