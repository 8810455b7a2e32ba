//! Single-resolution completion
//!
//! Each bridge call owns one [`PendingCall`] and hands out [`Completion`]
//! handles to whoever may finish it: the native success path, the native
//! failure path, and the bridge itself when submission fails synchronously.
//! The first settlement wins and every later one is ignored, so a call moves
//! `Idle → Submitted → {Resolved | Rejected}` and never re-enters a state.
//!
//! If every handle is dropped without settling, the waiting caller is
//! rejected with [`BridgeError::Abandoned`] instead of hanging.

use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::debug;

use webauthn_bridge_core::{BridgeError, OperationKind, Result};

/// Lifecycle of a single call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Submitted,
    Resolved,
    Rejected,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Resolved | CallState::Rejected)
    }
}

type Sender = oneshot::Sender<Result<Value>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create a pending call and its first fulfilment handle
pub fn pending_call(operation: OperationKind) -> (PendingCall, Completion) {
    let (tx, rx) = oneshot::channel();
    let state = Arc::new(Mutex::new(CallState::Idle));

    let pending = PendingCall {
        operation,
        state: state.clone(),
        rx,
    };
    let completion = Completion {
        operation,
        state,
        sender: Arc::new(Mutex::new(Some(tx))),
    };

    (pending, completion)
}

/// Fulfilment handle for a [`PendingCall`]
#[derive(Clone)]
pub struct Completion {
    operation: OperationKind,
    state: Arc<Mutex<CallState>>,
    sender: Arc<Mutex<Option<Sender>>>,
}

impl Completion {
    /// Record that the native call has been issued
    pub fn mark_submitted(&self) {
        let mut state = lock(&self.state);
        if *state == CallState::Idle {
            *state = CallState::Submitted;
        }
    }

    /// Settle the call. Returns `false` if it was already settled.
    pub fn settle(&self, outcome: Result<Value>) -> bool {
        let Some(tx) = lock(&self.sender).take() else {
            debug!(
                operation = %self.operation,
                "Call already settled, ignoring late completion"
            );
            return false;
        };

        let next = if outcome.is_ok() {
            CallState::Resolved
        } else {
            CallState::Rejected
        };
        *lock(&self.state) = next;

        if tx.send(outcome).is_err() {
            debug!(operation = %self.operation, "Caller stopped waiting before completion");
        }
        true
    }

    pub fn state(&self) -> CallState {
        *lock(&self.state)
    }

    pub fn is_settled(&self) -> bool {
        lock(&self.sender).is_none()
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("operation", &self.operation)
            .field("state", &self.state())
            .finish()
    }
}

/// The caller's side of a call: awaits the single outcome
#[derive(Debug)]
pub struct PendingCall {
    operation: OperationKind,
    state: Arc<Mutex<CallState>>,
    rx: oneshot::Receiver<Result<Value>>,
}

impl PendingCall {
    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn state(&self) -> CallState {
        *lock(&self.state)
    }

    /// Wait for the outcome
    pub async fn wait(self) -> Result<Value> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                *lock(&self.state) = CallState::Rejected;
                Err(BridgeError::Abandoned(self.operation))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_resolves_once() {
        let (pending, completion) = pending_call(OperationKind::Registration);
        assert_eq!(pending.operation(), OperationKind::Registration);
        assert_eq!(pending.state(), CallState::Idle);

        completion.mark_submitted();
        assert_eq!(pending.state(), CallState::Submitted);

        assert!(completion.settle(Ok(json!({"id": "abc"}))));
        assert!(!completion.settle(Err(BridgeError::Generic("late".into()))));
        assert_eq!(completion.state(), CallState::Resolved);

        assert_eq!(pending.wait().await, Ok(json!({"id": "abc"})));
    }

    #[tokio::test]
    async fn test_pre_settled_failure_blocks_callbacks() {
        let (pending, completion) = pending_call(OperationKind::Authentication);
        let native_path = completion.clone();

        assert!(completion.settle(Err(BridgeError::PlatformRejected {
            operation: OperationKind::Authentication,
            message: "activity missing".into(),
        })));
        assert!(!native_path.settle(Ok(json!({}))));
        assert_eq!(pending.state(), CallState::Rejected);

        assert_eq!(
            pending.wait().await.unwrap_err().to_string(),
            "Authentication failed: activity missing"
        );
    }

    #[tokio::test]
    async fn test_abandoned_when_handles_dropped() {
        let (pending, completion) = pending_call(OperationKind::Registration);
        completion.mark_submitted();
        drop(completion);

        assert_eq!(
            pending.wait().await,
            Err(BridgeError::Abandoned(OperationKind::Registration))
        );
    }

    #[tokio::test]
    async fn test_settle_after_caller_gone() {
        let (pending, completion) = pending_call(OperationKind::Registration);
        drop(pending);

        // still counts as the single settlement
        assert!(completion.settle(Ok(json!({}))));
        assert!(completion.is_settled());
    }

    #[test]
    fn test_submitted_does_not_regress_terminal() {
        let (_pending, completion) = pending_call(OperationKind::Registration);
        completion.settle(Ok(json!({})));
        completion.mark_submitted();
        assert_eq!(completion.state(), CallState::Resolved);
        assert!(completion.state().is_terminal());
    }
}
