//! JSON-lines call channel
//!
//! Each input line is one call:
//!
//! ```json
//! {"id": 7, "plugin": "WebAuthn", "method": "startRegistration", "data": {...}}
//! ```
//!
//! Each call is answered by exactly one output line, `{"id": 7, "resolved": {...}}`
//! or `{"id": 7, "rejected": "message"}`. Calls run concurrently, so responses
//! may arrive out of order; callers match them by `id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use webauthn_bridge::BridgeOutcome;

use crate::plugin::PluginRegistry;

/// Errors that end the serve loop
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Writer task failed: {0}")]
    Join(String),
}

/// One call from the web layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallMessage {
    /// Opaque correlation id, echoed on the response
    #[serde(default)]
    pub id: Value,
    pub plugin: String,
    pub method: String,
    #[serde(default = "empty_object")]
    pub data: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

/// The single answer to a call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub id: Value,
    #[serde(flatten)]
    pub outcome: BridgeOutcome,
}

/// Calls spawned by the serve loop; finished ones are reaped as input arrives
struct InFlight {
    calls: JoinSet<()>,
}

impl InFlight {
    fn new() -> Self {
        Self {
            calls: JoinSet::new(),
        }
    }

    fn spawn<F>(&mut self, call: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.calls.spawn(call);
    }

    fn len(&self) -> usize {
        self.calls.len()
    }

    /// Collect every call that has already finished
    fn reap(&mut self) {
        while let Some(joined) = self.calls.try_join_next() {
            finished(joined);
        }
    }

    /// Wait for the remaining calls, abandoning them if the output closes
    async fn drain(&mut self, output: &mpsc::UnboundedSender<ResponseMessage>) {
        loop {
            tokio::select! {
                biased;
                _ = output.closed() => {
                    warn!(in_flight = self.len(), "Output closed, abandoning in-flight calls");
                    self.calls.abort_all();
                    return;
                }
                joined = self.calls.join_next() => match joined {
                    Some(joined) => finished(joined),
                    None => return,
                },
            }
        }
    }
}

fn finished(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if !e.is_cancelled() {
            error!(error = %e, "Call task failed");
        }
    }
}

/// Serve calls from `reader` until end of input
///
/// Returns the writer once every call read has been answered. Stops reading
/// as soon as the output fails and returns that error.
pub async fn serve<R, W>(
    registry: Arc<PluginRegistry>,
    reader: R,
    writer: W,
) -> Result<W, TransportError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<ResponseMessage>();

    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(response) = rx.recv().await {
            let mut line = serde_json::to_vec(&response)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
            writer.flush().await?;
        }
        Ok::<W, TransportError>(writer)
    });

    let mut lines = reader.lines();
    let mut in_flight = InFlight::new();
    let mut received = 0usize;

    loop {
        let line = tokio::select! {
            biased;
            _ = tx.closed() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };
        in_flight.reap();

        if line.trim().is_empty() {
            continue;
        }
        received += 1;

        let message = match serde_json::from_str::<CallMessage>(&line) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Discarding malformed call");
                let rejection = ResponseMessage {
                    id: Value::Null,
                    outcome: BridgeOutcome::Rejected(format!("Invalid message: {}", e)),
                };
                if tx.send(rejection).is_err() {
                    break;
                }
                continue;
            }
        };

        debug!(
            id = %message.id,
            plugin = %message.plugin,
            method = %message.method,
            in_flight = in_flight.len(),
            "Received call"
        );

        let registry = registry.clone();
        let tx = tx.clone();
        in_flight.spawn(async move {
            let CallMessage {
                id,
                plugin,
                method,
                data,
            } = message;
            let outcome = registry.dispatch(&plugin, &method, data).await;
            if tx.send(ResponseMessage { id, outcome }).is_err() {
                warn!(plugin = %plugin, method = %method, "Response channel closed");
            }
        });
    }

    in_flight.drain(&tx).await;
    drop(tx);

    let writer = writer_task
        .await
        .map_err(|e| TransportError::Join(e.to_string()))??;

    info!(calls = received, "Input closed");
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_message_defaults() {
        let message: CallMessage =
            serde_json::from_str(r#"{"plugin": "WebAuthn", "method": "isAvailable"}"#).unwrap();
        assert_eq!(message.id, Value::Null);
        assert_eq!(message.data, json!({}));
    }

    #[test]
    fn test_response_shape() {
        let resolved = ResponseMessage {
            id: json!(1),
            outcome: BridgeOutcome::Resolved(json!({"available": true})),
        };
        assert_eq!(
            serde_json::to_value(&resolved).unwrap(),
            json!({"id": 1, "resolved": {"available": true}})
        );

        let rejected = ResponseMessage {
            id: json!("a"),
            outcome: BridgeOutcome::Rejected("Unknown error".into()),
        };
        assert_eq!(
            serde_json::to_value(&rejected).unwrap(),
            json!({"id": "a", "rejected": "Unknown error"})
        );
    }

    #[tokio::test]
    async fn test_finished_calls_are_reaped() {
        let mut in_flight = InFlight::new();
        for _ in 0..8 {
            in_flight.spawn(async {});
        }
        in_flight.spawn(async { panic!("call handler crashed") });
        assert_eq!(in_flight.len(), 9);

        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while in_flight.len() > 0 {
                tokio::task::yield_now().await;
                in_flight.reap();
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_drain_abandons_calls_when_output_closes() {
        let (tx, rx) = mpsc::unbounded_channel::<ResponseMessage>();
        let mut in_flight = InFlight::new();
        in_flight.spawn(std::future::pending::<()>());
        drop(rx);

        tokio::time::timeout(std::time::Duration::from_secs(5), in_flight.drain(&tx))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_input() {
        let registry = Arc::new(PluginRegistry::new());
        let output = serve(registry, &b""[..], Vec::new()).await.unwrap();
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_line_keeps_serving() {
        let registry = Arc::new(PluginRegistry::new());
        let input = b"not json\n\n{\"id\": 2, \"plugin\": \"Camera\", \"method\": \"x\"}\n";
        let output = serve(registry, &input[..], Vec::new()).await.unwrap();

        let responses: Vec<ResponseMessage> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, Value::Null);
        assert!(matches!(
            &responses[0].outcome,
            BridgeOutcome::Rejected(m) if m.starts_with("Invalid message: ")
        ));
        assert_eq!(
            responses[1],
            ResponseMessage {
                id: json!(2),
                outcome: BridgeOutcome::Rejected("Plugin Camera is not implemented".into()),
            }
        );
    }
}
