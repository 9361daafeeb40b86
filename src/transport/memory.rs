//! In-process transport pair.
//!
//! [`MemoryTransport`] is the local half handed to a
//! [`Connection`](super::Connection); [`MemoryPeer`] plays the remote
//! engine. The peer can push frames, inspect what was sent, and install a
//! responder that answers requests synchronously as they are sent.
//!
//! # Example
//!
//! ```ignore
//! let (transport, peer) = MemoryTransport::pair();
//! peer.respond_with(|request| vec![MemoryPeer::ok_reply(request, json!({}))]);
//!
//! let connection = Connection::new(transport, ClientOptions::default())?;
//! connection.send_message(&ObjectId::new("page@1"), "goto", json!({}))?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::error::{Error, Result};

use super::Transport;

// ============================================================================
// Types
// ============================================================================

/// Scripted answer to a request frame.
///
/// Returned frames are queued for the local end in order.
pub type Responder = Box<dyn Fn(&Value) -> Vec<Value> + Send + Sync>;

/// Inbound item: a frame, or `None` for end of stream.
type Inbound = Option<String>;

// ============================================================================
// MemoryTransport
// ============================================================================

/// Local half of an in-process channel.
pub struct MemoryTransport {
    /// Frames from the peer.
    inbound_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Inbound>>,
    /// Loopback for responder output.
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    /// Frames to the peer.
    outbound_tx: mpsc::UnboundedSender<String>,
    /// Responder shared with the peer.
    responder: Arc<Mutex<Option<Responder>>>,
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransport").finish_non_exhaustive()
    }
}

impl MemoryTransport {
    /// Creates a connected transport/peer pair.
    #[must_use]
    pub fn pair() -> (Self, MemoryPeer) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let responder = Arc::new(Mutex::new(None));

        let transport = Self {
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx: inbound_tx.clone(),
            outbound_tx,
            responder: Arc::clone(&responder),
        };

        let peer = MemoryPeer {
            inbound_tx,
            outbound_rx: Mutex::new(outbound_rx),
            responder,
        };

        (transport, peer)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, frame: String) -> Result<()> {
        let replies = {
            let responder = self.responder.lock();
            match responder.as_ref() {
                Some(respond) => match serde_json::from_str::<Value>(&frame) {
                    Ok(request) => respond(&request),
                    Err(e) => {
                        warn!(error = %e, "Responder skipped malformed frame");
                        Vec::new()
                    }
                },
                None => Vec::new(),
            }
        };

        self.outbound_tx
            .send(frame)
            .map_err(|_| Error::ConnectionClosed)?;

        for reply in replies {
            self.inbound_tx
                .send(Some(reply.to_string()))
                .map_err(|_| Error::ConnectionClosed)?;
        }

        Ok(())
    }

    async fn recv(&self) -> Result<Option<String>> {
        let mut inbound = self.inbound_rx.lock().await;
        Ok(inbound.recv().await.flatten())
    }

    async fn close(&self) -> Result<()> {
        trace!("Memory transport closed locally");
        let _ = self.inbound_tx.send(None);
        Ok(())
    }
}

// ============================================================================
// MemoryPeer
// ============================================================================

/// Remote half of an in-process channel.
///
/// All methods are synchronous and usable from any thread.
pub struct MemoryPeer {
    /// Frames to the local end.
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    /// Frames from the local end.
    outbound_rx: Mutex<mpsc::UnboundedReceiver<String>>,
    /// Responder shared with the transport.
    responder: Arc<Mutex<Option<Responder>>>,
}

impl fmt::Debug for MemoryPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPeer").finish_non_exhaustive()
    }
}

impl MemoryPeer {
    /// Queues a raw frame for the local end.
    pub fn push(&self, frame: Value) {
        let _ = self.inbound_tx.send(Some(frame.to_string()));
    }

    /// Queues an event frame.
    pub fn push_event(&self, guid: &str, method: &str, params: Value) {
        self.push(json!({ "guid": guid, "method": method, "params": params }));
    }

    /// Ends the stream: the local end observes a closed channel.
    pub fn close(&self) {
        let _ = self.inbound_tx.send(None);
    }

    /// Installs a responder invoked for every frame the local end sends.
    pub fn respond_with<F>(&self, responder: F)
    where
        F: Fn(&Value) -> Vec<Value> + Send + Sync + 'static,
    {
        *self.responder.lock() = Some(Box::new(responder));
    }

    /// Answers every request with an empty success reply.
    pub fn respond_ok(&self) {
        self.respond_with(|request| vec![Self::ok_reply(request, json!({}))]);
    }

    /// Removes the responder.
    pub fn clear_responder(&self) {
        *self.responder.lock() = None;
    }

    /// Drains and returns every frame sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Value> {
        let mut outbound = self.outbound_rx.lock();
        let mut frames = Vec::new();
        while let Ok(frame) = outbound.try_recv() {
            match serde_json::from_str(&frame) {
                Ok(value) => frames.push(value),
                Err(e) => warn!(error = %e, "Sent frame is not JSON"),
            }
        }
        frames
    }

    /// Drains sent frames, keeping those with the given method.
    #[must_use]
    pub fn sent_with_method(&self, method: &str) -> Vec<Value> {
        self.sent()
            .into_iter()
            .filter(|frame| frame.get("method").and_then(Value::as_str) == Some(method))
            .collect()
    }

    /// Builds a success reply for a request frame.
    #[must_use]
    pub fn ok_reply(request: &Value, result: Value) -> Value {
        json!({ "id": request.get("id").cloned().unwrap_or(Value::Null), "result": result })
    }

    /// Builds an error reply for a request frame.
    #[must_use]
    pub fn error_reply(request: &Value, message: &str) -> Value {
        json!({
            "id": request.get("id").cloned().unwrap_or(Value::Null),
            "error": { "name": "Error", "message": message }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
