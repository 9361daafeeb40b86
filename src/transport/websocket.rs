//! WebSocket transport.
//!
//! Carries text frames over a tokio-tungstenite stream. The stream is split
//! so that a send never waits behind a pending read.
//!
//! # Example
//!
//! ```ignore
//! let transport = WebSocketTransport::connect("ws://127.0.0.1:9222/engine").await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};

use super::Transport;

// ============================================================================
// WebSocketTransport
// ============================================================================

/// Text-frame transport over a WebSocket.
pub struct WebSocketTransport<S = MaybeTlsStream<TcpStream>> {
    /// Write half.
    sink: Mutex<SplitSink<WebSocketStream<S>, Message>>,
    /// Read half.
    stream: Mutex<SplitStream<WebSocketStream<S>>>,
}

impl<S> fmt::Debug for WebSocketTransport<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketTransport").finish_non_exhaustive()
    }
}

impl WebSocketTransport {
    /// Connects to a WebSocket endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the handshake fails.
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| Error::connection(format!("WebSocket connect to {url} failed: {e}")))?;

        info!(url, "WebSocket connection established");
        Ok(Self::new(ws_stream))
    }
}

impl<S> WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an established WebSocket stream.
    #[must_use]
    pub fn new(ws_stream: WebSocketStream<S>) -> Self {
        let (sink, stream) = ws_stream.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }
}

#[async_trait]
impl<S> Transport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&self, frame: String) -> Result<()> {
        trace!(len = frame.len(), "Sending frame");
        self.sink.lock().await.send(Message::Text(frame.into())).await?;
        Ok(())
    }

    async fn recv(&self) -> Result<Option<String>> {
        let mut stream = self.stream.lock().await;

        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),

                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Ok(Some(text)),
                    Err(e) => warn!(error = %e, "Dropping non UTF-8 binary frame"),
                },

                Some(Ok(Message::Close(_))) => {
                    debug!("WebSocket closed by remote");
                    return Ok(None);
                }

                Some(Err(e)) => return Err(e.into()),

                None => {
                    debug!("WebSocket stream ended");
                    return Ok(None);
                }

                // Ignore Ping, Pong, raw frames
                Some(Ok(_)) => {}
            }
        }
    }

    async fn close(&self) -> Result<()> {
        self.sink.lock().await.close().await?;
        Ok(())
    }
}
