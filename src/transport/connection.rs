//! Connection: correlation, dispatch and the blocking-wait driver.
//!
//! # Pumping
//!
//! A connection has no background reader. [`Connection::run_until`] runs a
//! triggering action once, then reads and dispatches one frame at a time on
//! the calling thread until the given [`Waitable`] is done:
//!
//! - a reply completes the [`ReplySlot`] registered under its id;
//! - an event is fanned out through the target object's listener
//!   collection, which may resolve members of the race being waited on.
//!
//! A listener may start a nested wait; the nested call pumps the same
//! channel, so frames are still dispatched strictly in arrival order.
//! Threads sharing a connection are serialized by a re-entrant reader lock.
//!
//! # Runtime
//!
//! The transport is asynchronous. Each connection owns a current-thread
//! tokio runtime and bridges every read and write through
//! [`Runtime::block_on`]. Blocking calls must therefore not be made from
//! inside another tokio runtime.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, ReentrantMutex};
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};
use tokio::time::{Instant as TokioInstant, sleep_until, timeout_at};
use tracing::{debug, error, trace, warn};

use crate::client::ClientOptions;
use crate::error::{Error, Result};
use crate::identifiers::{ObjectId, RequestId, RequestIdAllocator};
use crate::protocol::{Command, CustomCommand, Event, Message, Request, names};
use crate::waiting::{ReplySlot, Waitable, WaitableFailure, WaitableReply, Waiter};

use super::Transport;
use super::registry::{ObjectListeners, ObjectRegistry};
use super::websocket::WebSocketTransport;

// ============================================================================
// Types
// ============================================================================

/// Map of request IDs to reply slots.
type CorrelationMap = FxHashMap<RequestId, Arc<ReplySlot>>;

/// Internal shared state.
pub(crate) struct ConnectionInner {
    /// Runtime bridging the async transport.
    runtime: Runtime,
    /// Frame transport.
    transport: Box<dyn Transport>,
    /// Single-reader lock (re-entrant for nested pumps).
    reader: ReentrantMutex<()>,
    /// Request ID allocator.
    ids: RequestIdAllocator,
    /// Outstanding requests.
    correlation: Mutex<CorrelationMap>,
    /// Live remote objects.
    registry: ObjectRegistry,
    /// Set once the channel ended.
    closed: AtomicBool,
    /// Configuration.
    options: ClientOptions,
}

// ============================================================================
// Connection
// ============================================================================

/// Duplex message channel with a cooperative pump.
///
/// Cheap to clone; clones share the channel.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

/// Non-owning connection handle for listener closures.
#[derive(Clone)]
pub struct WeakConnection {
    inner: Weak<ConnectionInner>,
}

impl WeakConnection {
    /// Upgrades to a connection if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Connection> {
        self.inner.upgrade().map(|inner| Connection { inner })
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.is_closed())
            .field("pending", &self.pending_count())
            .field("objects", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Creates a connection over `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the runtime cannot be created.
    pub fn new(transport: impl Transport + 'static, options: ClientOptions) -> Result<Self> {
        Self::from_transport(Box::new(transport), options)
    }

    /// Creates a connection over a boxed transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the runtime cannot be created.
    pub fn from_transport(transport: Box<dyn Transport>, options: ClientOptions) -> Result<Self> {
        let runtime = build_runtime()?;
        Ok(Self::with_runtime(runtime, transport, options))
    }

    /// Connects to a WebSocket endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the runtime cannot be created
    /// - [`Error::Connection`] if the handshake fails
    pub fn connect(url: &str, options: ClientOptions) -> Result<Self> {
        let runtime = build_runtime()?;
        let transport = runtime.block_on(WebSocketTransport::connect(url))?;
        Ok(Self::with_runtime(runtime, Box::new(transport), options))
    }

    fn with_runtime(
        runtime: Runtime,
        transport: Box<dyn Transport>,
        options: ClientOptions,
    ) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                runtime,
                transport,
                reader: ReentrantMutex::new(()),
                ids: RequestIdAllocator::new(),
                correlation: Mutex::new(CorrelationMap::default()),
                registry: ObjectRegistry::new(),
                closed: AtomicBool::new(false),
                options,
            }),
        }
    }

    /// Returns a non-owning handle.
    #[inline]
    #[must_use]
    pub fn downgrade(&self) -> WeakConnection {
        WeakConnection {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

// ============================================================================
// Connection - Accessors
// ============================================================================

impl Connection {
    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// Returns the object registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ObjectRegistry {
        &self.inner.registry
    }

    /// Registers a remote object and returns its listener collection.
    #[inline]
    pub fn register_object(&self, guid: &ObjectId) -> ObjectListeners {
        self.inner.registry.register(guid)
    }

    /// Returns `true` once the channel ended.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Returns the number of requests awaiting a reply.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.correlation.lock().len()
    }

    /// Failure-only waitable that resolves when the channel ends.
    #[must_use]
    pub fn closed_waitable<T>(&self) -> WaitableFailure<T> {
        if self.is_closed() {
            return WaitableFailure::fired(|| Error::ConnectionClosed);
        }
        WaitableFailure::on_event(&self.inner.registry.root(), names::CLOSE, || {
            Error::ConnectionClosed
        })
    }
}

// ============================================================================
// Connection - Requests
// ============================================================================

impl Connection {
    /// Sends a free-form request and waits for its reply.
    ///
    /// # Errors
    ///
    /// See [`Connection::send_command`].
    pub fn send_message(&self, guid: &ObjectId, method: &str, params: Value) -> Result<Value> {
        self.send_command(guid, CustomCommand::new(method, params))
    }

    /// Sends a command and waits for its reply with the default timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the channel is or becomes closed
    /// - [`Error::Timeout`] if no reply arrives in time
    /// - [`Error::Protocol`] for error replies or too many pending requests
    /// - any error raised by a listener dispatched while waiting
    pub fn send_command(&self, guid: &ObjectId, command: impl Into<Command>) -> Result<Value> {
        self.send_command_with_timeout(guid, command, self.inner.options.timeout)
    }

    /// Sends a command and waits for its reply.
    ///
    /// A zero timeout waits indefinitely.
    ///
    /// # Errors
    ///
    /// See [`Connection::send_command`].
    pub fn send_command_with_timeout(
        &self,
        guid: &ObjectId,
        command: impl Into<Command>,
        timeout: Duration,
    ) -> Result<Value> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let command = command.into();
        let method = command.method().to_string();

        let id = self.inner.ids.next();
        let frame = serde_json::to_string(&Request::new(id, guid.clone(), command))?;
        let slot = Arc::new(ReplySlot::new());

        // Cap check and insert under one lock
        {
            let mut correlation = self.inner.correlation.lock();
            let max = self.inner.options.max_pending_requests;
            if correlation.len() >= max {
                warn!(pending = correlation.len(), max, "Too many pending requests");
                return Err(Error::protocol(format!(
                    "Too many pending requests: {}/{}",
                    correlation.len(),
                    max
                )));
            }
            correlation.insert(id, Arc::clone(&slot));
        }

        let weak = Arc::downgrade(&self.inner);
        let reply = WaitableReply::new(slot, move || {
            if let Some(inner) = weak.upgrade() {
                inner.correlation.lock().remove(&id);
                trace!(%id, "Abandoned pending request");
            }
        });

        let race = Waiter::new()
            .wait_for(reply)
            .reject_on(self.closed_waitable())
            .timeout(timeout, format!("waiting for reply to \"{method}\""))
            .into_race();

        trace!(%id, %guid, method, "Sending request");
        self.run_until(|| self.write_frame(frame), &race)
    }

    /// Writes one frame to the transport.
    fn write_frame(&self, frame: String) -> Result<()> {
        let result = self.inner.runtime.block_on(self.inner.transport.send(frame));
        if let Err(ref e) = result {
            warn!(error = %e, "Failed to send frame");
        }
        result
    }
}

// ============================================================================
// Connection - Driver
// ============================================================================

impl Connection {
    /// Runs `action`, then pumps the channel until `waitable` is done.
    ///
    /// The action runs exactly once, before any frame is read. The
    /// waitable is disposed on every exit path.
    ///
    /// # Errors
    ///
    /// - the error returned by `action`
    /// - the failure `waitable` resolved to
    /// - any error raised by a listener dispatched while waiting
    /// - [`Error::ConnectionClosed`] if the channel ended and nothing left
    ///   in `waitable` can resolve
    pub fn run_until<T, W, A>(&self, action: A, waitable: &W) -> Result<T>
    where
        W: Waitable<T> + ?Sized,
        A: FnOnce() -> Result<()>,
    {
        let result = (|| {
            action()?;
            while !waitable.is_done() {
                self.pump_once(waitable.wake_at())?;
            }
            waitable.get()
        })();

        waitable.dispose();
        result
    }

    /// Reads and dispatches at most one frame.
    ///
    /// Returns without reading once `wake_at` passes.
    fn pump_once(&self, wake_at: Option<Instant>) -> Result<()> {
        let _reader = self.inner.reader.lock();

        if self.is_closed() {
            let Some(deadline) = wake_at else {
                return Err(Error::ConnectionClosed);
            };
            let deadline = TokioInstant::from_std(deadline);
            self.inner
                .runtime
                .block_on(async move { sleep_until(deadline).await });
            return Ok(());
        }

        let transport = &self.inner.transport;
        let received = match wake_at {
            Some(deadline) => {
                // Timers must be created inside the runtime
                let deadline = TokioInstant::from_std(deadline);
                let read = async move { timeout_at(deadline, transport.recv()).await };
                match self.inner.runtime.block_on(read) {
                    Ok(received) => received,
                    Err(_) => {
                        trace!("Pump reached wake deadline");
                        return Ok(());
                    }
                }
            }
            None => self.inner.runtime.block_on(transport.recv()),
        };

        match received {
            Ok(Some(frame)) => self.dispatch(&frame),
            Ok(None) => {
                self.handle_close("channel ended");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Transport error");
                self.handle_close("transport error");
                Ok(())
            }
        }
    }

    /// Dispatches one incoming frame.
    fn dispatch(&self, frame: &str) -> Result<()> {
        match Message::parse(frame) {
            Ok(Message::Response(response)) => {
                let slot = self.inner.correlation.lock().remove(&response.id);
                match slot {
                    Some(slot) => {
                        trace!(id = %response.id, "Reply received");
                        slot.complete(response.into_result());
                    }
                    None => debug!(id = %response.id, "Discarding reply for abandoned request"),
                }
                Ok(())
            }
            Ok(Message::Event(event)) => self.dispatch_event(event),
            Err(e) => {
                warn!(error = %e, frame, "Failed to parse incoming frame");
                Ok(())
            }
        }
    }

    /// Fans an event out through its target's listeners.
    fn dispatch_event(&self, event: Event) -> Result<()> {
        let Some(listeners) = self.inner.registry.lookup(&event.guid) else {
            trace!(guid = %event.guid, method = %event.method, "Event for unknown object");
            return Ok(());
        };

        trace!(guid = %event.guid, method = %event.method, "Dispatching event");
        let result = listeners.notify(&event.method, &event.params);

        if event.method == names::DISPOSE {
            self.inner.registry.unregister(&event.guid);
        }

        result
    }

    /// Marks the channel closed, fails pending requests and synthesizes the
    /// root `close` notification. Runs once.
    fn handle_close(&self, reason: &str) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        debug!(reason, "Connection closed");

        let pending: Vec<_> = self.inner.correlation.lock().drain().collect();
        let count = pending.len();
        for (_, slot) in pending {
            slot.complete(Err(Error::ConnectionClosed));
        }
        if count > 0 {
            debug!(count, "Failed pending requests on close");
        }

        let root = self.inner.registry.root();
        if let Err(e) = root.notify(names::CLOSE, &json!({ "reason": reason })) {
            warn!(error = %e, "Close listener failed");
        }
    }
}

// ============================================================================
// Connection - Lifecycle
// ============================================================================

impl Connection {
    /// Closes the channel.
    ///
    /// Outstanding waits resolve through their closed waitables.
    ///
    /// # Errors
    ///
    /// Returns the transport error if closing failed; the connection is
    /// marked closed regardless.
    pub fn close(&self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }

        let result = self.inner.runtime.block_on(self.inner.transport.close());
        self.handle_close("closed locally");
        result
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Builds the runtime that drives transport I/O and timers.
fn build_runtime() -> Result<Runtime> {
    Ok(RuntimeBuilder::new_current_thread().enable_all().build()?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::transport::{MemoryPeer, MemoryTransport};
    use crate::waiting::{WaitableEvent, WaitableNever, WaitablePredicate, WaitableTimeout};

    fn connection() -> (Connection, MemoryPeer) {
        let (transport, peer) = MemoryTransport::pair();
        let connection = Connection::new(transport, ClientOptions::default()).expect("connection");
        (connection, peer)
    }

    #[test]
    fn test_send_message_round_trip() {
        let (connection, peer) = connection();
        peer.respond_with(|request| vec![MemoryPeer::ok_reply(request, json!({ "echo": request["params"]["v"] }))]);

        let result = connection
            .send_message(&ObjectId::new("page@1"), "echo", json!({ "v": 3 }))
            .expect("reply");

        assert_eq!(result["echo"], 3);
        assert_eq!(connection.pending_count(), 0);
    }

    #[test]
    fn test_error_reply() {
        let (connection, peer) = connection();
        peer.respond_with(|request| vec![MemoryPeer::error_reply(request, "nope")]);

        let err = connection
            .send_message(&ObjectId::new("page@1"), "fail", json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_action_runs_once_before_pumping() {
        let (connection, peer) = connection();
        let listeners = connection.register_object(&ObjectId::new("page@1"));
        let event = WaitableEvent::new(&listeners, "load", None);

        let mut calls = 0;
        let value = connection
            .run_until(
                || {
                    calls += 1;
                    peer.push_event("page@1", "load", json!({ "url": "https://x/" }));
                    Ok(())
                },
                &event,
            )
            .expect("event");

        assert_eq!(calls, 1);
        assert_eq!(value["url"], "https://x/");
        assert!(!listeners.has_listeners("load"));
    }

    #[test]
    fn test_unrelated_frames_are_dispatched_while_waiting() {
        let (connection, peer) = connection();
        let page = connection.register_object(&ObjectId::new("page@1"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        page.add("console", move |params| {
            seen_clone.lock().push(params["text"].as_str().unwrap_or_default().to_string());
            Ok(())
        });

        peer.push_event("page@1", "console", json!({ "text": "one" }));
        peer.push_event("page@1", "console", json!({ "text": "two" }));
        peer.push_event("page@1", "load", json!({}));

        let event = WaitableEvent::new(&page, "load", None);
        connection.run_until(|| Ok(()), &event).expect("load");

        assert_eq!(*seen.lock(), vec!["one", "two"]);
    }

    #[test]
    fn test_timeout_wins_when_nothing_arrives() {
        let (connection, _peer) = connection();
        let race = Waiter::new()
            .wait_for(WaitableNever::<Value>::new())
            .timeout(Duration::from_millis(20), "waiting for nothing")
            .into_race();

        let started = Instant::now();
        let err = connection.run_until(|| Ok(()), &race).unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_close_resolves_closed_waitable() {
        let (connection, peer) = connection();
        let race = Waiter::new()
            .wait_for(WaitableNever::<Value>::new())
            .reject_on(connection.closed_waitable())
            .into_race();

        peer.close();
        let err = connection.run_until(|| Ok(()), &race).unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
        assert!(connection.is_closed());

        // Nothing can complete any more: fail instead of spinning.
        let err = connection
            .run_until(|| Ok(()), &WaitableNever::<Value>::new())
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[test]
    fn test_close_fails_pending_request() {
        let (connection, peer) = connection();
        peer.respond_with(|_| vec![]);
        peer.close();

        let err = connection
            .send_message(&ObjectId::new("page@1"), "never", json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
        assert_eq!(connection.pending_count(), 0);

        let err = connection
            .send_message(&ObjectId::new("page@1"), "after", json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[test]
    fn test_request_timeout_discards_late_reply() {
        let (transport, peer) = MemoryTransport::pair();
        let options = ClientOptions::default().with_timeout(Duration::from_millis(20));
        let connection = Connection::new(transport, options).expect("connection");

        let err = connection
            .send_message(&ObjectId::new("page@1"), "slow", json!({}))
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(connection.pending_count(), 0);

        let sent = peer.sent();
        peer.push(MemoryPeer::ok_reply(&sent[0], json!({})));
        peer.push_event("page@1", "load", json!({}));

        let page = connection.register_object(&ObjectId::new("page@1"));
        let event = WaitableEvent::new(&page, "load", None);
        connection.run_until(|| Ok(()), &event).expect("late reply is skipped");
    }

    #[test]
    fn test_nested_wait_inside_listener() {
        let (connection, peer) = connection();
        peer.respond_ok();

        let page_id = ObjectId::new("page@1");
        let page = connection.register_object(&page_id);

        let weak = connection.downgrade();
        let nested_guid = page_id.clone();
        let nested_result = Arc::new(Mutex::new(None));
        let nested_clone = Arc::clone(&nested_result);
        page.add("dialog", move |_| {
            if let Some(connection) = weak.upgrade() {
                let reply = connection.send_message(&nested_guid, "dismiss", json!({}))?;
                *nested_clone.lock() = Some(reply);
            }
            Ok(())
        });

        peer.push_event("page@1", "dialog", json!({}));
        peer.push_event("page@1", "load", json!({}));

        let event = WaitableEvent::new(&page, "load", None);
        connection.run_until(|| Ok(()), &event).expect("load");

        assert!(nested_result.lock().is_some());
    }

    #[test]
    fn test_listener_error_propagates_out_of_wait() {
        let (connection, peer) = connection();
        let page = connection.register_object(&ObjectId::new("page@1"));
        page.add("route", |_| Err(Error::protocol("handler failed")));

        peer.push_event("page@1", "route", json!({}));
        let err = connection
            .run_until(|| Ok(()), &WaitableNever::<Value>::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Protocol error: handler failed");

        // The channel keeps working.
        peer.respond_ok();
        connection
            .send_message(&ObjectId::new("page@1"), "ping", json!({}))
            .expect("channel still usable");
    }

    #[test]
    fn test_dispose_event_unregisters_object() {
        let (connection, peer) = connection();
        let guid = ObjectId::new("route@9");
        connection.register_object(&guid);

        peer.push_event("route@9", names::DISPOSE, json!({}));
        peer.push_event("", "marker", json!({}));

        let root = connection.registry().root();
        let marker = WaitableEvent::new(&root, "marker", None);
        connection.run_until(|| Ok(()), &marker).expect("marker");

        assert!(connection.registry().lookup(&guid).is_none());
    }

    #[test]
    fn test_predicate_is_polled_without_frames() {
        let (connection, _peer) = connection();
        let deadline = Instant::now() + Duration::from_millis(30);
        let predicate = WaitablePredicate::condition(
            move || Instant::now() >= deadline,
            Duration::from_millis(5),
        );

        connection.run_until(|| Ok(()), &predicate).expect("condition");
        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn test_disabled_timeout_keeps_waiting() {
        let (connection, peer) = connection();
        let page = connection.register_object(&ObjectId::new("page@1"));
        let race = Waiter::new()
            .wait_for(WaitableEvent::new(&page, "load", None))
            .timeout(Duration::ZERO, "waiting for load")
            .into_race();

        let pusher = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            peer.push_event("page@1", "load", json!({ "late": true }));
            peer
        });

        let value = connection.run_until(|| Ok(()), &race).expect("load");
        assert_eq!(value["late"], true);
        let _peer = pusher.join().expect("join");
    }

    #[test]
    fn test_deadline_reads_run_inside_runtime() {
        let (connection, peer) = connection();
        peer.respond_ok();

        connection
            .send_command_with_timeout(
                &ObjectId::new("page@1"),
                CustomCommand::new("ping", json!({})),
                Duration::from_secs(5),
            )
            .expect("reply");
    }

    #[test]
    fn test_closed_connection_sleeps_until_deadline() {
        let (connection, peer) = connection();
        peer.close();
        let race = Waiter::new()
            .wait_for(WaitableNever::<Value>::new())
            .timeout(Duration::from_millis(20), "waiting after close")
            .into_race();

        // First pump observes the close, later pumps sleep
        let started = Instant::now();
        let err = connection.run_until(|| Ok(()), &race).unwrap_err();
        assert!(err.is_timeout());
        assert!(connection.is_closed());
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_max_timeout_waits_for_reply() {
        let (connection, peer) = connection();
        peer.respond_ok();

        connection
            .send_command_with_timeout(
                &ObjectId::new("page@1"),
                CustomCommand::new("ping", json!({})),
                Duration::MAX,
            )
            .expect("reply");
    }

    #[test]
    fn test_pending_cap_counts_outstanding_requests() {
        let (transport, peer) = MemoryTransport::pair();
        let options = ClientOptions::default().with_max_pending_requests(1);
        let connection = Connection::new(transport, options).expect("connection");

        // A nested request while one is outstanding exceeds the cap
        let page = connection.register_object(&ObjectId::new("page@1"));
        let weak = connection.downgrade();
        page.add("nested", move |_| match weak.upgrade() {
            Some(connection) => connection
                .send_message(&ObjectId::new("page@1"), "inner", json!({}))
                .map(drop),
            None => Ok(()),
        });
        peer.push_event("page@1", "nested", json!({}));

        let err = connection
            .send_message(&ObjectId::new("page@1"), "outer", json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
        assert!(err.to_string().contains("Too many pending requests: 1/1"));
        assert_eq!(connection.pending_count(), 0);
    }

    #[test]
    fn test_zero_timeout_member_has_no_deadline() {
        let timeout = WaitableTimeout::<Value>::new(Duration::ZERO, "x");
        assert!(timeout.wake_at().is_none());
    }
}
