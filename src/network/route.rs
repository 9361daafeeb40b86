//! Intercepted requests and their route handles.
//!
//! Every intercepted request is delivered to handlers as a [`Route`]. A
//! handler settles it with exactly one of [`Route::resume`],
//! [`Route::fulfill`] or [`Route::abort`], or passes it on with
//! [`Route::fallback`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::ObjectId;
use crate::protocol::{Header, RouteCommand};
use crate::transport::Connection;

// ============================================================================
// Constants
// ============================================================================

/// Error code sent by [`Route::abort`] when none is given.
pub const DEFAULT_ABORT_ERROR_CODE: &str = "failed";

// ============================================================================
// InterceptedRequest
// ============================================================================

/// Data about an intercepted network request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    /// Request URL.
    pub url: String,

    /// HTTP method (GET, POST, etc.).
    pub method: String,

    /// Request headers in wire order.
    pub headers: Vec<Header>,

    /// Base64 encoded request body, if any.
    pub post_data: Option<String>,

    /// Resource type (document, script, image, etc.).
    pub resource_type: String,

    /// Whether the request drives a navigation.
    pub is_navigation_request: bool,
}

impl InterceptedRequest {
    /// Parses request data from event params.
    ///
    /// Missing fields fall back to defaults.
    #[must_use]
    pub fn from_params(params: &Value) -> Self {
        Self {
            url: params
                .get("url")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            method: params
                .get("method")
                .and_then(|v| v.as_str())
                .unwrap_or("GET")
                .to_string(),
            headers: params
                .get("headers")
                .and_then(|v| v.as_array())
                .map(|headers| headers.iter().filter_map(parse_header).collect())
                .unwrap_or_default(),
            post_data: params
                .get("postData")
                .and_then(|v| v.as_str())
                .map(ToString::to_string),
            resource_type: params
                .get("resourceType")
                .and_then(|v| v.as_str())
                .unwrap_or("other")
                .to_string(),
            is_navigation_request: params
                .get("isNavigationRequest")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        }
    }

    /// Returns the first value of a header, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_str())
    }

    /// Decodes the request body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the body is not valid base64.
    pub fn post_data_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.post_data
            .as_deref()
            .map(|data| {
                BASE64
                    .decode(data)
                    .map_err(|e| Error::protocol(format!("Invalid post data: {e}")))
            })
            .transpose()
    }
}

/// Parses one `{name, value}` header object.
fn parse_header(value: &Value) -> Option<Header> {
    let name = value.get("name")?.as_str()?;
    let value = value.get("value")?.as_str()?;
    Some(Header::new(name, value))
}

// ============================================================================
// ContinueOptions
// ============================================================================

/// Overrides applied when a request proceeds.
///
/// Also used by [`Route::fallback`], where the overrides are visible to the
/// handlers consulted next and to the final resume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinueOptions {
    /// Override URL.
    pub url: Option<String>,
    /// Override HTTP method.
    pub method: Option<String>,
    /// Override headers.
    pub headers: Option<Vec<Header>>,
    /// Override request body.
    pub post_data: Option<Vec<u8>>,
}

/// Overrides passed to [`Route::fallback`].
pub type FallbackOptions = ContinueOptions;

impl ContinueOptions {
    /// Creates empty options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the URL.
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Overrides the HTTP method.
    #[inline]
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Overrides the headers.
    #[inline]
    #[must_use]
    pub fn headers(mut self, headers: Vec<Header>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Overrides the request body.
    #[inline]
    #[must_use]
    pub fn post_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.post_data = Some(data.into());
        self
    }

    /// Layers `newer` on top of `self`. Fields set in `newer` win.
    fn merge(&mut self, newer: ContinueOptions) {
        if newer.url.is_some() {
            self.url = newer.url;
        }
        if newer.method.is_some() {
            self.method = newer.method;
        }
        if newer.headers.is_some() {
            self.headers = newer.headers;
        }
        if newer.post_data.is_some() {
            self.post_data = newer.post_data;
        }
    }

    fn into_command(self, is_fallback: bool) -> RouteCommand {
        RouteCommand::Continue {
            url: self.url,
            method: self.method,
            headers: self.headers,
            post_data: self.post_data.map(|data| BASE64.encode(data)),
            is_fallback,
        }
    }
}

// ============================================================================
// FulfillOptions
// ============================================================================

/// Locally produced response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillOptions {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<Header>,
    /// Response body.
    pub body: Vec<u8>,
}

impl Default for FulfillOptions {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

impl FulfillOptions {
    /// Creates an empty `200` response.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status code.
    #[inline]
    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Adds a header.
    #[inline]
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header::new(name, value));
        self
    }

    /// Sets the `content-type` header.
    #[inline]
    #[must_use]
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.header("content-type", content_type)
    }

    /// Sets the body.
    #[inline]
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    fn into_command(self) -> RouteCommand {
        RouteCommand::Fulfill {
            status: self.status,
            headers: self.headers,
            body: BASE64.encode(self.body),
            is_base64: true,
        }
    }
}

// ============================================================================
// Route
// ============================================================================

/// Mutable per-request routing state.
#[derive(Debug, Default)]
struct RouteState {
    /// A decision was sent.
    handled: bool,
    /// The current handler called `fallback`.
    fallback_called: bool,
    /// A later `fallback` resumes the request directly.
    resume_on_fallback: bool,
    /// Accumulated fallback overrides.
    overrides: ContinueOptions,
}

struct RouteInner {
    guid: ObjectId,
    request: InterceptedRequest,
    connection: Connection,
    state: Mutex<RouteState>,
}

/// Handle to one intercepted request.
///
/// Cheap to clone; clones share the same state. A handler may keep a clone
/// and settle the request after returning.
#[derive(Clone)]
pub struct Route {
    inner: Arc<RouteInner>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("guid", &self.inner.guid)
            .field("url", &self.inner.request.url)
            .field("state", &*self.inner.state.lock())
            .finish()
    }
}

impl Route {
    /// Creates a route handle.
    #[must_use]
    pub fn new(guid: ObjectId, request: InterceptedRequest, connection: Connection) -> Self {
        Self {
            inner: Arc::new(RouteInner {
                guid,
                request,
                connection,
                state: Mutex::new(RouteState::default()),
            }),
        }
    }

    /// Parses a `route` event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the event carries no route guid.
    pub fn from_event(params: &Value, connection: Connection) -> Result<Self> {
        let guid = params
            .get("route")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::protocol("No route guid in route event"))?;
        let request = params
            .get("request")
            .map(InterceptedRequest::from_params)
            .ok_or_else(|| Error::protocol("No request in route event"))?;

        Ok(Self::new(ObjectId::new(guid), request, connection))
    }

    /// Returns the route object guid.
    #[inline]
    #[must_use]
    pub fn guid(&self) -> &ObjectId {
        &self.inner.guid
    }

    /// Returns the request as seen by the current handler.
    ///
    /// Overrides from earlier `fallback` calls are applied.
    #[must_use]
    pub fn request(&self) -> InterceptedRequest {
        let state = self.inner.state.lock();
        let overrides = &state.overrides;
        let mut request = self.inner.request.clone();

        if let Some(url) = &overrides.url {
            request.url.clone_from(url);
        }
        if let Some(method) = &overrides.method {
            request.method.clone_from(method);
        }
        if let Some(headers) = &overrides.headers {
            request.headers.clone_from(headers);
        }
        if let Some(data) = &overrides.post_data {
            request.post_data = Some(BASE64.encode(data));
        }
        request
    }

    /// Returns the request exactly as intercepted.
    #[inline]
    #[must_use]
    pub fn original_request(&self) -> &InterceptedRequest {
        &self.inner.request
    }

    /// Returns `true` once a decision was sent.
    #[inline]
    #[must_use]
    pub fn is_handled(&self) -> bool {
        self.inner.state.lock().handled
    }
}

// ============================================================================
// Route - Decisions
// ============================================================================

impl Route {
    /// Lets the request proceed, applying `options` over any fallback
    /// overrides.
    ///
    /// # Errors
    ///
    /// - [`Error::RouteAlreadyHandled`] if a decision was already sent
    /// - errors from sending the command
    pub fn resume(&self, options: ContinueOptions) -> Result<()> {
        let mut merged = self.begin_decision()?;
        merged.merge(options);
        self.send(merged.into_command(false))
    }

    /// Answers the request locally.
    ///
    /// # Errors
    ///
    /// See [`Route::resume`].
    pub fn fulfill(&self, options: FulfillOptions) -> Result<()> {
        self.begin_decision()?;
        self.send(options.into_command())
    }

    /// Fails the request with `error_code` (default `failed`).
    ///
    /// # Errors
    ///
    /// See [`Route::resume`].
    pub fn abort(&self, error_code: Option<&str>) -> Result<()> {
        self.begin_decision()?;
        self.send(RouteCommand::Abort {
            error_code: error_code.unwrap_or(DEFAULT_ABORT_ERROR_CODE).to_string(),
        })
    }

    /// Passes the request to the next matching handler.
    ///
    /// `options` are layered over earlier overrides. When the handler that
    /// calls this has already returned, the request is resumed directly.
    ///
    /// # Errors
    ///
    /// - [`Error::RouteAlreadyHandled`] if a decision was already sent
    /// - errors from the direct resume
    pub fn fallback(&self, options: FallbackOptions) -> Result<()> {
        let resume_now = {
            let mut state = self.inner.state.lock();
            if state.handled {
                return Err(Error::route_already_handled(&self.inner.request.url));
            }
            state.overrides.merge(options);
            state.fallback_called = true;
            state.resume_on_fallback
        };

        if resume_now {
            debug!(url = %self.inner.request.url, "Late fallback resumes request");
            self.resume_fallback()?;
        }
        Ok(())
    }

    /// Resumes a request no handler decided on.
    pub(crate) fn resume_fallback(&self) -> Result<()> {
        let overrides = self.begin_decision()?;
        self.send(overrides.into_command(true))
    }

    /// Marks the route handled, returning the accumulated overrides.
    fn begin_decision(&self) -> Result<ContinueOptions> {
        let mut state = self.inner.state.lock();
        if state.handled {
            return Err(Error::route_already_handled(&self.inner.request.url));
        }
        state.handled = true;
        Ok(state.overrides.clone())
    }

    fn send(&self, command: RouteCommand) -> Result<()> {
        self.inner.connection.send_command(&self.inner.guid, command)?;
        Ok(())
    }
}

// ============================================================================
// Route - Router Hooks
// ============================================================================

impl Route {
    /// Prepares the route for the next handler.
    pub(crate) fn begin_handler(&self) {
        self.inner.state.lock().fallback_called = false;
    }

    /// Returns `true` if the last handler called `fallback`.
    pub(crate) fn fallback_called(&self) -> bool {
        self.inner.state.lock().fallback_called
    }

    /// Arms direct resumption for a handler that kept the route.
    pub(crate) fn set_resume_on_fallback(&self) {
        self.inner.state.lock().resume_on_fallback = true;
    }
}

// ============================================================================
// Tests
// ============================================================================
