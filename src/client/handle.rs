//! Collaborator contract for the callback-driven HTTP client.
//!
//! # Responsibilities
//! - Describe one in-flight response as a push-registration surface
//! - Describe request dispatch as a future resolving once headers arrive
//!
//! # Design Decisions
//! - Handlers are invoked on the collaborator's own execution context
//! - `pause`/`resume` may be called from any thread; implementations marshal
//!   them onto their execution context
//! - `release` detaches every handler and lets the collaborator discard the
//!   rest of the body

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::Method;
use std::sync::Arc;
use url::Url;

use crate::error::BoxError;

/// Callback receiving one body chunk.
pub type DataHandler = Box<dyn FnMut(Bytes) + Send>;

/// Callback receiving a transport or protocol error.
pub type ErrorHandler = Box<dyn FnMut(BoxError) + Send>;

/// Callback signalling the end of the body.
pub type EndHandler = Box<dyn FnMut() + Send>;

/// One HTTP response as seen by the underlying client.
///
/// The end handler fires at most once, after every data handler call, unless
/// the error handler fired first.
pub trait ResponseHandle: Send + Sync {
    /// Raw status code as received.
    fn status_code(&self) -> u16;

    /// Header lines in arrival order, repeated names included.
    fn headers(&self) -> &[(String, String)];

    /// Raw `Set-Cookie` header values in arrival order.
    fn cookies(&self) -> &[String];

    /// Stop delivering data until the next `resume`.
    fn pause(&self);

    /// Start or continue delivering data.
    fn resume(&self);

    fn data_handler(&self, handler: Option<DataHandler>);

    fn error_handler(&self, handler: Option<ErrorHandler>);

    fn end_handler(&self, handler: Option<EndHandler>);

    /// Drop all registered handlers. No handler fires after this returns.
    fn release(&self);
}

/// Request handed to the underlying client.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl OutboundRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
        }
    }

    /// Append a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// The underlying client: performs one exchange per call.
pub trait HttpClient: Send + Sync {
    /// Send the request and resolve once response headers are available.
    fn dispatch(&self, request: OutboundRequest)
        -> BoxFuture<'_, Result<Arc<dyn ResponseHandle>, BoxError>>;
}
