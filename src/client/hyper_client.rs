//! Callback-driven client built on `hyper-util`'s pooled client.
//!
//! Each response is handed to a dedicated tokio task (the pump) that reads body
//! frames and fires the registered handlers. The pump is the execution context
//! of the handle: `pause`, `resume` and `release` are commands sent to it over
//! a channel, so they are safe to call from any thread.
//!
//! ```text
//! consumer task                 pump task
//!     resume() ──Command──▶  flowing = true
//!                            frame → data handler ──▶ pause() ──Command──▶ flowing = false
//!     resume() ──Command──▶  ...
//!                            end of body → end handler, exit
//! ```

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::header::{HeaderValue, SET_COOKIE};
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::client::handle::{
    DataHandler, EndHandler, ErrorHandler, HttpClient, OutboundRequest, ResponseHandle,
};
use crate::config::ConnectorConfig;
use crate::error::BoxError;

/// Production collaborator over a pooled HTTP/1.1 + HTTP/2 client.
///
/// Plain `http://` only: the connector is a bare `HttpConnector` without TLS,
/// so an `https://` target passes the target check but the exchange fails
/// with `ConnectionFailed`. Put a TLS-capable client behind [`HttpClient`]
/// for those.
#[derive(Clone)]
pub struct HyperClient {
    client: Client<HttpConnector, Empty<Bytes>>,
}

impl HyperClient {
    /// Create a client using the pool and timeout settings from `config`.
    pub fn new(config: &ConnectorConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(Duration::from_secs(config.timeouts.idle_secs))
            .pool_max_idle_per_host(config.pool.max_idle_per_host)
            .build(connector);

        Self { client }
    }
}

impl HttpClient for HyperClient {
    fn dispatch(
        &self,
        request: OutboundRequest,
    ) -> BoxFuture<'_, Result<Arc<dyn ResponseHandle>, BoxError>> {
        Box::pin(async move {
            let mut builder = http::Request::builder()
                .method(request.method)
                .uri(request.url.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            let req = builder.body(Empty::<Bytes>::new())?;

            let response = self.client.request(req).await?;
            tracing::trace!(status = %response.status(), "Response headers received");

            Ok(Arc::new(HyperResponseHandle::spawn(response)) as Arc<dyn ResponseHandle>)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Pause,
    Resume,
    Release,
}

#[derive(Default)]
struct Handlers {
    data: Option<DataHandler>,
    error: Option<ErrorHandler>,
    end: Option<EndHandler>,
    released: bool,
}

/// Shared handler slots.
///
/// A handler is taken out of its slot while it runs, so a handler may call back
/// into the handle without deadlocking. It is put back only if the slot was not
/// released or replaced meanwhile.
#[derive(Clone, Default)]
struct HandlerSlots(Arc<Mutex<Handlers>>);

impl HandlerSlots {
    fn lock(&self) -> MutexGuard<'_, Handlers> {
        self.0.lock().expect("handler mutex poisoned")
    }

    fn fire_data(&self, chunk: Bytes) {
        let handler = self.lock().data.take();
        if let Some(mut handler) = handler {
            handler(chunk);
            let mut slots = self.lock();
            if !slots.released && slots.data.is_none() {
                slots.data = Some(handler);
            }
        }
    }

    fn fire_error(&self, err: BoxError) {
        let handler = self.lock().error.take();
        if let Some(mut handler) = handler {
            handler(err);
        }
    }

    fn fire_end(&self) {
        let handler = self.lock().end.take();
        if let Some(mut handler) = handler {
            handler();
        }
    }
}

/// A hyper response exposed through the callback surface.
pub struct HyperResponseHandle {
    status: u16,
    headers: Vec<(String, String)>,
    cookies: Vec<String>,
    slots: HandlerSlots,
    commands: mpsc::UnboundedSender<Command>,
}

impl HyperResponseHandle {
    /// Take ownership of the response and start its pump task.
    ///
    /// The pump reads nothing until the first `resume`.
    pub fn spawn(response: http::Response<Incoming>) -> Self {
        let (parts, body) = response.into_parts();

        let headers = parts
            .headers
            .iter()
            .map(|(name, value)| (name.as_str().to_owned(), header_text(value)))
            .collect();
        let cookies = parts
            .headers
            .get_all(SET_COOKIE)
            .iter()
            .map(header_text)
            .collect();

        let slots = HandlerSlots::default();
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(pump(body, rx, slots.clone()));

        Self {
            status: parts.status.as_u16(),
            headers,
            cookies,
            slots,
            commands,
        }
    }

    fn send(&self, command: Command) {
        // The pump may already be gone after end or error.
        let _ = self.commands.send(command);
    }
}

impl ResponseHandle for HyperResponseHandle {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    fn cookies(&self) -> &[String] {
        &self.cookies
    }

    fn pause(&self) {
        self.send(Command::Pause);
    }

    fn resume(&self) {
        self.send(Command::Resume);
    }

    fn data_handler(&self, handler: Option<DataHandler>) {
        let mut slots = self.slots.lock();
        if !slots.released {
            slots.data = handler;
        }
    }

    fn error_handler(&self, handler: Option<ErrorHandler>) {
        let mut slots = self.slots.lock();
        if !slots.released {
            slots.error = handler;
        }
    }

    fn end_handler(&self, handler: Option<EndHandler>) {
        let mut slots = self.slots.lock();
        if !slots.released {
            slots.end = handler;
        }
    }

    fn release(&self) {
        {
            let mut slots = self.slots.lock();
            slots.data = None;
            slots.error = None;
            slots.end = None;
            slots.released = true;
        }
        self.send(Command::Release);
    }
}

/// Decode a header value as ISO-8859-1.
///
/// Every byte maps to one char, so obs-text such as a Latin-1 `é` survives
/// instead of becoming U+FFFD.
fn header_text(value: &HeaderValue) -> String {
    value.as_bytes().iter().map(|&b| char::from(b)).collect()
}

/// Event loop for one response body.
///
/// Commands are always drained before the next frame is read, so a pause sent
/// from inside a data handler takes effect before any further data.
async fn pump(mut body: Incoming, mut commands: mpsc::UnboundedReceiver<Command>, slots: HandlerSlots) {
    let mut flowing = false;

    loop {
        if !flowing {
            match commands.recv().await {
                Some(Command::Resume) => flowing = true,
                Some(Command::Pause) => {}
                Some(Command::Release) | None => break,
            }
            continue;
        }

        tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(Command::Pause) => flowing = false,
                Some(Command::Resume) => {}
                Some(Command::Release) | None => break,
            },
            frame = body.frame() => match frame {
                Some(Ok(frame)) => {
                    // Trailers carry no body bytes.
                    if let Ok(data) = frame.into_data() {
                        if !data.is_empty() {
                            slots.fire_data(data);
                        }
                    }
                }
                Some(Err(err)) => {
                    tracing::debug!(error = %err, "Response body failed");
                    slots.fire_error(Box::new(err));
                    break;
                }
                None => {
                    slots.fire_end();
                    break;
                }
            },
        }
    }

    tracing::trace!("Response pump finished");
}
