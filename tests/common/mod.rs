//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap as AxumHeaders, Response, StatusCode},
    routing::get,
    Router,
};
use bytes::Bytes;
use futures_util::{future::BoxFuture, stream, StreamExt};
use pull_connector::client::{
    DataHandler, EndHandler, ErrorHandler, HttpClient, OutboundRequest, ResponseHandle,
};
use pull_connector::BoxError;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One scripted callback of a mock response.
#[derive(Debug, Clone)]
pub enum Event {
    Data(&'static str),
    Error(&'static str),
    End,
}

/// How a mock handle plays its script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// One event per `resume`, delivered synchronously inside the call.
    OnResume,
    /// Every event as soon as its handler is registered, ignoring pause.
    OnRegister,
    /// Nothing automatic; the test calls `emit_*`.
    Manual,
}

#[derive(Default)]
struct Handlers {
    data: Option<DataHandler>,
    error: Option<ErrorHandler>,
    end: Option<EndHandler>,
}

/// Response handle that records flow control and plays a script.
pub struct MockHandle {
    status: u16,
    headers: Vec<(String, String)>,
    cookies: Vec<String>,
    delivery: Delivery,
    script: Mutex<VecDeque<Event>>,
    handlers: Mutex<Handlers>,
    pauses: AtomicUsize,
    resumes: AtomicUsize,
    releases: AtomicUsize,
}

impl MockHandle {
    pub fn new(delivery: Delivery, script: Vec<Event>) -> Arc<Self> {
        Self::build(200, Vec::new(), Vec::new(), delivery, script)
    }

    pub fn with_meta(
        status: u16,
        headers: &[(&str, &str)],
        cookies: &[&str],
        script: Vec<Event>,
    ) -> Arc<Self> {
        Self::build(
            status,
            headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            cookies.iter().map(|c| c.to_string()).collect(),
            Delivery::OnResume,
            script,
        )
    }

    fn build(
        status: u16,
        headers: Vec<(String, String)>,
        cookies: Vec<String>,
        delivery: Delivery,
        script: Vec<Event>,
    ) -> Arc<Self> {
        Arc::new(Self {
            status,
            headers,
            cookies,
            delivery,
            script: Mutex::new(script.into()),
            handlers: Mutex::new(Handlers::default()),
            pauses: AtomicUsize::new(0),
            resumes: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        })
    }

    pub fn as_handle(self: &Arc<Self>) -> Arc<dyn ResponseHandle> {
        Arc::clone(self) as Arc<dyn ResponseHandle>
    }

    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn resumes(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn has_handlers(&self) -> bool {
        let handlers = self.handlers.lock().unwrap();
        handlers.data.is_some() || handlers.error.is_some() || handlers.end.is_some()
    }

    /// Remove the data handler, as if the client had it mid-call.
    pub fn take_data_handler(&self) -> Option<DataHandler> {
        self.handlers.lock().unwrap().data.take()
    }

    pub fn emit_data(&self, chunk: &'static str) {
        let handler = self.handlers.lock().unwrap().data.take();
        if let Some(mut handler) = handler {
            handler(Bytes::from_static(chunk.as_bytes()));
            let mut handlers = self.handlers.lock().unwrap();
            if handlers.data.is_none() && self.releases() == 0 {
                handlers.data = Some(handler);
            }
        }
    }

    pub fn emit_error(&self, message: &'static str) {
        let handler = self.handlers.lock().unwrap().error.take();
        if let Some(mut handler) = handler {
            handler(message.into());
        }
    }

    pub fn emit_end(&self) {
        let handler = self.handlers.lock().unwrap().end.take();
        if let Some(mut handler) = handler {
            handler();
        }
    }

    fn play(&self, event: Event) {
        match event {
            Event::Data(chunk) => self.emit_data(chunk),
            Event::Error(message) => self.emit_error(message),
            Event::End => self.emit_end(),
        }
    }

    fn next_event(&self) -> Option<Event> {
        self.script.lock().unwrap().pop_front()
    }

    /// Pop leading events matching `wanted`.
    fn drain_leading(&self, wanted: fn(&Event) -> bool) -> Vec<Event> {
        let mut script = self.script.lock().unwrap();
        let mut events = Vec::new();
        while script.front().map(wanted).unwrap_or(false) {
            events.extend(script.pop_front());
        }
        events
    }
}

impl ResponseHandle for MockHandle {
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
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        if self.delivery == Delivery::OnResume {
            if let Some(event) = self.next_event() {
                self.play(event);
            }
        }
    }

    fn data_handler(&self, handler: Option<DataHandler>) {
        self.handlers.lock().unwrap().data = handler;
        if self.delivery == Delivery::OnRegister {
            for event in self.drain_leading(|e| matches!(e, Event::Data(_))) {
                self.play(event);
            }
        }
    }

    fn error_handler(&self, handler: Option<ErrorHandler>) {
        self.handlers.lock().unwrap().error = handler;
    }

    fn end_handler(&self, handler: Option<EndHandler>) {
        self.handlers.lock().unwrap().end = handler;
        if self.delivery == Delivery::OnRegister {
            for event in self.drain_leading(|e| !matches!(e, Event::Data(_))) {
                self.play(event);
            }
        }
    }

    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        *self.handlers.lock().unwrap() = Handlers::default();
    }
}

/// Underlying client that counts dispatches and returns a canned outcome.
pub struct MockClient {
    outcome: Mutex<Option<Result<Arc<MockHandle>, &'static str>>>,
    hang: bool,
    dispatched: AtomicUsize,
    last_request: Mutex<Option<OutboundRequest>>,
}

impl MockClient {
    pub fn responding(handle: Arc<MockHandle>) -> Arc<Self> {
        Self::build(Some(Ok(handle)), false)
    }

    pub fn failing(message: &'static str) -> Arc<Self> {
        Self::build(Some(Err(message)), false)
    }

    /// Never produces response headers.
    pub fn hanging() -> Arc<Self> {
        Self::build(None, true)
    }

    fn build(outcome: Option<Result<Arc<MockHandle>, &'static str>>, hang: bool) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(outcome),
            hang,
            dispatched: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<OutboundRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

impl HttpClient for MockClient {
    fn dispatch(
        &self,
        request: OutboundRequest,
    ) -> BoxFuture<'_, Result<Arc<dyn ResponseHandle>, BoxError>> {
        Box::pin(async move {
            self.dispatched.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request);
            if self.hang {
                std::future::pending::<()>().await;
            }
            match self.outcome.lock().unwrap().take() {
                Some(Ok(handle)) => Ok(handle.as_handle()),
                Some(Err(message)) => Err(message.into()),
                None => Err("mock client already used".into()),
            }
        })
    }
}

/// Start a mock backend on an ephemeral port.
///
/// Routes:
/// - `/chunks`: "chunk 1", "chunk 2" as separate writes
/// - `/large`: 64 chunks of 1 KiB
/// - `/cookies`: two `Set-Cookie` headers and a repeated `x-multi` header
/// - `/status/299`: an unregistered status code
/// - `/broken`: one chunk, then the connection is cut
/// - `/agent`: echoes the `User-Agent` request header
pub async fn start_backend() -> SocketAddr {
    let app = Router::new()
        .route("/chunks", get(|| async { Body::from_stream(delayed(vec!["chunk 1", "chunk 2"])) }))
        .route("/large", get(|| async { Body::from_stream(delayed(vec![large_chunk(); 64])) }))
        .route("/cookies", get(cookies_response))
        .route(
            "/status/299",
            get(|| async {
                Response::builder()
                    .status(StatusCode::from_u16(299).unwrap())
                    .body(Body::from("odd"))
                    .unwrap()
            }),
        )
        .route("/broken", get(|| async { Body::from_stream(broken()) }))
        .route(
            "/agent",
            get(|headers: AxumHeaders| async move {
                headers
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string()
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a backend that answers every connection with `response` verbatim.
///
/// Used for responses axum will not produce, such as non-UTF-8 header bytes.
pub async fn start_raw_backend(response: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = stream.write_all(response).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

fn large_chunk() -> &'static str {
    static CHUNK: OnceLock<String> = OnceLock::new();
    CHUNK.get_or_init(|| "x".repeat(1024))
}

fn delayed(
    chunks: Vec<&'static str>,
) -> impl futures_util::Stream<Item = Result<&'static str, Infallible>> + Send + 'static {
    stream::iter(chunks).then(|chunk| async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(chunk)
    })
}

fn broken() -> impl futures_util::Stream<Item = Result<&'static str, std::io::Error>> + Send + 'static
{
    stream::iter(vec![
        Ok("partial"),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "backend died")),
    ])
    .then(|item| async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        item
    })
}

async fn cookies_response() -> Response<Body> {
    Response::builder()
        .header(header::SET_COOKIE, "session=abc; Path=/; HttpOnly")
        .header(header::SET_COOKIE, "theme=dark; Max-Age=60")
        .header("x-multi", "one")
        .header("x-multi", "two")
        .body(Body::from("cookies"))
        .unwrap()
}
