//! Pull-based connector over a callback-driven HTTP client.
//!
//! The underlying client pushes body chunks through data/error/end handlers
//! and offers only pause/resume for flow control. This crate turns one such
//! response into a [`ClientResponse`] whose body is a demand-driven
//! [`futures_util::Stream`] of [`bytes::Bytes`].
//!
//! # Architecture Overview
//!
//! ```text
//!  caller                       connector                      underlying client
//!  ──────                       ─────────                      ─────────────────
//!  connect(GET, url, handler) ─▶ target check ─── relative ──▶ InvalidTarget (no I/O)
//!                                    │
//!                                    ▼
//!                               HttpClient::dispatch ────────▶ request / headers
//!                                    │
//!                                    ▼
//!  handler(ClientResponse) ◀──── ClientResponse::new(handle)
//!       │
//!       ▼
//!  body.next().await  ──demand──▶ resume() ──────────────────▶ pump reads a frame
//!                     ◀──chunk─── data handler: pause() ◀──── data
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use futures_util::TryStreamExt;
//! use pull_connector::{ConnectorConfig, Connector};
//!
//! # async fn run() -> Result<(), pull_connector::ConnectorError> {
//! let connector = Connector::new(ConnectorConfig::default()).expect("default config is valid");
//! let total = connector
//!     .connect(http::Method::GET, "http://localhost:8080/data", |mut response| async move {
//!         let mut body = response.take_body().expect("body not taken yet");
//!         let mut total = 0;
//!         while let Some(chunk) = body.try_next().await? {
//!             total += chunk.len();
//!         }
//!         Ok(total)
//!     })
//!     .await?;
//! # let _ = total;
//! # Ok(())
//! # }
//! ```

// Core subsystems
pub mod client;
pub mod error;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::ConnectorConfig;
pub use error::{BoxError, ConnectorError, ConnectorResult};
pub use crate::http::{BodyStream, ClientResponse, Connector, CookieMap, HeaderMap, ResponseCookie};
