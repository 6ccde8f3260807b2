//! Underlying HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! Connector
//!     → HttpClient::dispatch (request out, headers back)
//!     → ResponseHandle (status, headers, cookies, pause/resume + handlers)
//!     → handed to the response adapter
//! ```
//!
//! # Design Decisions
//! - The adapter only sees the traits in `handle.rs`; any client with a
//!   callback surface can sit behind them
//! - `hyper_client.rs` is the production implementation

pub mod handle;
pub mod hyper_client;

pub use handle::{
    DataHandler, EndHandler, ErrorHandler, HttpClient, OutboundRequest, ResponseHandle,
};
pub use hyper_client::{HyperClient, HyperResponseHandle};
