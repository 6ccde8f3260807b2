//! Connector and response adapter.
//!
//! # Data Flow
//! ```text
//! connect(method, target, handler)
//!     → target.rs (absolute URL check, no I/O on failure)
//!     → connector.rs (dispatch via HttpClient, exchange span)
//!     → response.rs (ClientResponse: status, headers, cookies)
//!     → body.rs (BodyStream: demand → resume, data → pause)
//!     → handler result returned to caller
//! ```
//!
//! # Design Decisions
//! - One handle, one adapter, one body consumption
//! - Backpressure is withholding resume, never blocking a thread
//! - Header names are kept exactly as the client reports them

pub mod body;
pub mod connector;
pub mod cookie;
pub mod exchange;
pub mod headers;
pub mod multimap;
pub mod response;
pub mod status;
pub mod target;

pub use body::{BodyState, BodyStream};
pub use connector::Connector;
pub use cookie::{CookieMap, ResponseCookie, SameSite};
pub use exchange::{ExchangeId, ExchangeTracker};
pub use headers::HeaderMap;
pub use multimap::MultiMap;
pub use response::ClientResponse;
pub use status::StatusClass;
pub use target::validate_target;
