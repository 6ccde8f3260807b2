//! Connector error definitions.

use thiserror::Error;

/// Boxed cause reported by the underlying HTTP client.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the connector and the response adapter.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Target is not an absolute URL. No network I/O was attempted.
    #[error("URI is not absolute: {target}")]
    InvalidTarget { target: String },

    /// The underlying client could not establish or complete the exchange.
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] BoxError),

    /// The body stream failed after headers were received.
    #[error("Body read failed: {0}")]
    BodyReadFailed(#[source] BoxError),

    /// A `Set-Cookie` header could not be parsed.
    #[error("Invalid cookie '{header}': {source}")]
    InvalidCookie {
        header: String,
        #[source]
        source: cookie::ParseError,
    },

    /// The body stream was already handed out.
    #[error("Response body already taken")]
    BodyAlreadyTaken,

    /// The status code has no named classification.
    #[error("Unrecognized status code: {0}")]
    UnrecognizedStatus(u16),
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
