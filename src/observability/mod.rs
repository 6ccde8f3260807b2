//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Connector and body streams produce:
//!     → logging.rs (structured log events, exchange spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Whatever metrics recorder the host application installs
//! ```

pub mod logging;
pub mod metrics;
