//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ConnectorConfig (validated, immutable)
//!     → checked again and read once by Connector::new / with_client
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a new Connector picks up changes
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ConnectorConfig;
pub use schema::TimeoutConfig;
pub use schema::PoolConfig;
pub use schema::ClientConfig;
pub use schema::ObservabilityConfig;
