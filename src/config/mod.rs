//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → handed to ForwardProxyManager at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the manager is built; the admission limit never changes
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ChannelConfig, ClientConfig, LogFormat, ObservabilityConfig, ProxyEndpointConfig,
    RequestConfig, RetryConfig,
};
pub use validation::{validate_config, ValidationError};
