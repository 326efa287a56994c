//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → SerializerChain built from it, shared via Arc
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → unchanged [serializer] section? stop here
//!     → atomic swap of Arc<SerializerChain>
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the serializer section hot reloads
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    JsonConfig, JsonpConfig, ListenerConfig, ObservabilityConfig, SerializerConfig, ServerConfig,
    TimeoutConfig,
};
pub use validation::ValidationError;
