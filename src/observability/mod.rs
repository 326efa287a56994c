//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Serializers and middleware produce:
//!     → logging.rs (structured log events, request ID field)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stdout (text or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
