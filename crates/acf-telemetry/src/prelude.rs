//! Convenience re-exports for downstream crates.
//!
//! ```ignore
//! use acf_telemetry::prelude::*;
//!
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("acf_gateway=trace");
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("gateway").with_operation("process_turn");
//! let _guard = ctx.enter();
//! ```

pub use crate::context::{RequestContext, RequestGuard};
pub use crate::error::{TelemetryError, TelemetryResult};
pub use crate::logging::{setup_default_logging, setup_logging, LogConfig, LogFormat, LogTarget};
