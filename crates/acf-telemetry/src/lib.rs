//! ACF Telemetry — structured logging setup and request correlation
//! context for the Agent Conversation Fabric.
//!
//! This crate provides:
//! - [`LogConfig`]/[`setup_logging`]/[`setup_default_logging`], installing
//!   an `EnvFilter`-driven `tracing-subscriber` layer at startup
//! - [`RequestContext`], a correlation id carried across a logical turn's
//!   lifetime so log lines from every stage can be joined back together

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod context;
pub mod error;
pub mod logging;

pub mod prelude;

pub use context::{RequestContext, RequestGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{setup_default_logging, setup_logging, LogConfig, LogFormat, LogTarget};
