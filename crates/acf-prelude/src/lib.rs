//! Unified prelude for the Agent Conversation Fabric.
//!
//! This crate provides a single import to bring in the commonly used types
//! from across ACF. Use it when you need types from multiple crates
//! without managing individual imports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use acf_prelude::*;
//!
//! // Now you have access to types from:
//! // - acf-core (SessionKey, LogicalTurn, Clock, decisions)
//! // - acf-storage (session/turn stores, idempotency)
//! // - acf-mutex (the leased, fenced session lock)
//! // - acf-accumulator (the wait-window suggestion function)
//! // - acf-ledger (tool policy table, side-effect compensation)
//! // - acf-config (layered configuration)
//! // - acf-telemetry (structured logging setup)
//! // - acf-audit (the append-only turn record sink)
//! // - acf-channel (the outbound delivery boundary)
//! // - acf-brain (the pluggable cognitive engine boundary)
//! // - acf-gateway (inbound ingestion and turn admission)
//! // - acf-workflow (the per-session turn driver)
//! ```
//!
//! # Per-Crate Preludes
//!
//! If you only need types from a specific crate, use its own prelude:
//!
//! ```rust,ignore
//! use acf_core::prelude::*;
//! use acf_storage::prelude::*;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub use acf_accumulator::prelude::*;
pub use acf_audit::prelude::*;
pub use acf_brain::prelude::*;
pub use acf_channel::prelude::*;
pub use acf_config::prelude::*;
pub use acf_core::prelude::*;
pub use acf_gateway::prelude::*;
pub use acf_ledger::prelude::*;
pub use acf_mutex::prelude::*;
pub use acf_storage::prelude::*;
pub use acf_telemetry::prelude::*;
pub use acf_workflow::prelude::*;
