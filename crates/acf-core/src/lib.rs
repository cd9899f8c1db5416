//! ACF Core — foundation types and traits for the Agent Conversation Fabric.
//!
//! This crate provides:
//! - The session key and fencing-token primitives that every store keys on
//! - The [`Session`] and [`LogicalTurn`] data model
//! - Phase artifacts and side-effect policy types
//! - The channel model read by the accumulator and gateway
//! - Turn decisions and turn results exchanged between the gateway, the
//!   workflow, and the Brain
//! - A pluggable [`Clock`] so time-dependent components are deterministic
//!   under test
//!
//! No I/O lives here; this crate is pure data and logic.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod artifact;
pub mod channel;
pub mod clock;
pub mod decision;
pub mod error;
pub mod ids;
pub mod session;
pub mod side_effect;
pub mod turn;
pub mod turn_result;

pub mod prelude;

pub use artifact::{Fingerprint, PhaseArtifact};
pub use channel::{ChannelModel, MessageBatching};
pub use clock::{Clock, SystemClock};
pub use decision::{AccumulationDecision, SupersedeAction, SupersedeDecision, TurnDecision};
pub use error::{CoreError, CoreResult};
pub use ids::{FencingToken, SessionKey, TurnGroupId, TurnId};
pub use session::{Session, SessionStatus, StepHistoryEntry};
pub use side_effect::{SideEffect, SideEffectPolicy};
pub use turn::{CompletionReason, LogicalTurn, ScenarioSnapshot, TurnStatus};
pub use turn_result::{InterruptedTurn, TurnResult};
