//! Convenience re-exports for downstream crates.

pub use crate::artifact::{Fingerprint, PhaseArtifact};
pub use crate::channel::{ChannelModel, MessageBatching};
pub use crate::clock::{Clock, SystemClock};
pub use crate::decision::{AccumulationDecision, SupersedeAction, SupersedeDecision, TurnDecision};
pub use crate::error::{CoreError, CoreResult};
pub use crate::ids::{FencingToken, SessionKey, TurnGroupId, TurnId};
pub use crate::session::{Session, SessionStatus, StepHistoryEntry};
pub use crate::side_effect::{SideEffect, SideEffectPolicy};
pub use crate::turn::{CompletionReason, LogicalTurn, ScenarioSnapshot, TurnStatus};
pub use crate::turn_result::{InterruptedTurn, TurnResult};
