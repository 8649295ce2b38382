//! Attention domain - stall detection for operators.
//!
//! Flags are raised by a periodic sweep, deduplicated per
//! (conversation, participant, type) against unresolved flags, and resolved
//! explicitly by an operator or implicitly when a participant responds.

mod evaluator;
mod flag;

pub use evaluator::{evaluate, AttentionThresholds};
pub use flag::{AttentionFlag, FlagType};
