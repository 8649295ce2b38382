//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `scheduling` - Participants, slot pool, negotiation and the conversation aggregate
//! - `attention` - Attention flags and the pure stall evaluator

pub mod attention;
pub mod foundation;
pub mod scheduling;
