//! Domain layer containing the intake logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, errors, state machine)
//! - `conversation` - The conversation record and its lifecycle
//! - `fields` - Field definitions, extraction contract, value validation
//! - `agent` - Agent definition and personality
//! - `escalation` - Escalation policies, handlers and engine
//! - `capability` - Sanitized calls to the text capability
//! - `turn` - The turn state machine

pub mod agent;
pub mod capability;
pub mod conversation;
pub mod escalation;
pub mod fields;
pub mod foundation;
pub mod turn;
