//! Turn module - the fixed step graph that handles one user utterance.
//!
//! - `state` - steps, per-turn working state and routing predicates
//! - `detectors` - correction and off-topic heuristics
//! - `prompts` - reply prompts and fallbacks
//! - `machine` - step execution
//! - `context` - the per-configuration entry point

mod context;
pub mod detectors;
mod machine;
pub mod prompts;
mod state;

pub use context::{AgentContext, TurnRunner};
pub use detectors::CorrectionDecision;
pub use machine::{TurnError, TurnMachine, TurnOutcome, ValidationCheck};
pub use state::{TurnState, TurnStep};
