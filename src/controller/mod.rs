//! Exploration state machine.

mod decision;
mod machine;
mod state;

pub use decision::{Directive, decide, next_state};
pub use machine::{ExplorationController, LoopControl, Progress};
pub use state::ControllerState;
