//! Status decision table.
//!
//! Pure mapping from a status response to what the controller does next.
//! Rules are checked in order; the first match wins.

use super::ControllerState;
use crate::client::RobotStatus;
use crate::navigation::GridPosition;

/// What a status response asks of the agent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Service reports exploration is not running
    Stopped,
    /// Service needs or is processing an image
    AwaitImage,
    /// Step toward this cell
    MoveTo(GridPosition),
    /// Service reports the grid fully explored
    Explored,
    /// Nothing to do this cycle
    Hold,
}

/// Classify a status response
pub fn decide(status: &RobotStatus) -> Directive {
    if !status.is_running {
        Directive::Stopped
    } else if status.needs_image || status.waiting_for_image {
        Directive::AwaitImage
    } else if let Some(target) = status.next_move {
        Directive::MoveTo(target)
    } else if status.exploration_complete {
        Directive::Explored
    } else {
        Directive::Hold
    }
}

/// State entered after acting on `directive`.
///
/// `Hold` lands in `CheckingStatus` from both polling states.
pub fn next_state(directive: Directive) -> ControllerState {
    match directive {
        Directive::Stopped | Directive::Explored => ControllerState::ExplorationComplete,
        Directive::AwaitImage => ControllerState::WaitingForImage,
        Directive::MoveTo(_) => ControllerState::MovingToTarget,
        Directive::Hold => ControllerState::CheckingStatus,
    }
}
