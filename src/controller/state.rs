//! Controller states.

use std::fmt;

/// Exploration controller state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControllerState {
    /// Polling the service for the next directive
    #[default]
    CheckingStatus,

    /// Stepping one cell per tick toward the stored target
    MovingToTarget,

    /// Service is busy with an image; keep polling
    WaitingForImage,

    /// Exploration finished; idle forever
    ExplorationComplete,

    /// Handshake or report failed; probing for recovery
    ErrorState,
}

impl ControllerState {
    /// No further transitions out of this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ControllerState::ExplorationComplete)
    }

    /// States whose handler polls `/robot/status`
    pub fn is_polling(&self) -> bool {
        matches!(
            self,
            ControllerState::CheckingStatus | ControllerState::WaitingForImage
        )
    }

    /// State name for logging
    pub fn name(&self) -> &'static str {
        match self {
            ControllerState::CheckingStatus => "CHECKING_STATUS",
            ControllerState::MovingToTarget => "MOVING_TO_TARGET",
            ControllerState::WaitingForImage => "WAITING_FOR_IMAGE",
            ControllerState::ExplorationComplete => "EXPLORATION_COMPLETE",
            ControllerState::ErrorState => "ERROR_STATE",
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
