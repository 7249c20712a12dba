//! Timed drive over a dual H-bridge.

use std::time::Duration;

use super::{DriveLines, MotorDrive};
use crate::clock::SharedClock;

/// Levels of the four bridge inputs (A = left motor, B = right motor)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeState {
    pub a1: bool,
    pub a2: bool,
    pub b1: bool,
    pub b2: bool,
}

impl BridgeState {
    /// Both motors forward
    pub const FORWARD: BridgeState = BridgeState {
        a1: true,
        a2: false,
        b1: true,
        b2: false,
    };

    /// Left motor reversed, right motor forward
    pub const TURN_RIGHT: BridgeState = BridgeState {
        a1: false,
        a2: true,
        b1: true,
        b2: false,
    };

    /// All inputs low (coast)
    pub const STOPPED: BridgeState = BridgeState {
        a1: false,
        a2: false,
        b1: false,
        b2: false,
    };
}

/// [`MotorDrive`] that holds bridge patterns for fixed durations
pub struct BridgeDrive<L: DriveLines> {
    lines: L,
    clock: SharedClock,
    move_time: Duration,
}

impl<L: DriveLines> BridgeDrive<L> {
    pub fn new(lines: L, clock: SharedClock, move_time: Duration) -> Self {
        Self {
            lines,
            clock,
            move_time,
        }
    }
}

impl<L: DriveLines> MotorDrive for BridgeDrive<L> {
    fn forward_one_cell(&mut self) {
        self.lines.set(BridgeState::FORWARD);
        self.clock.sleep(self.move_time);
        self.stop();
    }

    fn turn_right(&mut self) {
        self.lines.set(BridgeState::TURN_RIGHT);
    }

    fn stop(&mut self) {
        self.lines.set(BridgeState::STOPPED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct RecordingLines(Arc<Mutex<Vec<BridgeState>>>);

    impl DriveLines for RecordingLines {
        fn set(&mut self, state: BridgeState) {
            self.0.lock().push(state);
        }
    }

    #[test]
    fn test_forward_holds_then_stops() {
        let clock = ManualClock::new();
        let lines = RecordingLines::default();
        let mut drive = BridgeDrive::new(lines.clone(), clock.shared(), Duration::from_millis(800));

        drive.forward_one_cell();

        assert_eq!(
            *lines.0.lock(),
            vec![BridgeState::FORWARD, BridgeState::STOPPED]
        );
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(800)]);
    }

    #[test]
    fn test_turn_right_only_sets_pattern() {
        let clock = ManualClock::new();
        let lines = RecordingLines::default();
        let mut drive = BridgeDrive::new(lines.clone(), clock.shared(), Duration::from_millis(800));

        drive.turn_right();

        assert_eq!(*lines.0.lock(), vec![BridgeState::TURN_RIGHT]);
        assert!(clock.sleeps().is_empty());
    }
}
