//! Compass heading and the clockwise turn sequence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::clock::Clock;
use crate::hardware::MotorDrive;

/// One of the four cardinal directions, in clockwise order.
///
/// Grid convention: East is +x, South is +y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    /// All headings in clockwise order starting at North
    pub const ALL: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

    /// Position in the clockwise cycle (North = 0)
    pub fn index(self) -> u8 {
        match self {
            Heading::North => 0,
            Heading::East => 1,
            Heading::South => 2,
            Heading::West => 3,
        }
    }

    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    /// Heading after one quarter-turn to the right
    pub fn turned_right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Right quarter-turns needed to face `target` (0..=3)
    pub fn right_turns_to(self, target: Heading) -> u8 {
        (target.index() + 4 - self.index()) % 4
    }

    /// Grid delta of one forward cell
    pub fn unit_step(self) -> (i32, i32) {
        match self {
            Heading::North => (0, -1),
            Heading::East => (1, 0),
            Heading::South => (0, 1),
            Heading::West => (-1, 0),
        }
    }

    /// Name for logging
    pub fn name(self) -> &'static str {
        match self {
            Heading::North => "NORTH",
            Heading::East => "EAST",
            Heading::South => "SOUTH",
            Heading::West => "WEST",
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Believed heading of the robot.
///
/// Turns are right-only: reaching the heading on the left costs three
/// quarter-turns. Directive timing on the service side is tuned to this.
#[derive(Clone, Debug)]
pub struct HeadingModel {
    heading: Heading,
    turn_time: Duration,
}

impl HeadingModel {
    pub fn new(initial: Heading, turn_time: Duration) -> Self {
        Self {
            heading: initial,
            turn_time,
        }
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// Turn right in quarter steps until facing `target`.
    ///
    /// Each step drives the turn for `turn_time`, stops, and only then
    /// advances the believed heading. Returns the number of quarter-turns.
    pub fn turn_toward(
        &mut self,
        target: Heading,
        motors: &mut dyn MotorDrive,
        clock: &dyn Clock,
    ) -> u8 {
        let turns = self.heading.right_turns_to(target);
        for _ in 0..turns {
            motors.turn_right();
            clock.sleep(self.turn_time);
            motors.stop();
            self.heading = self.heading.turned_right();
            debug!("Turned right, now facing: {}", self.heading);
        }
        turns
    }
}
