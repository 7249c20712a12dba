//! Simulated grid world.
//!
//! Stands in for the drive hardware, the transducer and the radio link. The
//! world implements the low-level seams ([`DriveLines`], [`EchoPulse`],
//! [`Link`]), so the real [`BridgeDrive`] timing and [`Ultrasonic`]
//! conversion run unchanged on top of it.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{BridgeDrive, BridgeState, DriveLines, EchoPulse, Ultrasonic, cm_to_echo};
use crate::clock::SharedClock;
use crate::config::{MotionConfig, SimulationConfig};
use crate::link::Link;
use crate::navigation::{GridPosition, Heading};

/// Ground truth of the simulated robot and its surroundings
#[derive(Debug)]
struct SimWorld {
    obstacles: HashSet<GridPosition>,
    cell_size_cm: u32,
    sensor_range_cells: u32,
    position: GridPosition,
    heading: Heading,
    lines: BridgeState,
    collisions: u32,
    link_up: bool,
    failing_reconnects: u32,
    link_begins: u32,
}

impl SimWorld {
    /// Distance from the robot's cell center to the face of the first
    /// blocked cell ahead, if one is within sensor range
    fn distance_ahead_cm(&self) -> Option<u32> {
        let mut cell = self.position;
        for k in 1..=self.sensor_range_cells {
            cell = cell.stepped(self.heading);
            if self.obstacles.contains(&cell) {
                return Some(k * self.cell_size_cm - self.cell_size_cm / 2);
            }
        }
        None
    }

    /// Apply the motion completed when the bridge returns to stopped
    fn settle(&mut self, previous: BridgeState) {
        if previous == BridgeState::FORWARD {
            let next = self.position.stepped(self.heading);
            if self.obstacles.contains(&next) {
                self.collisions += 1;
                warn!("[Sim] Collision driving into {} from {}", next, self.position);
            } else {
                self.position = next;
                debug!("[Sim] Robot now at {}", self.position);
            }
        } else if previous == BridgeState::TURN_RIGHT {
            self.heading = self.heading.turned_right();
            debug!("[Sim] Robot now facing {}", self.heading);
        }
    }
}

/// Handle to a shared simulated world. Clones see the same world.
#[derive(Clone, Debug)]
pub struct SimHandle {
    world: Arc<Mutex<SimWorld>>,
}

impl SimHandle {
    /// Robot at the origin facing `heading`, link up
    pub fn new(config: &SimulationConfig, heading: Heading) -> Self {
        Self {
            world: Arc::new(Mutex::new(SimWorld {
                obstacles: config.obstacles.iter().copied().collect(),
                cell_size_cm: config.cell_size_cm,
                sensor_range_cells: config.sensor_range_cells,
                position: GridPosition::ORIGIN,
                heading,
                lines: BridgeState::STOPPED,
                collisions: 0,
                link_up: true,
                failing_reconnects: 0,
                link_begins: 0,
            })),
        }
    }

    /// Ultrasonic sensor reading this world
    pub fn sensor(&self, motion: &MotionConfig) -> Ultrasonic<SimEcho> {
        Ultrasonic::new(SimEcho(self.clone()), motion.echo_timeout())
    }

    /// Bridge drive moving the robot in this world
    pub fn drive(&self, motion: &MotionConfig, clock: SharedClock) -> BridgeDrive<SimLines> {
        BridgeDrive::new(SimLines(self.clone()), clock, motion.move_time())
    }

    /// Radio link of this world
    pub fn link(&self) -> SimLink {
        SimLink(self.clone())
    }

    pub fn position(&self) -> GridPosition {
        self.world.lock().position
    }

    pub fn heading(&self) -> Heading {
        self.world.lock().heading
    }

    /// Forward moves that hit an obstacle
    pub fn collisions(&self) -> u32 {
        self.world.lock().collisions
    }

    pub fn add_obstacle(&self, cell: GridPosition) {
        self.world.lock().obstacles.insert(cell);
    }

    pub fn remove_obstacle(&self, cell: GridPosition) {
        self.world.lock().obstacles.remove(&cell);
    }

    pub fn set_link_up(&self, up: bool) {
        self.world.lock().link_up = up;
    }

    /// Make the next `count` reconnects fail
    pub fn fail_reconnects(&self, count: u32) {
        self.world.lock().failing_reconnects = count;
    }

    /// Reconnects attempted so far
    pub fn link_begins(&self) -> u32 {
        self.world.lock().link_begins
    }
}

/// Bridge inputs wired to the simulated motors
pub struct SimLines(SimHandle);

impl DriveLines for SimLines {
    fn set(&mut self, state: BridgeState) {
        let mut world = self.0.world.lock();
        let previous = world.lines;
        world.lines = state;
        if state == BridgeState::STOPPED {
            world.settle(previous);
        }
    }
}

/// Transducer reporting the simulated echo
pub struct SimEcho(SimHandle);

impl EchoPulse for SimEcho {
    fn pulse(&mut self, timeout: Duration) -> Option<Duration> {
        let distance = self.0.world.lock().distance_ahead_cm()?;
        let echo = cm_to_echo(distance);
        (echo <= timeout).then_some(echo)
    }
}

/// Simulated radio link
pub struct SimLink(SimHandle);

impl Link for SimLink {
    fn is_connected(&self) -> bool {
        self.0.world.lock().link_up
    }

    fn begin(&mut self) {
        let mut world = self.0.world.lock();
        world.link_begins += 1;
        if world.failing_reconnects > 0 {
            world.failing_reconnects -= 1;
        } else {
            world.link_up = true;
        }
    }

    fn describe(&self) -> String {
        "simulated link".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::hardware::{DistanceSensor, MotorDrive, NO_ECHO_CM};

    fn world_with(obstacles: &[(i32, i32)]) -> SimHandle {
        let config = SimulationConfig {
            obstacles: obstacles
                .iter()
                .map(|&(x, y)| GridPosition::new(x, y))
                .collect(),
            ..Default::default()
        };
        SimHandle::new(&config, Heading::East)
    }

    #[test]
    fn test_adjacent_obstacle_reads_half_cell() {
        let world = world_with(&[(1, 0)]);
        let mut sensor = world.sensor(&MotionConfig::default());
        assert_eq!(sensor.measure(), 15);
    }

    #[test]
    fn test_distant_obstacle_and_clear_path() {
        let world = world_with(&[(3, 0)]);
        let mut sensor = world.sensor(&MotionConfig::default());
        assert_eq!(sensor.measure(), 75);

        let open = world_with(&[]);
        let mut sensor = open.sensor(&MotionConfig::default());
        assert_eq!(sensor.measure(), NO_ECHO_CM);
    }

    #[test]
    fn test_drive_moves_and_turns() {
        let world = world_with(&[]);
        let clock = ManualClock::new();
        let mut drive = world.drive(&MotionConfig::default(), clock.shared());

        drive.forward_one_cell();
        assert_eq!(world.position(), GridPosition::new(1, 0));

        drive.turn_right();
        drive.stop();
        assert_eq!(world.heading(), Heading::South);

        drive.forward_one_cell();
        assert_eq!(world.position(), GridPosition::new(1, 1));
        assert_eq!(clock.now(), Duration::from_millis(1600));
    }

    #[test]
    fn test_driving_into_obstacle_is_collision() {
        let world = world_with(&[(1, 0)]);
        let clock = ManualClock::new();
        let mut drive = world.drive(&MotionConfig::default(), clock.shared());

        drive.forward_one_cell();
        assert_eq!(world.position(), GridPosition::ORIGIN);
        assert_eq!(world.collisions(), 1);
    }

    #[test]
    fn test_link_reconnect_failures() {
        let world = world_with(&[]);
        let mut link = world.link();
        world.set_link_up(false);
        world.fail_reconnects(1);

        link.begin();
        assert!(!link.is_connected());
        link.begin();
        assert!(link.is_connected());
        assert_eq!(world.link_begins(), 2);
    }
}
