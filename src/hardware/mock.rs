//! Mock sensor and drive for testing

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use super::{DistanceSensor, MotorDrive, NO_ECHO_CM};

/// Drive command recorded by [`MockMotors`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotorCommand {
    Forward,
    TurnRight,
    Stop,
}

/// Mock drive that records every command.
///
/// Clones share the same log.
#[derive(Clone, Default)]
pub struct MockMotors {
    log: Arc<Mutex<Vec<MotorCommand>>>,
}

impl MockMotors {
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands issued so far
    pub fn commands(&self) -> Vec<MotorCommand> {
        self.log.lock().clone()
    }

    /// Number of times `command` was issued
    pub fn count(&self, command: MotorCommand) -> usize {
        self.log.lock().iter().filter(|c| **c == command).count()
    }
}

impl MotorDrive for MockMotors {
    fn forward_one_cell(&mut self) {
        let mut log = self.log.lock();
        log.push(MotorCommand::Forward);
        // Forward always ends stopped
        log.push(MotorCommand::Stop);
    }

    fn turn_right(&mut self) {
        self.log.lock().push(MotorCommand::TurnRight);
    }

    fn stop(&mut self) {
        self.log.lock().push(MotorCommand::Stop);
    }
}

/// Mock distance sensor with queued readings.
///
/// Returns queued readings in order, then the fallback reading.
#[derive(Clone)]
pub struct MockSensor {
    inner: Arc<Mutex<MockSensorInner>>,
}

struct MockSensorInner {
    readings: VecDeque<u32>,
    fallback: u32,
    measurements: usize,
}

impl MockSensor {
    /// Sensor that sees nothing ahead unless told otherwise
    pub fn new() -> Self {
        Self::with_fallback(NO_ECHO_CM)
    }

    pub fn with_fallback(fallback: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockSensorInner {
                readings: VecDeque::new(),
                fallback,
                measurements: 0,
            })),
        }
    }

    /// Queue a reading for the next measurement
    pub fn push_reading(&self, cm: u32) {
        self.inner.lock().readings.push_back(cm);
    }

    pub fn set_fallback(&self, cm: u32) {
        self.inner.lock().fallback = cm;
    }

    /// Number of measurements taken
    pub fn measurements(&self) -> usize {
        self.inner.lock().measurements
    }
}

impl Default for MockSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl DistanceSensor for MockSensor {
    fn measure(&mut self) -> u32 {
        let mut inner = self.inner.lock();
        inner.measurements += 1;
        let fallback = inner.fallback;
        inner.readings.pop_front().unwrap_or(fallback)
    }
}
