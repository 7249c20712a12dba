//! Exploration controller.
//!
//! Owns every piece of mutable agent state. Each `tick()` checks the link
//! and then runs exactly one state handler; handlers block only for bounded
//! actuation, backoff and idle periods, all timed through the [`Clock`].

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::decision::{Directive, decide, next_state};
use super::ControllerState;
use crate::client::CoordinationClient;
use crate::clock::{Clock, SharedClock};
use crate::config::{ControllerConfig, MotionConfig, PathikConfig};
use crate::error::PathikError;
use crate::hardware::{DistanceSensor, MotorDrive};
use crate::link::{ConnectionHealth, LinkStatus, LinkSupervisor};
use crate::navigation::{GridPosition, Heading, HeadingModel, PositionModel, next_heading};

/// What the driving loop should do after a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    /// Discard this controller and start over from a fresh one
    Restart,
}

/// Point-in-time view of the controller for status logs
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub state: &'static str,
    pub position: GridPosition,
    pub heading: Heading,
    pub target: Option<GridPosition>,
    pub ticks: u64,
    pub polls: u64,
    pub cells_moved: u64,
    pub obstructions: u64,
    pub consecutive_failures: u32,
    pub reconnect_attempts: u32,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "state={} pos={} facing={} target=",
            self.state, self.position, self.heading
        )?;
        match self.target {
            Some(target) => write!(f, "{}", target)?,
            None => f.write_str("none")?,
        }
        write!(
            f,
            " ticks={} polls={} moved={} blocked={} failures={}",
            self.ticks, self.polls, self.cells_moved, self.obstructions, self.consecutive_failures
        )
    }
}

#[derive(Clone, Debug, Default)]
struct Counters {
    ticks: u64,
    polls: u64,
    cells_moved: u64,
    obstructions: u64,
}

/// Grid exploration state machine
pub struct ExplorationController {
    motion: MotionConfig,
    timing: ControllerConfig,
    client: CoordinationClient,
    sensor: Box<dyn DistanceSensor>,
    motors: Box<dyn MotorDrive>,
    clock: SharedClock,
    supervisor: LinkSupervisor,
    health: ConnectionHealth,
    heading: HeadingModel,
    position: PositionModel,
    target: Option<GridPosition>,
    state: ControllerState,
    last_poll: Option<Duration>,
    counters: Counters,
    running: Option<Arc<AtomicBool>>,
}

impl ExplorationController {
    /// Controller at the origin, facing the configured initial heading
    pub fn new(
        config: &PathikConfig,
        client: CoordinationClient,
        sensor: Box<dyn DistanceSensor>,
        motors: Box<dyn MotorDrive>,
        clock: SharedClock,
    ) -> Self {
        Self {
            motion: config.motion.clone(),
            timing: config.controller.clone(),
            client,
            sensor,
            motors,
            clock,
            supervisor: LinkSupervisor::new(config.link.clone()),
            health: ConnectionHealth::new(config.link.max_reconnect_attempts),
            heading: HeadingModel::new(config.motion.initial_heading, config.motion.turn_time()),
            position: PositionModel::new(GridPosition::ORIGIN),
            target: None,
            state: ControllerState::CheckingStatus,
            last_poll: None,
            counters: Counters::default(),
            running: None,
        }
    }

    /// Abandon the startup reconnect loop once `running` is cleared
    pub fn set_running_flag(&mut self, running: Arc<AtomicBool>) {
        self.running = Some(running);
    }

    fn stop_requested(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.load(Ordering::SeqCst))
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn position(&self) -> GridPosition {
        self.position.position()
    }

    pub fn heading(&self) -> Heading {
        self.heading.heading()
    }

    pub fn target(&self) -> Option<GridPosition> {
        self.target
    }

    pub fn health(&self) -> &ConnectionHealth {
        &self.health
    }

    pub fn progress(&self) -> Progress {
        Progress {
            state: self.state.name(),
            position: self.position(),
            heading: self.heading(),
            target: self.target,
            ticks: self.counters.ticks,
            polls: self.counters.polls,
            cells_moved: self.counters.cells_moved,
            obstructions: self.counters.obstructions,
            consecutive_failures: self.health.consecutive_failures(),
            reconnect_attempts: self.health.reconnect_attempts(),
        }
    }

    /// Startup handshake.
    ///
    /// Stops the motors, brings the link up, probes the service, reports the
    /// origin and starts exploration. A failed step leaves the controller in
    /// the error state; only a link that cannot be brought up at all asks for
    /// a restart.
    pub fn start(&mut self) -> LoopControl {
        self.motors.stop();
        info!(
            "Starting at {} facing {}",
            self.position(),
            self.heading()
        );

        while !self.client.link_connected() {
            if self.stop_requested() {
                info!("Shutdown requested during startup");
                return LoopControl::Continue;
            }
            match self.check_link() {
                LinkStatus::Up => break,
                LinkStatus::Down => {}
                LinkStatus::RestartRequired => return LoopControl::Restart,
            }
        }

        if !self.client.probe_health() {
            error!("Server not reachable during startup");
            self.set_state(ControllerState::ErrorState);
            return LoopControl::Continue;
        }

        if let Err(e) = self.client.report_position(self.position()) {
            error!("Failed to report initial position: {}", e);
            self.health.record_failure();
            self.set_state(ControllerState::ErrorState);
            return LoopControl::Continue;
        }

        if let Err(e) = self.client.start_exploration() {
            error!("Failed to start exploration: {}", e);
            self.health.record_failure();
            self.set_state(ControllerState::ErrorState);
            return LoopControl::Continue;
        }

        self.health.record_success();
        self.set_state(ControllerState::CheckingStatus);
        LoopControl::Continue
    }

    /// Run one control step
    pub fn tick(&mut self) -> LoopControl {
        self.counters.ticks += 1;

        match self.check_link() {
            LinkStatus::Up => {}
            LinkStatus::Down => return LoopControl::Continue,
            LinkStatus::RestartRequired => return LoopControl::Restart,
        }

        match self.state {
            ControllerState::CheckingStatus | ControllerState::WaitingForImage => {
                self.poll_status()
            }
            ControllerState::MovingToTarget => self.step_toward_target(),
            ControllerState::ExplorationComplete => self.idle_complete(),
            ControllerState::ErrorState => self.recover(),
        }

        LoopControl::Continue
    }

    /// Release the motors before the controller is dropped
    pub fn shutdown(&mut self) {
        self.motors.stop();
        info!("Controller stopped at {}", self.position());
    }

    fn check_link(&mut self) -> LinkStatus {
        let status = self.supervisor.ensure(
            self.client.link_mut(),
            &mut self.health,
            self.clock.as_ref(),
        );
        if status == LinkStatus::RestartRequired {
            error!(
                "Link not recovered after {} reconnects, restarting",
                self.health.reconnect_attempts()
            );
        }
        status
    }

    fn set_state(&mut self, next: ControllerState) {
        if next != self.state {
            info!("State: {} -> {}", self.state, next);
            self.state = next;
        }
    }

    fn poll_status(&mut self) {
        let now = self.clock.now();
        if let Some(last) = self.last_poll
            && now.saturating_sub(last) < self.timing.status_interval()
        {
            return;
        }
        self.last_poll = Some(now);
        self.counters.polls += 1;

        let status = match self.client.fetch_status() {
            Ok(status) => status,
            Err(e) if e.is_decode() => {
                warn!("Failed to parse status response: {}", e);
                return;
            }
            Err(PathikError::LinkDown) => {
                warn!("Status poll skipped: link down");
                return;
            }
            Err(e) => {
                self.health.record_failure();
                warn!("Failed to get robot status: {}", e);
                return;
            }
        };
        self.health.record_success();

        let directive = decide(&status);
        match directive {
            Directive::Stopped => info!("Exploration not running on server"),
            Directive::AwaitImage => {
                if self.state != ControllerState::WaitingForImage {
                    info!("Waiting for image capture...");
                }
            }
            Directive::MoveTo(target) => {
                info!(
                    "New target: {} (at {}, {} cell(s) away)",
                    target,
                    self.position(),
                    self.position().manhattan_distance(target)
                );
                self.target = Some(target);
            }
            Directive::Explored => info!("Server reports exploration complete"),
            Directive::Hold => debug!("No directive this cycle"),
        }
        self.set_state(next_state(directive));
    }

    fn step_toward_target(&mut self) {
        let Some(target) = self.target else {
            warn!("No target set, returning to status checks");
            self.set_state(ControllerState::CheckingStatus);
            return;
        };

        if let Some(desired) = next_heading(self.position(), target) {
            let turns = self
                .heading
                .turn_toward(desired, self.motors.as_mut(), self.clock.as_ref());
            if turns > 0 {
                debug!("Turned {} quarter(s) to face {}", turns, desired);
            }

            let distance = self.sensor.measure();
            debug!("Distance ahead: {} cm", distance);
            if distance <= self.motion.obstacle_distance_cm {
                warn!(
                    "Obstacle at {} cm facing {}, staying at {}",
                    distance,
                    desired,
                    self.position()
                );
                self.counters.obstructions += 1;
                self.set_state(ControllerState::CheckingStatus);
                return;
            }

            self.motors.forward_one_cell();
            let now_at = self.position.advance(desired);
            self.counters.cells_moved += 1;
            info!("Moved to {}", now_at);
        }

        if self.position() == target {
            match self.client.report_position(target) {
                Ok(_) => {
                    self.health.record_success();
                    info!("Reached target {}", target);
                    self.set_state(ControllerState::CheckingStatus);
                }
                Err(e) => {
                    self.health.record_failure();
                    error!("Failed to report position {}: {}", target, e);
                    self.set_state(ControllerState::ErrorState);
                }
            }
        }
    }

    fn idle_complete(&mut self) {
        info!("Exploration complete. Final position: {}", self.position());
        self.clock.sleep(self.timing.complete_idle());
    }

    fn recover(&mut self) {
        self.clock.sleep(self.timing.error_idle());
        if self.client.probe_health() {
            info!("Server reachable again, resuming");
            self.health.record_success();
            self.set_state(ControllerState::CheckingStatus);
        } else {
            warn!("Still in error state");
        }
    }
}

impl fmt::Debug for ExplorationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplorationController")
            .field("progress", &self.progress())
            .finish()
    }
}
