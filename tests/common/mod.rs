//! Shared harness for integration tests: simulated world, scripted service
//! and a virtual clock wired into a real controller.

#![allow(dead_code)]

use pathik::client::CoordinationClient;
use pathik::client::mock::MockTransport;
use pathik::clock::ManualClock;
use pathik::config::PathikConfig;
use pathik::hardware::sim::SimHandle;
use pathik::navigation::GridPosition;
use pathik::ExplorationController;

pub const HEALTH: &str = "/health";
pub const STATUS: &str = "/robot/status";
pub const POSITION: &str = "/robot/position";
pub const START: &str = "/robot/start";

pub struct Harness {
    pub config: PathikConfig,
    pub world: SimHandle,
    pub transport: MockTransport,
    pub clock: ManualClock,
}

impl Harness {
    /// World with the given blocked cells and a healthy service that has no
    /// directive to hand out
    pub fn new(obstacles: &[(i32, i32)]) -> Self {
        let mut config = PathikConfig::default();
        config.simulation.obstacles = obstacles
            .iter()
            .map(|&(x, y)| GridPosition::new(x, y))
            .collect();
        Self::with_config(config)
    }

    pub fn with_config(config: PathikConfig) -> Self {
        let world = SimHandle::new(&config.simulation, config.motion.initial_heading);
        let transport = MockTransport::new();
        transport.set_default(HEALTH, 200, "ok");
        transport.set_default(POSITION, 200, r#"{"status": "ok"}"#);
        transport.set_default(START, 200, r#"{"status": "started"}"#);
        transport.set_default(STATUS, 200, &hold());
        Self {
            config,
            world,
            transport,
            clock: ManualClock::new(),
        }
    }

    /// Controller driving the simulated world through the real sensor,
    /// drive and link implementations
    pub fn controller(&self) -> ExplorationController {
        let client = CoordinationClient::new(
            Box::new(self.transport.clone()),
            Box::new(self.world.link()),
            self.clock.shared(),
            self.config.connection.clone(),
        );
        ExplorationController::new(
            &self.config,
            client,
            Box::new(self.world.sensor(&self.config.motion)),
            Box::new(self.world.drive(&self.config.motion, self.clock.shared())),
            self.clock.shared(),
        )
    }

    /// Controller that has completed the startup handshake
    pub fn started(&self) -> ExplorationController {
        let mut controller = self.controller();
        controller.start();
        controller
    }

    /// Position payloads reported so far, decoded
    pub fn reported_positions(&self) -> Vec<GridPosition> {
        self.transport
            .requests()
            .into_iter()
            .filter(|r| r.endpoint == POSITION)
            .filter_map(|r| match r.payload {
                pathik::client::Payload::Json(json) => serde_json::from_str(&json).ok(),
                _ => None,
            })
            .collect()
    }
}

/// Running, nothing to do
pub fn hold() -> String {
    r#"{"is_running": true, "needs_image": false, "waiting_for_image": false, "next_move": null}"#
        .to_string()
}

/// Running with a next move
pub fn move_to(x: i32, y: i32) -> String {
    format!(
        r#"{{"current_position": {{"x": 0, "y": 0}}, "is_running": true,
            "needs_image": false, "waiting_for_image": false,
            "next_move": {{"x": {}, "y": {}}}}}"#,
        x, y
    )
}

/// Running, grid fully explored
pub fn explored() -> String {
    r#"{"is_running": true, "next_move": null, "exploration_complete": true}"#.to_string()
}
