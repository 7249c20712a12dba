//! Pathik: grid exploration agent.
//!
//! Executes single-cell moves handed out by a remote coordination service,
//! checking for obstacles before every step and reporting each reached cell.
//!
//! ## Layers
//!
//! - [`hardware`]: distance sensor and drive seams, simulated world, mocks
//! - [`navigation`]: heading, grid position, Manhattan step routing
//! - [`link`]: network link supervision and connection health
//! - [`client`]: coordination service requests with retry and backoff
//! - [`controller`]: the tick-driven exploration state machine
//! - [`runtime`]: control loop with restart and shutdown handling

pub mod client;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod hardware;
pub mod link;
pub mod navigation;
pub mod runtime;
pub mod signal;

pub use client::{CoordinationClient, HttpTransport, RequestOutcome, RetryBudget, RobotStatus};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::PathikConfig;
pub use controller::{ControllerState, ExplorationController, LoopControl, Progress};
pub use error::{PathikError, Result};
pub use navigation::{GridPosition, Heading};
pub use runtime::{RunSummary, Runtime, StopReason};
