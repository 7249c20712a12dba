//! Control loop driver.
//!
//! Calls `tick()` once per tick period. When a tick asks for a restart, the
//! controller is dropped and a fresh one is built from the factory, so every
//! piece of in-memory state starts over. The running flag is checked before
//! every tick and every restart, and each controller gets a copy so a
//! startup reconnect loop gives up on shutdown too.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use crate::clock::SharedClock;
use crate::config::ControllerConfig;
use crate::controller::{ExplorationController, LoopControl, Progress};
use crate::error::{PathikError, Result};

/// Why [`Runtime::run`] returned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Running flag cleared (Ctrl-C)
    Shutdown,
    /// Tick limit reached
    TickLimit,
}

/// Totals across every controller built during a run
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub reason: StopReason,
    pub ticks: u64,
    pub restarts: u32,
    /// Progress of the controller alive at the end
    pub progress: Progress,
}

/// Drives a controller built by `F`, rebuilding it on restart
pub struct Runtime<F>
where
    F: FnMut() -> Result<ExplorationController>,
{
    factory: F,
    clock: SharedClock,
    tick: Duration,
    progress_interval: Option<Duration>,
    running: Arc<AtomicBool>,
    max_restarts: Option<u32>,
    max_ticks: Option<u64>,
}

impl<F> Runtime<F>
where
    F: FnMut() -> Result<ExplorationController>,
{
    pub fn new(
        factory: F,
        clock: SharedClock,
        config: &ControllerConfig,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            factory,
            clock,
            tick: config.tick(),
            progress_interval: config.progress_log_interval(),
            running,
            max_restarts: None,
            max_ticks: None,
        }
    }

    /// Fail with [`PathikError::RestartLimit`] instead of restarting past `max`
    pub fn with_max_restarts(mut self, max: Option<u32>) -> Self {
        self.max_restarts = max;
        self
    }

    /// Return after `max` ticks
    pub fn with_max_ticks(mut self, max: Option<u64>) -> Self {
        self.max_ticks = max;
        self
    }

    fn build(&mut self) -> Result<ExplorationController> {
        let mut controller = (self.factory)()?;
        controller.set_running_flag(self.running.clone());
        Ok(controller)
    }

    /// Run until shutdown, the tick limit, or the restart limit
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut controller = self.build()?;
        let mut control = controller.start();
        let mut ticks: u64 = 0;
        let mut restarts: u32 = 0;
        let mut last_progress = self.clock.now();

        let reason = loop {
            if !self.running.load(Ordering::SeqCst) {
                info!("Shutdown requested");
                break StopReason::Shutdown;
            }

            if control == LoopControl::Restart {
                controller.shutdown();
                if let Some(max) = self.max_restarts
                    && restarts >= max
                {
                    return Err(PathikError::RestartLimit(restarts));
                }
                restarts += 1;
                warn!("Restarting agent (restart {})", restarts);
                controller = self.build()?;
                control = controller.start();
                continue;
            }

            if let Some(max) = self.max_ticks
                && ticks >= max
            {
                break StopReason::TickLimit;
            }

            control = controller.tick();
            ticks += 1;

            if let Some(interval) = self.progress_interval {
                let now = self.clock.now();
                if now.saturating_sub(last_progress) >= interval {
                    info!("Progress: {}", controller.progress());
                    last_progress = now;
                }
            }

            self.clock.sleep(self.tick);
        };

        controller.shutdown();
        Ok(RunSummary {
            reason,
            ticks,
            restarts,
            progress: controller.progress(),
        })
    }
}
