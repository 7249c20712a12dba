//! Network link supervision and connection health.
//!
//! The link is checked at the top of every tick. A lost link blocks the loop
//! while reconnecting; after too many failed reconnects the agent asks for a
//! full restart instead of trying to recover in place.

use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::LinkConfig;

/// Wireless link between the agent and the coordination service.
pub trait Link: Send {
    /// Whether the link is currently associated and usable
    fn is_connected(&self) -> bool;

    /// Start (re)association. Completion is observed via `is_connected`.
    fn begin(&mut self);

    /// Human-readable description for logs
    fn describe(&self) -> String {
        "network link".to_string()
    }
}

/// Link managed by the host operating system; always reported up.
///
/// Request failures still surface through the client's retry path.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostLink;

impl Link for HostLink {
    fn is_connected(&self) -> bool {
        true
    }

    fn begin(&mut self) {}

    fn describe(&self) -> String {
        "host network".to_string()
    }
}

/// Process-wide connection counters, reset on success.
#[derive(Clone, Debug)]
pub struct ConnectionHealth {
    consecutive_failures: u32,
    reconnect_attempts: u32,
    max_reconnect_attempts: u32,
}

impl ConnectionHealth {
    pub fn new(max_reconnect_attempts: u32) -> Self {
        Self {
            consecutive_failures: 0,
            reconnect_attempts: 0,
            max_reconnect_attempts,
        }
    }

    /// A service request succeeded
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// A service request failed after exhausting its retries
    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }

    /// The link came back
    pub fn record_reconnect(&mut self) {
        self.reconnect_attempts = 0;
    }

    /// A reconnect attempt failed
    pub fn record_reconnect_failure(&mut self) {
        self.reconnect_attempts += 1;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// Reconnect ceiling reached; only a restart recovers from here
    pub fn restart_required(&self) -> bool {
        self.reconnect_attempts >= self.max_reconnect_attempts
    }
}

/// Result of the per-tick link check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    /// Link usable; run the state handler
    Up,
    /// Reconnect failed; skip this tick
    Down,
    /// Reconnect ceiling reached; restart the agent
    RestartRequired,
}

/// Reconnect procedure with bounded polling
#[derive(Clone, Debug)]
pub struct LinkSupervisor {
    config: LinkConfig,
}

impl LinkSupervisor {
    pub fn new(config: LinkConfig) -> Self {
        Self { config }
    }

    /// Check the link, reconnecting if it dropped.
    ///
    /// Blocks for the whole reconnect procedure, plus the retry delay when
    /// it fails without reaching the restart ceiling.
    pub fn ensure(
        &self,
        link: &mut dyn Link,
        health: &mut ConnectionHealth,
        clock: &dyn Clock,
    ) -> LinkStatus {
        if link.is_connected() {
            return LinkStatus::Up;
        }

        warn!("{} disconnected, attempting reconnection...", link.describe());
        if self.connect(link, health, clock) {
            LinkStatus::Up
        } else if health.restart_required() {
            LinkStatus::RestartRequired
        } else {
            clock.sleep(self.config.reconnect_delay());
            LinkStatus::Down
        }
    }

    /// One reconnect attempt: begin, then poll until associated or the poll
    /// budget runs out.
    pub fn connect(
        &self,
        link: &mut dyn Link,
        health: &mut ConnectionHealth,
        clock: &dyn Clock,
    ) -> bool {
        link.begin();

        let mut polls = 0;
        while !link.is_connected() && polls < self.config.connect_poll_attempts {
            clock.sleep(self.config.connect_poll_interval());
            polls += 1;
        }

        if link.is_connected() {
            info!("{} connected", link.describe());
            health.record_reconnect();
            true
        } else {
            health.record_reconnect_failure();
            warn!(
                "{} connection failed ({}/{})",
                link.describe(),
                health.reconnect_attempts(),
                self.config.max_reconnect_attempts
            );
            false
        }
    }
}
