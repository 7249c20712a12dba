//! Configuration loading for Pathik

use crate::error::{PathikError, Result};
use crate::navigation::{GridPosition, Heading};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PathikConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Coordination service connection settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConnectionConfig {
    /// Base URL of the coordination service
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Per-attempt timeout for service requests in milliseconds (default: 10000)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Timeout for the liveness probe in milliseconds (default: 5000)
    #[serde(default = "default_health_timeout")]
    pub health_timeout_ms: u64,

    /// Timeout for image uploads in milliseconds (default: 15000)
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_ms: u64,

    /// Attempts per request, first try included (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff unit; attempt `n` waits `n * base` before the next try (default: 1000)
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
}

/// Network link supervision
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LinkConfig {
    /// Connection polls per reconnect attempt (default: 20)
    #[serde(default = "default_connect_poll_attempts")]
    pub connect_poll_attempts: u32,

    /// Interval between connection polls in milliseconds (default: 500)
    #[serde(default = "default_connect_poll_interval")]
    pub connect_poll_interval_ms: u64,

    /// Failed reconnects before the agent restarts (default: 5)
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Pause after a failed reconnect in milliseconds (default: 5000)
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

/// Drive and sensor parameters
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MotionConfig {
    /// Drive time to cross one grid cell in milliseconds (default: 800)
    #[serde(default = "default_move_time")]
    pub move_time_ms: u64,

    /// Drive time for a 90 degree turn in milliseconds (default: 600)
    #[serde(default = "default_turn_time")]
    pub turn_time_ms: u64,

    /// Readings at or below this distance block a move (default: 15)
    #[serde(default = "default_obstacle_distance")]
    pub obstacle_distance_cm: u32,

    /// Echo wait limit in milliseconds (default: 30)
    #[serde(default = "default_echo_timeout")]
    pub echo_timeout_ms: u64,

    /// Heading at power-on (default: east)
    #[serde(default = "default_initial_heading")]
    pub initial_heading: Heading,
}

/// State machine timing
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ControllerConfig {
    /// Control loop tick in milliseconds (default: 100)
    #[serde(default = "default_tick")]
    pub tick_ms: u64,

    /// Minimum spacing between status polls in milliseconds (default: 3000)
    #[serde(default = "default_status_interval")]
    pub status_interval_ms: u64,

    /// Idle time per tick once exploration is complete (default: 5000)
    #[serde(default = "default_complete_idle")]
    pub complete_idle_ms: u64,

    /// Idle time before each recovery probe in the error state (default: 10000)
    #[serde(default = "default_error_idle")]
    pub error_idle_ms: u64,

    /// Interval between progress log lines in milliseconds; 0 disables (default: 30000)
    #[serde(default = "default_progress_log")]
    pub progress_log_ms: u64,
}

/// Simulated grid world used when no drive hardware is attached
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Blocked cells
    #[serde(default)]
    pub obstacles: Vec<GridPosition>,

    /// Edge length of one grid cell in centimeters (default: 30)
    #[serde(default = "default_cell_size")]
    pub cell_size_cm: u32,

    /// Cells the simulated transducer can see ahead (default: 8)
    #[serde(default = "default_sensor_range")]
    pub sensor_range_cells: u32,
}

/// Logging configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_server_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_request_timeout() -> u64 {
    10_000
}
fn default_health_timeout() -> u64 {
    5_000
}
fn default_upload_timeout() -> u64 {
    15_000
}
fn default_max_attempts() -> u32 {
    3
}
fn default_retry_base_delay() -> u64 {
    1_000
}
fn default_connect_poll_attempts() -> u32 {
    20
}
fn default_connect_poll_interval() -> u64 {
    500
}
fn default_max_reconnect_attempts() -> u32 {
    5
}
fn default_reconnect_delay() -> u64 {
    5_000
}
fn default_move_time() -> u64 {
    800
}
fn default_turn_time() -> u64 {
    600
}
fn default_obstacle_distance() -> u32 {
    15
}
fn default_echo_timeout() -> u64 {
    30
}
fn default_initial_heading() -> Heading {
    Heading::East
}
fn default_tick() -> u64 {
    100
}
fn default_status_interval() -> u64 {
    3_000
}
fn default_complete_idle() -> u64 {
    5_000
}
fn default_error_idle() -> u64 {
    10_000
}
fn default_progress_log() -> u64 {
    30_000
}
fn default_cell_size() -> u32 {
    30
}
fn default_sensor_range() -> u32 {
    8
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            request_timeout_ms: default_request_timeout(),
            health_timeout_ms: default_health_timeout(),
            upload_timeout_ms: default_upload_timeout(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            connect_poll_attempts: default_connect_poll_attempts(),
            connect_poll_interval_ms: default_connect_poll_interval(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            move_time_ms: default_move_time(),
            turn_time_ms: default_turn_time(),
            obstacle_distance_cm: default_obstacle_distance(),
            echo_timeout_ms: default_echo_timeout(),
            initial_heading: default_initial_heading(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick(),
            status_interval_ms: default_status_interval(),
            complete_idle_ms: default_complete_idle(),
            error_idle_ms: default_error_idle(),
            progress_log_ms: default_progress_log(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            obstacles: Vec::new(),
            cell_size_cm: default_cell_size(),
            sensor_range_cells: default_sensor_range(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ConnectionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl LinkConfig {
    pub fn connect_poll_interval(&self) -> Duration {
        Duration::from_millis(self.connect_poll_interval_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl MotionConfig {
    pub fn move_time(&self) -> Duration {
        Duration::from_millis(self.move_time_ms)
    }

    pub fn turn_time(&self) -> Duration {
        Duration::from_millis(self.turn_time_ms)
    }

    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.echo_timeout_ms)
    }
}

impl ControllerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn complete_idle(&self) -> Duration {
        Duration::from_millis(self.complete_idle_ms)
    }

    pub fn error_idle(&self) -> Duration {
        Duration::from_millis(self.error_idle_ms)
    }

    /// `None` when progress logging is disabled
    pub fn progress_log_interval(&self) -> Option<Duration> {
        (self.progress_log_ms > 0).then(|| Duration::from_millis(self.progress_log_ms))
    }
}

impl PathikConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PathikError::Config(format!("Failed to read config file: {}", e)))?;
        let config: PathikConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the control loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.connection.server_url.trim().is_empty() {
            return Err(PathikError::Config("connection.server_url is empty".into()));
        }
        if self.connection.max_attempts == 0 {
            return Err(PathikError::Config(
                "connection.max_attempts must be at least 1".into(),
            ));
        }
        if self.controller.tick_ms == 0 {
            return Err(PathikError::Config("controller.tick_ms must be non-zero".into()));
        }
        if self.link.connect_poll_attempts == 0 {
            return Err(PathikError::Config(
                "link.connect_poll_attempts must be at least 1".into(),
            ));
        }
        if self.simulation.cell_size_cm == 0 {
            return Err(PathikError::Config(
                "simulation.cell_size_cm must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PathikConfig::default();
        assert_eq!(config.connection.max_attempts, 3);
        assert_eq!(config.connection.retry_base_delay_ms, 1000);
        assert_eq!(config.link.max_reconnect_attempts, 5);
        assert_eq!(config.motion.obstacle_distance_cm, 15);
        assert_eq!(config.motion.initial_heading, Heading::East);
        assert_eq!(config.controller.tick(), Duration::from_millis(100));
        assert_eq!(config.controller.status_interval(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_content = r#"
[connection]
server_url = "http://10.0.0.5:8000"

[motion]
initial_heading = "north"

[simulation]
obstacles = [{ x = 1, y = 0 }, { x = 2, y = -1 }]
"#;

        let config: PathikConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.connection.server_url, "http://10.0.0.5:8000");
        assert_eq!(config.connection.request_timeout_ms, 10_000);
        assert_eq!(config.motion.initial_heading, Heading::North);
        assert_eq!(config.motion.turn_time_ms, 600);
        assert_eq!(config.simulation.obstacles.len(), 2);
        assert_eq!(config.simulation.obstacles[1], GridPosition::new(2, -1));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validation_rejects_zero_attempts() {
        let mut config = PathikConfig::default();
        config.connection.max_attempts = 0;
        assert!(matches!(config.validate(), Err(PathikError::Config(_))));

        let mut config = PathikConfig::default();
        config.controller.tick_ms = 0;
        assert!(config.validate().is_err());

        let mut config = PathikConfig::default();
        config.connection.server_url = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[controller]\nstatus_interval_ms = 1500").unwrap();

        let config = PathikConfig::load(file.path()).unwrap();
        assert_eq!(config.controller.status_interval_ms, 1500);
        assert_eq!(config.controller.tick_ms, 100);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[connection]\nmax_attempts = 0").unwrap();
        assert!(PathikConfig::load(file.path()).is_err());

        let missing = Path::new("/nonexistent/pathik.toml");
        assert!(matches!(
            PathikConfig::load(missing),
            Err(PathikError::Config(_))
        ));
    }

    #[test]
    fn test_shipped_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("pathik.toml");
        let config = PathikConfig::load(&path).unwrap();
        assert_eq!(config.connection.max_attempts, 3);
        assert_eq!(config.simulation.obstacles.len(), 3);
        assert_eq!(
            config.controller.progress_log_interval(),
            Some(Duration::from_secs(30))
        );
    }
}
