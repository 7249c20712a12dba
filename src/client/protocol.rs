//! Wire types of the coordination API.

use serde::{Deserialize, Deserializer};

use crate::navigation::GridPosition;

pub const HEALTH_ENDPOINT: &str = "/health";
pub const STATUS_ENDPOINT: &str = "/robot/status";
pub const POSITION_ENDPOINT: &str = "/robot/position";
pub const START_ENDPOINT: &str = "/robot/start";
pub const IMAGE_ENDPOINT: &str = "/robot/image";

/// Body of `GET /robot/status`.
///
/// Missing or null flags read as `false`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RobotStatus {
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_running: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub needs_image: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub waiting_for_image: bool,
    #[serde(default)]
    pub next_move: Option<GridPosition>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub exploration_complete: bool,
    /// Consumed by the camera node
    #[serde(default)]
    pub current_position: Option<GridPosition>,
}

impl RobotStatus {
    pub fn parse(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}

/// Body of a `POST /robot/image` reply
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ImageVerdict {
    #[serde(default, deserialize_with = "null_as_false")]
    pub human_detected: bool,
}

fn null_as_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_status() {
        let body = r#"{
            "current_position": {"x": 1, "y": 0},
            "is_running": true,
            "needs_image": false,
            "waiting_for_image": false,
            "next_move": {"x": 2, "y": 0}
        }"#;
        let status = RobotStatus::parse(body).unwrap();
        assert!(status.is_running);
        assert_eq!(status.next_move, Some(GridPosition::new(2, 0)));
        assert_eq!(status.current_position, Some(GridPosition::new(1, 0)));
        assert!(!status.exploration_complete);
    }

    #[test]
    fn test_null_next_move_and_flags() {
        let body = r#"{"is_running": true, "next_move": null, "needs_image": null,
                       "exploration_complete": true}"#;
        let status = RobotStatus::parse(body).unwrap();
        assert_eq!(status.next_move, None);
        assert!(!status.needs_image);
        assert!(status.exploration_complete);
    }

    #[test]
    fn test_empty_object_is_stopped() {
        let status = RobotStatus::parse("{}").unwrap();
        assert_eq!(status, RobotStatus::default());
        assert!(!status.is_running);
    }

    #[test]
    fn test_malformed_bodies_fail() {
        assert!(RobotStatus::parse("<html>502</html>").is_err());
        assert!(RobotStatus::parse(r#"{"is_running": "yes"}"#).is_err());
        assert!(RobotStatus::parse(r#"{"next_move": {"x": 1}}"#).is_err());
    }

    #[test]
    fn test_image_verdict() {
        let verdict: ImageVerdict =
            serde_json::from_str(r#"{"human_detected": true, "confidence": 0.91}"#).unwrap();
        assert!(verdict.human_detected);
    }
}
