//! Coordination service client.
//!
//! Wraps a [`Transport`] with the retry policy: every request gets a fresh
//! [`RetryBudget`] of a few attempts with linearly growing backoff. Only an
//! HTTP 200 counts as success. A down link short-circuits before any attempt
//! is spent and is reported separately from an exhausted budget.

pub mod mock;
pub mod protocol;
mod transport;

pub use protocol::{ImageVerdict, RobotStatus};
pub use transport::{HttpTransport, Method, Payload, Reply, Transport};

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::SharedClock;
use crate::config::ConnectionConfig;
use crate::error::{PathikError, Result};
use crate::link::Link;
use crate::navigation::GridPosition;
use protocol::{HEALTH_ENDPOINT, IMAGE_ENDPOINT, POSITION_ENDPOINT, START_ENDPOINT, STATUS_ENDPOINT};

/// Attempt counter for a single request
#[derive(Clone, Debug)]
pub struct RetryBudget {
    max_attempts: u32,
    used: u32,
    base_delay: Duration,
}

impl RetryBudget {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            used: 0,
            base_delay,
        }
    }

    /// Claim the next attempt; false once the budget is spent
    pub fn try_begin(&mut self) -> bool {
        if self.used < self.max_attempts {
            self.used += 1;
            true
        } else {
            false
        }
    }

    /// Attempts claimed so far
    pub fn attempts(&self) -> u32 {
        self.used
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the current failed attempt, `None` if it was the last
    pub fn backoff(&self) -> Option<Duration> {
        (self.used < self.max_attempts).then(|| self.base_delay * self.used)
    }
}

/// Result of [`CoordinationClient::request`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// HTTP 200 on attempt `attempts`
    Success { body: String, attempts: u32 },
    /// Every attempt failed
    Failed { attempts: u32 },
    /// Link was down; no attempt was made
    LinkDown,
}

impl RequestOutcome {
    /// Attempts spent on the request
    pub fn attempts(&self) -> u32 {
        match self {
            RequestOutcome::Success { attempts, .. } | RequestOutcome::Failed { attempts } => {
                *attempts
            }
            RequestOutcome::LinkDown => 0,
        }
    }

    /// Body on success, otherwise the matching error
    pub fn into_body(self, endpoint: &str) -> Result<String> {
        match self {
            RequestOutcome::Success { body, .. } => Ok(body),
            RequestOutcome::Failed { attempts } => Err(PathikError::RequestFailed {
                endpoint: endpoint.to_string(),
                attempts,
            }),
            RequestOutcome::LinkDown => Err(PathikError::LinkDown),
        }
    }
}

/// Client for the coordination service
pub struct CoordinationClient {
    transport: Box<dyn Transport>,
    link: Box<dyn Link>,
    clock: SharedClock,
    config: ConnectionConfig,
}

impl CoordinationClient {
    pub fn new(
        transport: Box<dyn Transport>,
        link: Box<dyn Link>,
        clock: SharedClock,
        config: ConnectionConfig,
    ) -> Self {
        Self {
            transport,
            link,
            clock,
            config,
        }
    }

    pub fn link_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Link for the reconnect procedure
    pub fn link_mut(&mut self) -> &mut dyn Link {
        self.link.as_mut()
    }

    /// Single liveness probe; true only on HTTP 200
    pub fn probe_health(&mut self) -> bool {
        if !self.link.is_connected() {
            warn!("Health probe skipped: link down");
            return false;
        }

        debug!("Testing server connectivity...");
        match self.transport.send(
            Method::Get,
            HEALTH_ENDPOINT,
            &Payload::Empty,
            self.config.health_timeout(),
        ) {
            Ok(reply) if reply.is_ok() => {
                info!("Server is reachable");
                true
            }
            Ok(reply) => {
                warn!("Server unreachable. HTTP code: {}", reply.status);
                false
            }
            Err(e) => {
                warn!("Server unreachable: {}", e);
                false
            }
        }
    }

    /// Request with the configured retry budget and timeout
    pub fn request(&mut self, endpoint: &str, method: Method, payload: &Payload) -> RequestOutcome {
        let budget = RetryBudget::new(self.config.max_attempts, self.config.retry_base_delay());
        let timeout = self.config.request_timeout();
        self.request_with(endpoint, method, payload, budget, timeout)
    }

    fn request_with(
        &mut self,
        endpoint: &str,
        method: Method,
        payload: &Payload,
        mut budget: RetryBudget,
        timeout: Duration,
    ) -> RequestOutcome {
        if !self.link.is_connected() {
            warn!("{} {} skipped: link down", method, endpoint);
            return RequestOutcome::LinkDown;
        }

        while budget.try_begin() {
            match self.transport.send(method, endpoint, payload, timeout) {
                Ok(reply) if reply.is_ok() => {
                    return RequestOutcome::Success {
                        body: reply.body,
                        attempts: budget.attempts(),
                    };
                }
                Ok(reply) => warn!(
                    "{} {} failed with code: {}",
                    method,
                    endpoint,
                    PathikError::Status(reply.status)
                ),
                Err(e) => warn!("{} {} failed: {}", method, endpoint, e),
            }

            if let Some(delay) = budget.backoff() {
                warn!(
                    "Retrying request (attempt {}/{}) in {:?}",
                    budget.attempts() + 1,
                    budget.max_attempts(),
                    delay
                );
                self.clock.sleep(delay);
            }
        }

        RequestOutcome::Failed {
            attempts: budget.attempts(),
        }
    }

    /// `GET /robot/status`, decoded
    pub fn fetch_status(&mut self) -> Result<RobotStatus> {
        let body = self
            .request(STATUS_ENDPOINT, Method::Get, &Payload::Empty)
            .into_body(STATUS_ENDPOINT)?;
        debug!("Status response: {}", body);
        Ok(RobotStatus::parse(&body)?)
    }

    /// `POST /robot/position`; returns the acknowledgement body
    pub fn report_position(&mut self, position: GridPosition) -> Result<String> {
        let payload = Payload::Json(serde_json::to_string(&position)?);
        let ack = self
            .request(POSITION_ENDPOINT, Method::Post, &payload)
            .into_body(POSITION_ENDPOINT)?;
        info!("Position update {} - Response: {}", position, ack);
        Ok(ack)
    }

    /// `POST /robot/start`; returns the acknowledgement body
    pub fn start_exploration(&mut self) -> Result<String> {
        let ack = self
            .request(START_ENDPOINT, Method::Post, &Payload::Empty)
            .into_body(START_ENDPOINT)?;
        info!("Started exploration - Response: {}", ack);
        Ok(ack)
    }

    /// `POST /robot/image` with a JPEG frame.
    ///
    /// One attempt only: an upload is not idempotent on the service side.
    pub fn upload_image(&mut self, jpeg: Vec<u8>) -> Result<ImageVerdict> {
        let size = jpeg.len();
        let budget = RetryBudget::new(1, self.config.retry_base_delay());
        let timeout = self.config.upload_timeout();
        let body = self
            .request_with(IMAGE_ENDPOINT, Method::Post, &Payload::Jpeg(jpeg), budget, timeout)
            .into_body(IMAGE_ENDPOINT)?;
        let verdict: ImageVerdict = serde_json::from_str(&body)?;
        info!(
            "Image uploaded ({} bytes). Human detection result: {}",
            size,
            if verdict.human_detected {
                "DETECTED"
            } else {
                "NOT DETECTED"
            }
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::hardware::sim::SimHandle;
    use crate::link::HostLink;
    use mock::MockTransport;

    fn client_with(transport: &MockTransport, clock: &ManualClock) -> CoordinationClient {
        CoordinationClient::new(
            Box::new(transport.clone()),
            Box::new(HostLink),
            clock.shared(),
            ConnectionConfig::default(),
        )
    }

    #[test]
    fn test_retry_budget_backoff_is_linear() {
        let mut budget = RetryBudget::new(3, Duration::from_millis(1000));
        assert!(budget.try_begin());
        assert_eq!(budget.backoff(), Some(Duration::from_millis(1000)));
        assert!(budget.try_begin());
        assert_eq!(budget.backoff(), Some(Duration::from_millis(2000)));
        assert!(budget.try_begin());
        assert_eq!(budget.backoff(), None);
        assert!(!budget.try_begin());
        assert_eq!(budget.attempts(), 3);
    }

    #[test]
    fn test_success_on_third_attempt() {
        let transport = MockTransport::new();
        let clock = ManualClock::new();
        transport.push_error("/robot/status");
        transport.push_reply("/robot/status", 500, "boom");
        transport.push_reply("/robot/status", 200, "third");
        transport.set_default("/robot/status", 200, "never");

        let mut client = client_with(&transport, &clock);
        let outcome = client.request("/robot/status", Method::Get, &Payload::Empty);

        assert_eq!(
            outcome,
            RequestOutcome::Success {
                body: "third".to_string(),
                attempts: 3
            }
        );
        assert_eq!(transport.request_count(), 3);
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[test]
    fn test_never_more_than_three_attempts() {
        let transport = MockTransport::new();
        let clock = ManualClock::new();
        transport.set_default("/robot/position", 503, "");

        let mut client = client_with(&transport, &clock);
        let outcome = client.request("/robot/position", Method::Post, &Payload::Empty);

        assert_eq!(outcome, RequestOutcome::Failed { attempts: 3 });
        assert_eq!(transport.request_count(), 3);
        // No backoff after the final attempt
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[test]
    fn test_link_down_short_circuits() {
        let transport = MockTransport::new();
        let clock = ManualClock::new();
        transport.set_default("/robot/status", 200, "{}");
        let world = SimHandle::new(&Default::default(), crate::navigation::Heading::East);
        world.set_link_up(false);

        let mut client = CoordinationClient::new(
            Box::new(transport.clone()),
            Box::new(world.link()),
            clock.shared(),
            ConnectionConfig::default(),
        );
        let outcome = client.request("/robot/status", Method::Get, &Payload::Empty);

        assert_eq!(outcome, RequestOutcome::LinkDown);
        assert_eq!(outcome.attempts(), 0);
        assert_eq!(transport.request_count(), 0);
        assert!(clock.sleeps().is_empty());
        assert!(matches!(
            client.fetch_status(),
            Err(PathikError::LinkDown)
        ));
        assert!(!client.probe_health());
    }

    #[test]
    fn test_probe_health_single_attempt() {
        let transport = MockTransport::new();
        let clock = ManualClock::new();
        transport.push_reply("/health", 503, "");
        transport.push_reply("/health", 200, "ok");

        let mut client = client_with(&transport, &clock);
        assert!(!client.probe_health());
        assert_eq!(transport.count_for("/health"), 1);
        assert!(client.probe_health());

        let request = transport.last_for("/health").unwrap();
        assert_eq!(request.timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_fetch_status_decode_error() {
        let transport = MockTransport::new();
        let clock = ManualClock::new();
        transport.push_reply("/robot/status", 200, "not json");

        let mut client = client_with(&transport, &clock);
        let err = client.fetch_status().unwrap_err();

        assert!(err.is_decode());
        // Decoding is not retried
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn test_report_position_payload() {
        let transport = MockTransport::new();
        let clock = ManualClock::new();
        transport.push_reply("/robot/position", 200, r#"{"status":"ok"}"#);

        let mut client = client_with(&transport, &clock);
        let ack = client.report_position(GridPosition::new(2, -1)).unwrap();

        assert_eq!(ack, r#"{"status":"ok"}"#);
        let request = transport.last_for("/robot/position").unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.payload, Payload::Json(r#"{"x":2,"y":-1}"#.to_string()));
    }

    #[test]
    fn test_start_exploration_sends_empty_body() {
        let transport = MockTransport::new();
        let clock = ManualClock::new();
        transport.push_reply("/robot/start", 200, "started");

        let mut client = client_with(&transport, &clock);
        assert_eq!(client.start_exploration().unwrap(), "started");
        assert_eq!(
            transport.last_for("/robot/start").unwrap().payload,
            Payload::Empty
        );
    }

    #[test]
    fn test_upload_image_single_attempt() {
        let transport = MockTransport::new();
        let clock = ManualClock::new();
        transport.push_reply("/robot/image", 200, r#"{"human_detected": true}"#);

        let mut client = client_with(&transport, &clock);
        let verdict = client.upload_image(vec![0xFF, 0xD8, 0xFF]).unwrap();
        assert!(verdict.human_detected);

        let request = transport.last_for("/robot/image").unwrap();
        assert_eq!(request.payload, Payload::Jpeg(vec![0xFF, 0xD8, 0xFF]));
        assert_eq!(request.timeout, Duration::from_millis(15_000));

        assert!(client.upload_image(vec![0xFF]).is_err());
        assert_eq!(transport.count_for("/robot/image"), 2);
    }
}
