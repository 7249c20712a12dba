//! HC-SR04 style time-of-flight ranging.

use std::time::Duration;

use super::{DistanceSensor, EchoPulse, NO_ECHO_CM};

/// Round-trip centimeters per microsecond of echo (speed of sound / 2)
const CM_PER_ECHO_US: f64 = 0.034 / 2.0;

/// Convert an echo pulse width to centimeters.
///
/// Truncates toward zero; a zero result means the echo was too
/// short to be real and maps to [`NO_ECHO_CM`].
pub fn echo_to_cm(echo: Duration) -> u32 {
    let cm = (echo.as_micros() as f64 * CM_PER_ECHO_US) as u32;
    if cm == 0 { NO_ECHO_CM } else { cm }
}

/// Echo width that [`echo_to_cm`] reads back as `cm`
pub fn cm_to_echo(cm: u32) -> Duration {
    Duration::from_micros((cm as f64 / CM_PER_ECHO_US).ceil() as u64)
}

/// Distance sensor over an [`EchoPulse`] transducer
pub struct Ultrasonic<P: EchoPulse> {
    pulse: P,
    timeout: Duration,
}

impl<P: EchoPulse> Ultrasonic<P> {
    pub fn new(pulse: P, timeout: Duration) -> Self {
        Self { pulse, timeout }
    }
}

impl<P: EchoPulse> DistanceSensor for Ultrasonic<P> {
    fn measure(&mut self) -> u32 {
        match self.pulse.pulse(self.timeout) {
            Some(echo) if echo <= self.timeout => echo_to_cm(echo),
            _ => NO_ECHO_CM,
        }
    }
}
