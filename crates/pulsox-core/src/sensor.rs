//! PPG sensor abstraction
//!
//! The oximeter talks to the optical front end exclusively through the
//! [`PpgSensor`] trait. Hardware backends wrap an I2C device; the
//! simulator implements the same trait over a synthetic waveform, so
//! the whole pipeline can run without a sensor attached.

use crate::types::{LedCurrent, SamplePair};

/// Result type for sensor operations.
pub type SensorResult<T> = Result<T, SensorError>;

/// Errors raised by a PPG front end.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SensorError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Sensor not configured")]
    NotConfigured,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Bus error: {0}")]
    BusError(String),

    #[error("FIFO overrun, {0} samples dropped")]
    FifoOverrun(usize),
}

/// A dual-LED photoplethysmography front end.
///
/// Implementations sample both LED channels at [`crate::types::SAMPLE_RATE_HZ`]
/// into an internal FIFO between polls.
pub trait PpgSensor: Send {
    /// Probes and configures the device for dual-channel acquisition.
    ///
    /// Must leave the FIFO empty, so the first poll only returns samples
    /// taken after configuration.
    fn configure(&mut self) -> SensorResult<()>;

    /// Drains every sample currently buffered, oldest first.
    ///
    /// Returns an empty vector when nothing has accumulated yet. Never
    /// blocks waiting for data.
    fn poll_samples(&mut self) -> SensorResult<Vec<SamplePair>>;

    /// Programs the drive current of both LEDs.
    fn set_led_currents(&mut self, ir: LedCurrent, red: LedCurrent) -> SensorResult<()>;

    /// Puts the device into its low-power state. Acquisition stops.
    fn shutdown(&mut self) -> SensorResult<()>;

    /// Wakes the device from shutdown and restarts acquisition.
    fn resume(&mut self) -> SensorResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SensorError::DeviceNotFound("0x57".to_string());
        assert_eq!(err.to_string(), "Device not found: 0x57");

        let err = SensorError::FifoOverrun(14);
        assert_eq!(err.to_string(), "FIFO overrun, 14 samples dropped");

        let err = SensorError::NotConfigured;
        assert_eq!(err.to_string(), "Sensor not configured");
    }
}
