//! # Pulse Oximeter Simulation
//!
//! Synthetic PPG source and a clock-paced simulated sensor for running
//! the `pulsox-core` pipeline without hardware: generate a waveform
//! with known vitals, feed it through [`SimSensor`], and check what
//! the oximeter reads back.
//!
//! ## Example
//!
//! ```
//! use pulsox_core::prelude::*;
//! use pulsox_sim::{PpgWaveformConfig, SimSensor};
//!
//! let clock = ManualClock::new();
//! let sensor = SimSensor::with_seed(PpgWaveformConfig::with_vitals(65.0, 98.0), clock.clone(), 3);
//! let mut ox = PulseOximeter::new(sensor, clock.clone());
//! ox.initialize().unwrap();
//!
//! // One simulated second.
//! for _ in 0..100 {
//!     ox.update().unwrap();
//!     clock.advance(10);
//! }
//! assert_eq!(ox.heart_rate(), 0.0); // still inside the settling holdoff
//! ```

pub mod sensor;
pub mod waveform;

pub use sensor::{SimSensor, FIFO_DEPTH, NOMINAL_IR_CURRENT, NOMINAL_RED_CURRENT};
pub use waveform::{PpgWaveform, PpgWaveformConfig};
