//! # Pulse Oximetry DSP
//!
//! Signal processing for dual-LED photoplethysmography: turn raw
//! red / infrared photodetector counts into a pulse rate and an SpO2
//! estimate.
//!
//! The pipeline runs one stage per sample, cheap enough for a
//! microcontroller-class polling loop:
//!
//! ```text
//!   raw counts -> DC removal -> inversion + low-pass -> beat detection
//!                      \                                      /
//!                       +-> AC energy window -> SpO2 calibration
//! ```
//!
//! [`PulseOximeter`] glues the stages onto any [`PpgSensor`]
//! implementation and adds the LED bias controller that keeps the two
//! channels' DC levels matched. Every stage is also usable on its own.
//!
//! ## Example
//!
//! ```
//! use pulsox_core::{BeatDetector, DcRemover, LowPassFilter};
//!
//! // A constant input has no pulse in it.
//! let mut dc = DcRemover::new(0.95);
//! let mut lpf = LowPassFilter::new();
//! let mut det = BeatDetector::new();
//!
//! let mut beats = 0;
//! for i in 0..500u64 {
//!     let ac = dc.step(50_000.0);
//!     let filtered = lpf.step(-ac);
//!     if det.process_sample(filtered, i * 10) {
//!         beats += 1;
//!     }
//! }
//! assert_eq!(beats, 0);
//! ```

pub mod beat_detector;
pub mod dc_remover;
pub mod lowpass;
pub mod oximeter;
pub mod sensor;
pub mod spo2;
pub mod timing;
pub mod types;

pub use beat_detector::BeatDetector;
pub use dc_remover::DcRemover;
pub use lowpass::LowPassFilter;
pub use oximeter::{OximeterState, PulseOximeter};
pub use sensor::{PpgSensor, SensorError, SensorResult};
pub use spo2::SpO2Calculator;
pub use timing::{ManualClock, MillisClock, SystemClock};
pub use types::{InvalidLedCurrent, LedCurrent, SamplePair};

/// Common imports for working with the pipeline.
pub mod prelude {
    pub use crate::oximeter::{OximeterState, PulseOximeter};
    pub use crate::sensor::{PpgSensor, SensorError, SensorResult};
    pub use crate::timing::{ManualClock, MillisClock, SystemClock};
    pub use crate::types::{LedCurrent, SamplePair};
}
