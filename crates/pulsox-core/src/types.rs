//! Shared types for the oximetry pipeline
//!
//! Raw sample pairs as they come off the sensor FIFO, plus the LED drive
//! current scale used by the bias controller.

use serde::{Deserialize, Serialize};

/// Nominal acquisition rate of the front end in samples per second.
pub const SAMPLE_RATE_HZ: f64 = 100.0;

/// Interval between consecutive samples, in milliseconds.
pub const SAMPLE_PERIOD_MS: u64 = 10;

/// One raw photodetector reading, both LED channels sampled together.
///
/// Values are raw ADC counts. The IR channel carries the pulse waveform
/// used for beat detection; the red channel is only needed for the
/// SpO2 ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplePair {
    /// Infrared channel, raw counts.
    pub ir: u16,
    /// Red channel, raw counts.
    pub red: u16,
}

impl SamplePair {
    pub fn new(ir: u16, red: u16) -> Self {
        Self { ir, red }
    }
}

/// LED drive current selector.
///
/// The front end programs LED brightness from a 16-step current table
/// rather than in milliamps directly. This newtype keeps the step index
/// and the physical current together so the bias controller can walk
/// the scale one step at a time without leaving its bounds.
///
/// Serialized as the bare index. Deserialization goes through
/// [`TryFrom<u8>`] and rejects values past the end of the table, so a
/// stored setting cannot carry an out-of-range index.
///
/// ## Example
///
/// ```
/// use pulsox_core::types::LedCurrent;
///
/// let c = LedCurrent::MA_27_1;
/// assert_eq!(c.index(), 8);
/// assert!((c.milliamps() - 27.1).abs() < 1e-9);
/// assert_eq!(LedCurrent::MAX.step_up(), LedCurrent::MAX);
/// assert!(LedCurrent::try_from(16).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LedCurrent(u8);

/// Error for an LED current index past the end of the drive table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("LED current index {0} outside the 16-step drive table")]
pub struct InvalidLedCurrent(pub u8);

/// Drive current in milliamps for each table index.
const TABLE_MA: [f64; 16] = [
    0.0, 4.4, 7.6, 11.0, 14.2, 17.4, 20.8, 24.0, 27.1, 30.6, 33.8, 37.0, 40.2, 43.6, 46.8, 50.0,
];

impl LedCurrent {
    /// Lowest table entry (LED off).
    pub const MIN: LedCurrent = LedCurrent(0);
    /// Highest table entry, 50 mA.
    pub const MAX: LedCurrent = LedCurrent(15);
    /// 27.1 mA, the usual red LED starting point.
    pub const MA_27_1: LedCurrent = LedCurrent(8);
    /// 50 mA, the usual IR LED starting point.
    pub const MA_50: LedCurrent = LedCurrent(15);

    /// Builds a current from a table index, clamping to the table length.
    pub fn from_index(index: u8) -> Self {
        LedCurrent(index.min(Self::MAX.0))
    }

    /// Table index of this setting.
    pub fn index(&self) -> u8 {
        self.0
    }

    /// Physical drive current in milliamps.
    pub fn milliamps(&self) -> f64 {
        TABLE_MA[self.0 as usize]
    }

    /// Next brighter setting, saturating at the top of the table.
    pub fn step_up(self) -> Self {
        LedCurrent((self.0 + 1).min(Self::MAX.0))
    }

    /// Next dimmer setting, saturating at the bottom of the table.
    pub fn step_down(self) -> Self {
        LedCurrent(self.0.saturating_sub(1))
    }
}

impl TryFrom<u8> for LedCurrent {
    type Error = InvalidLedCurrent;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        if index <= Self::MAX.0 {
            Ok(LedCurrent(index))
        } else {
            Err(InvalidLedCurrent(index))
        }
    }
}

impl From<LedCurrent> for u8 {
    fn from(current: LedCurrent) -> u8 {
        current.0
    }
}
