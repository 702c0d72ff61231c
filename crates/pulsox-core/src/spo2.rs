//! SpO2 estimation from the red / infrared pulse ratio
//!
//! Oxygenated and deoxygenated hemoglobin absorb red and infrared
//! light differently, so the relative strength of the pulse on the two
//! channels tracks oxygen saturation. The calculator accumulates the
//! AC energy of both channels over a window of three heartbeats, takes
//! the log-domain ratio of the mean squares, and maps it through an
//! empirical calibration table.
//!
//! The window always closes on its third beat: the accumulators and
//! the cached reading are cleared, and only an in-range ratio writes a
//! fresh value. A reading of 0 therefore means "no valid estimate",
//! never a stale one.
//!
//! ## Example
//!
//! ```
//! use pulsox_core::spo2::SpO2Calculator;
//!
//! let mut calc = SpO2Calculator::new();
//! for _ in 0..3 {
//!     for _ in 0..24 {
//!         calc.update(std::f64::consts::E, 0.725f64.exp(), false);
//!     }
//!     calc.update(std::f64::consts::E, 0.725f64.exp(), true);
//! }
//! assert_eq!(calc.spo2(), 99);
//! ```

/// Beats accumulated before each SpO2 computation.
const CALCULATE_EVERY_N_BEATS: u32 = 3;

/// Calibration table mapping the scaled log-ratio to SpO2 percent.
const SPO2_LUT: [u8; 43] = [
    100, 100, 100, 100, 99, 99, 99, 99, 99, 99, 98, 98, 98, 98, 98, 97, 97, 97, 97, 97, 97, 96,
    96, 96, 96, 96, 96, 95, 95, 95, 95, 95, 95, 94, 94, 94, 94, 94, 93, 93, 93, 93, 93,
];

/// Windowed ratio-of-squares SpO2 estimator.
#[derive(Debug, Clone, Default)]
pub struct SpO2Calculator {
    ir_ac_sq_sum: f64,
    red_ac_sq_sum: f64,
    beats: u32,
    samples: u64,
    spo2: u8,
}

impl SpO2Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates one AC sample pair; `beat_detected` marks the samples
    /// on which the detector confirmed a beat.
    pub fn update(&mut self, ir_ac: f64, red_ac: f64, beat_detected: bool) {
        self.ir_ac_sq_sum += ir_ac * ir_ac;
        self.red_ac_sq_sum += red_ac * red_ac;
        self.samples += 1;

        if beat_detected {
            self.beats += 1;
            if self.beats == CALCULATE_EVERY_N_BEATS {
                let n = self.samples as f64;
                let ac_sq_ratio =
                    100.0 * (self.red_ac_sq_sum / n).ln() / (self.ir_ac_sq_sum / n).ln();

                let index = if ac_sq_ratio > 66.0 {
                    ac_sq_ratio as usize - 66
                } else if ac_sq_ratio > 50.0 {
                    ac_sq_ratio as usize - 50
                } else {
                    0
                };

                // The window always closes here, clearing the cached
                // value; only an in-range ratio writes a fresh one.
                self.reset();
                if let Some(&pct) = SPO2_LUT.get(index) {
                    self.spo2 = pct;
                }
            }
        }
    }

    /// Clears the accumulation window and the cached reading.
    pub fn reset(&mut self) {
        self.ir_ac_sq_sum = 0.0;
        self.red_ac_sq_sum = 0.0;
        self.beats = 0;
        self.samples = 0;
        self.spo2 = 0;
    }

    /// Latest SpO2 estimate in percent, 0 when no valid estimate exists.
    pub fn spo2(&self) -> u8 {
        self.spo2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::E;

    /// Runs `beats` full beat groups of `samples_per_beat` samples each,
    /// with constant channel levels and a beat on each group's last sample.
    fn run_window(calc: &mut SpO2Calculator, ir: f64, red: f64, beats: usize, samples_per_beat: usize) {
        for _ in 0..beats {
            for s in 0..samples_per_beat {
                calc.update(ir, red, s == samples_per_beat - 1);
            }
        }
    }

    #[test]
    fn test_high_ratio_branch_maps_through_lut() {
        let mut calc = SpO2Calculator::new();
        // ln mean squares: red 1.6, ir 2.0, scaled ratio 80 -> table slot 14.
        run_window(&mut calc, E, 0.8f64.exp(), 3, 10);
        assert_eq!(calc.spo2(), 98);
    }

    #[test]
    fn test_mid_ratio_branch_maps_through_lut() {
        let mut calc = SpO2Calculator::new();
        // Scaled ratio 55 takes the lower branch: slot 5.
        run_window(&mut calc, E, 0.55f64.exp(), 3, 10);
        assert_eq!(calc.spo2(), 99);
    }

    #[test]
    fn test_low_ratio_saturates_at_100() {
        let mut calc = SpO2Calculator::new();
        // Scaled ratio 20, below both branch cutoffs.
        run_window(&mut calc, E, 0.2f64.exp(), 3, 10);
        assert_eq!(calc.spo2(), 100);
    }

    #[test]
    fn test_out_of_range_ratio_reads_zero() {
        let mut calc = SpO2Calculator::new();
        // Scaled ratio 115 lands past the table end.
        run_window(&mut calc, E, 1.15f64.exp(), 3, 10);
        assert_eq!(calc.spo2(), 0, "an off-table ratio must read as no estimate");
    }

    #[test]
    fn test_out_of_range_clears_previous_reading() {
        let mut calc = SpO2Calculator::new();
        run_window(&mut calc, E, 0.8f64.exp(), 3, 10);
        assert_eq!(calc.spo2(), 98);

        run_window(&mut calc, E, 1.15f64.exp(), 3, 10);
        assert_eq!(calc.spo2(), 0, "a bad window must not leave the old reading visible");
    }

    #[test]
    fn test_partial_window_keeps_previous_reading() {
        let mut calc = SpO2Calculator::new();
        run_window(&mut calc, E, 0.8f64.exp(), 3, 10);
        assert_eq!(calc.spo2(), 98);

        // Two beats of a new window, nothing recomputed yet.
        run_window(&mut calc, E, 1.15f64.exp(), 2, 10);
        assert_eq!(calc.spo2(), 98, "reading holds until the window's third beat");
    }

    #[test]
    fn test_reset_requires_full_new_window() {
        let mut calc = SpO2Calculator::new();
        run_window(&mut calc, E, 0.8f64.exp(), 3, 10);
        assert_eq!(calc.spo2(), 98);

        calc.reset();
        assert_eq!(calc.spo2(), 0);

        run_window(&mut calc, E, 0.8f64.exp(), 2, 10);
        assert_eq!(calc.spo2(), 0, "two beats after reset are not enough");

        run_window(&mut calc, E, 0.8f64.exp(), 1, 10);
        assert_eq!(calc.spo2(), 98);
    }
}
