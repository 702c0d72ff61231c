//! Smoothing filter for the beat detection path
//!
//! The inverted AC waveform still carries sensor shot noise and motion
//! spikes that would trip the slope-following beat detector. This
//! low-pass knocks those down while leaving the cardiac band intact.
//!
//! Single-pole Butterworth section with fixed coefficients for a
//! 100 Hz sample rate (filtuino generator output), unity gain at DC
//! and a transmission zero at Nyquist. The -3 dB point sits near
//! 10 Hz, far above any plausible heart rate.

/// Fixed-coefficient low-pass for the 100 Hz sample stream.
#[derive(Debug, Clone, Default)]
pub struct LowPassFilter {
    v0: f64,
    v1: f64,
}

impl LowPassFilter {
    const B0: f64 = 2.452372752527856026e-1;
    const A1: f64 = 5.0952544949442879485e-1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Filters one sample.
    #[inline]
    pub fn step(&mut self, x: f64) -> f64 {
        self.v0 = self.v1;
        self.v1 = Self::B0 * x + Self::A1 * self.v0;
        self.v0 + self.v1
    }

    /// Clears the filter state.
    pub fn reset(&mut self) {
        self.v0 = 0.0;
        self.v1 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unity_dc_gain() {
        let mut f = LowPassFilter::new();
        let mut out = 0.0;
        for _ in 0..200 {
            out = f.step(1.0);
        }
        assert!((out - 1.0).abs() < 1e-6, "DC gain should be unity, settled at {out}");
    }

    #[test]
    fn test_nyquist_is_nulled() {
        let mut f = LowPassFilter::new();
        let mut out = f64::MAX;
        for i in 0..200 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            out = f.step(x);
        }
        assert!(out.abs() < 1e-9, "alternating input must cancel, got {out}");
    }

    #[test]
    fn test_cardiac_band_passes() {
        // 1 Hz sine at the 100 Hz sample rate, amplitude 1.
        let mut f = LowPassFilter::new();
        let omega = 2.0 * std::f64::consts::PI / 100.0;

        for i in 0..100 {
            f.step((omega * i as f64).sin());
        }

        let mut in_sq = 0.0;
        let mut out_sq = 0.0;
        for i in 100..500 {
            let x = (omega * i as f64).sin();
            let y = f.step(x);
            in_sq += x * x;
            out_sq += y * y;
        }
        let gain = (out_sq / in_sq).sqrt();
        assert!(
            gain > 0.95 && gain < 1.0,
            "1 Hz should pass nearly unattenuated, measured gain {gain}"
        );
    }

    #[test]
    fn test_bounded_input_stays_bounded() {
        // The impulse response has unit L1 norm, so outputs never
        // exceed the input bound.
        let mut f = LowPassFilter::new();
        for i in 0..1_000u32 {
            let x = match i % 7 {
                0 | 3 => 1.0,
                1 | 4 | 5 => -1.0,
                _ => 0.5,
            };
            let y = f.step(x);
            assert!(y.abs() <= 1.0 + 1e-9, "output {y} escaped the input bound at step {i}");
        }
    }

    #[test]
    fn test_reset_matches_fresh_filter() {
        let mut f = LowPassFilter::new();
        for i in 0..30 {
            f.step(i as f64);
        }
        f.reset();

        let mut g = LowPassFilter::new();
        assert_eq!(f.step(0.7), g.step(0.7), "reset filter must behave like a new one");
    }
}
