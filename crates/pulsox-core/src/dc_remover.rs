//! Baseline removal for raw PPG channels
//!
//! Raw photodetector counts are dominated by a large, slowly drifting
//! DC level set by LED brightness, skin tone and sensor placement. The
//! pulsatile signal the rest of the pipeline cares about rides on top
//! of that baseline at a fraction of a percent of its size.
//!
//! [`DcRemover`] is a single-pole high-pass built from a leaky
//! integrator: the integrator tracks the baseline, and the output is
//! the step-to-step change of the integrator state. The integrator
//! state itself is kept readable because the LED bias controller
//! compares the two channels' baselines in exactly those units.
//!
//! ## Example
//!
//! ```
//! use pulsox_core::dc_remover::DcRemover;
//!
//! let mut dc = DcRemover::new(0.95);
//! let mut ac = 0.0;
//! for _ in 0..400 {
//!     ac = dc.step(50_000.0);
//! }
//! // A constant input settles to zero AC, with the accumulator at
//! // input / (1 - alpha).
//! assert!(ac.abs() < 1.0);
//! assert!((dc.dc_level() - 1_000_000.0).abs() < 10.0);
//! ```

/// Leaky-integrator DC remover for one channel.
#[derive(Debug, Clone)]
pub struct DcRemover {
    alpha: f64,
    dcw: f64,
}

impl DcRemover {
    /// Creates a remover with the given leak coefficient.
    ///
    /// `alpha` is clamped to `[0.0, 0.99999]`; values near 1.0 track
    /// the baseline more slowly and pass more of the low-frequency
    /// signal through.
    pub fn new(alpha: f64) -> Self {
        Self { alpha: alpha.clamp(0.0, 0.99999), dcw: 0.0 }
    }

    /// Removes the baseline from one raw sample, returning the AC part.
    #[inline]
    pub fn step(&mut self, x: f64) -> f64 {
        let old = self.dcw;
        self.dcw = x + self.alpha * old;
        self.dcw - old
    }

    /// Current accumulator state.
    ///
    /// This is the raw integrator value, scaled by `1 / (1 - alpha)`
    /// relative to the input baseline. Consumers comparing channel
    /// baselines must compare in these units.
    pub fn dc_level(&self) -> f64 {
        self.dcw
    }

    /// Leak coefficient this remover was built with.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Clears the accumulator, restarting baseline acquisition.
    pub fn reset(&mut self) {
        self.dcw = 0.0;
    }
}
