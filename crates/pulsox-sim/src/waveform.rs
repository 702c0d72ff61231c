//! Synthetic PPG waveform generation
//!
//! Produces raw-count red / infrared sample streams with a controlled
//! heart rate and oxygen saturation, for driving the pipeline without
//! hardware. The pulse is a three-harmonic approximation of a cardiac
//! waveform; its depth on the red channel relative to the infrared one
//! encodes the target SpO2 through the usual ratio-of-ratios model.
//!
//! ## Example
//!
//! ```
//! use pulsox_sim::waveform::{PpgWaveform, PpgWaveformConfig};
//!
//! let mut wave = PpgWaveform::with_seed(PpgWaveformConfig::default(), 1);
//! let (ir, red) = wave.next_sample();
//! assert!(ir > 0.0 && red > 0.0);
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Parameters of the synthetic subject and front end.
///
/// DC baselines are the channel levels at the nominal LED drive
/// currents; [`crate::sensor::SimSensor`] scales them when the LEDs are
/// reprogrammed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpgWaveformConfig {
    /// Simulated heart rate in beats per minute.
    pub heart_rate_bpm: f64,
    /// Simulated oxygen saturation in percent.
    pub spo2_percent: f64,
    /// Pulsatile depth of the IR channel, as a fraction of its baseline.
    pub ir_ac_dc: f64,
    /// IR DC baseline in raw counts.
    pub ir_dc: f64,
    /// Red DC baseline in raw counts.
    pub red_dc: f64,
    /// Additive Gaussian noise per channel, standard deviation in counts.
    pub noise_std: f64,
    /// Sample rate of the generated stream in Hz.
    pub sample_rate_hz: f64,
}

impl Default for PpgWaveformConfig {
    fn default() -> Self {
        Self {
            heart_rate_bpm: 72.0,
            spo2_percent: 97.0,
            ir_ac_dc: 0.02,
            ir_dc: 50_000.0,
            red_dc: 40_000.0,
            noise_std: 10.0,
            sample_rate_hz: pulsox_core::types::SAMPLE_RATE_HZ,
        }
    }
}

impl PpgWaveformConfig {
    /// Default front end with the given vitals.
    pub fn with_vitals(heart_rate_bpm: f64, spo2_percent: f64) -> Self {
        Self { heart_rate_bpm, spo2_percent, ..Self::default() }
    }
}

/// Stateful generator of raw (IR, red) sample pairs.
pub struct PpgWaveform {
    config: PpgWaveformConfig,
    red_ac_dc: f64,
    noise: Option<Normal<f64>>,
    rng: StdRng,
    sample_index: u64,
}

impl PpgWaveform {
    pub fn new(config: PpgWaveformConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Generator with a fixed seed, for reproducible runs.
    pub fn with_seed(config: PpgWaveformConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: PpgWaveformConfig, rng: StdRng) -> Self {
        // Ratio-of-ratios: R = (110 - SpO2) / 25 sets the relative
        // pulse depth of the red channel.
        let r_target = (110.0 - config.spo2_percent.clamp(0.0, 100.0)) / 25.0;
        let red_ac_dc = r_target * config.ir_ac_dc;
        let noise = if config.noise_std > 0.0 && config.noise_std.is_finite() {
            Normal::new(0.0, config.noise_std).ok()
        } else {
            None
        };
        Self { config, red_ac_dc, noise, rng, sample_index: 0 }
    }

    /// Generates the next raw sample pair, in counts, as `(ir, red)`.
    pub fn next_sample(&mut self) -> (f64, f64) {
        let t = self.sample_index as f64 / self.config.sample_rate_hz;
        self.sample_index += 1;

        let phase = 2.0 * std::f64::consts::PI * (self.config.heart_rate_bpm / 60.0) * t;
        // Three harmonics: systolic upstroke plus a soft dicrotic notch.
        // Negative sign because the pulse absorbs light.
        let pulse = -0.6 * phase.sin() - 0.3 * (2.0 * phase).sin() - 0.1 * (3.0 * phase).sin();

        let ir = self.config.ir_dc * (1.0 + self.config.ir_ac_dc * pulse) + self.noise_sample();
        let red = self.config.red_dc * (1.0 + self.red_ac_dc * pulse) + self.noise_sample();
        (ir, red)
    }

    /// Generates a block of `count` sample pairs.
    pub fn generate(&mut self, count: usize) -> Vec<(f64, f64)> {
        (0..count).map(|_| self.next_sample()).collect()
    }

    /// Restarts the waveform phase. The noise stream keeps running.
    pub fn reset(&mut self) {
        self.sample_index = 0;
    }

    pub fn config(&self) -> &PpgWaveformConfig {
        &self.config
    }

    fn noise_sample(&mut self) -> f64 {
        match &self.noise {
            Some(dist) => dist.sample(&mut self.rng),
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(bpm: f64, spo2: f64) -> PpgWaveformConfig {
        PpgWaveformConfig { noise_std: 0.0, ..PpgWaveformConfig::with_vitals(bpm, spo2) }
    }

    #[test]
    fn test_first_sample_sits_on_baseline() {
        // Phase zero has no pulse component.
        let mut wave = PpgWaveform::new(quiet(72.0, 97.0));
        let (ir, red) = wave.next_sample();
        assert_eq!(ir, 50_000.0);
        assert_eq!(red, 40_000.0);
    }

    #[test]
    fn test_mean_matches_dc_baseline() {
        // 60 bpm at 100 Hz is exactly 100 samples per beat.
        let mut wave = PpgWaveform::new(quiet(60.0, 97.0));
        let block = wave.generate(500);

        let mean_ir: f64 = block.iter().map(|&(ir, _)| ir).sum::<f64>() / 500.0;
        let mean_red: f64 = block.iter().map(|&(_, red)| red).sum::<f64>() / 500.0;
        assert!((mean_ir - 50_000.0).abs() < 1e-6, "IR mean drifted to {mean_ir}");
        assert!((mean_red - 40_000.0).abs() < 1e-6, "red mean drifted to {mean_red}");
    }

    #[test]
    fn test_ir_pulsatile_depth() {
        let mut wave = PpgWaveform::new(quiet(60.0, 97.0));
        let block = wave.generate(2_000);

        let max = block.iter().map(|&(ir, _)| ir).fold(f64::MIN, f64::max);
        let min = block.iter().map(|&(ir, _)| ir).fold(f64::MAX, f64::min);
        let p2p = max - min;
        // Harmonic mix peaks at +-0.806 of the configured 2 % depth.
        assert!(
            p2p > 1_550.0 && p2p < 1_650.0,
            "IR peak-to-peak {p2p} outside the expected band"
        );
    }

    #[test]
    fn test_red_depth_tracks_spo2() {
        let mut wave = PpgWaveform::new(quiet(60.0, 100.0));
        let block = wave.generate(2_000);

        let p2p = |pick: fn(&(f64, f64)) -> f64| {
            let max = block.iter().map(pick).fold(f64::MIN, f64::max);
            let min = block.iter().map(pick).fold(f64::MAX, f64::min);
            max - min
        };
        let rel_ir = p2p(|&(ir, _)| ir) / 50_000.0;
        let rel_red = p2p(|&(_, red)| red) / 40_000.0;

        // SpO2 100 -> R = 0.4.
        let ratio = rel_red / rel_ir;
        assert!((ratio - 0.4).abs() < 1e-9, "relative depth ratio {ratio} should be 0.4");
    }

    #[test]
    fn test_seeded_streams_match() {
        let config = PpgWaveformConfig { noise_std: 5.0, ..PpgWaveformConfig::default() };
        let mut a = PpgWaveform::with_seed(config.clone(), 42);
        let mut b = PpgWaveform::with_seed(config, 42);

        for i in 0..100 {
            let (ia, ra) = a.next_sample();
            let (ib, rb) = b.next_sample();
            assert_eq!(ia, ib, "IR streams diverged at sample {i}");
            assert_eq!(ra, rb, "red streams diverged at sample {i}");
        }
    }

    #[test]
    fn test_reset_restarts_phase() {
        let mut wave = PpgWaveform::new(quiet(72.0, 97.0));
        let first = wave.next_sample();
        wave.generate(36);

        wave.reset();
        assert_eq!(wave.next_sample(), first);
    }
}
