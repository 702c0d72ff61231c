//! Heartbeat detection on the filtered PPG waveform
//!
//! Finds individual pulses in the cleaned-up AC signal and keeps a
//! smoothed estimate of the beat-to-beat period. Detection is a small
//! state machine built around an adaptive threshold:
//!
//! - **Init**: ignore everything for a holdoff after the first sample,
//!   while the upstream filters settle.
//! - **Waiting**: let the threshold fall until a sample crosses it.
//! - **FollowingSlope**: ride the rising edge, dragging the threshold
//!   up to the running maximum.
//! - **MaybeDetected**: the signal dipped; a drop that clears the
//!   resiliency step confirms the beat, anything smaller was noise.
//! - **Masking**: refractory window after a confirmed beat so one
//!   pulse cannot count twice.
//!
//! The threshold never stops moving. Between beats it falls toward
//! zero (clamped at a floor) so weaker pulses can still be caught;
//! while a rhythm is locked the falloff is paced so the threshold
//! reaches a fixed fraction of the last peak in one beat period.
//!
//! Timestamps come from the caller with every sample. The detector
//! never resets itself; losing the rhythm only clears the period
//! estimate, and the state machine recovers on its own.
//!
//! ## Example
//!
//! ```
//! use pulsox_core::beat_detector::BeatDetector;
//!
//! // 75 bpm sawtooth pulse train, one sample every 10 ms.
//! let mut det = BeatDetector::new();
//! let mut beats = 0;
//! for i in 0..1500u64 {
//!     let phase = i % 80;
//!     let sample = if phase < 8 { 100.0 + 50.0 * phase as f64 } else { 0.0 };
//!     if det.process_sample(sample, i * 10) {
//!         beats += 1;
//!     }
//! }
//! assert!(beats > 5);
//! assert!(det.rate() > 70.0 && det.rate() < 80.0);
//! ```

use crate::types;

/// Settling time after the first sample before any beat is counted, ms.
pub const INIT_HOLDOFF_MS: u64 = 2000;

/// Refractory window after a confirmed beat, ms.
pub const MASKING_HOLDOFF_MS: u64 = 200;

/// EMA weight of the newest interval in the beat period estimate.
pub const BEAT_PERIOD_EMA_ALPHA: f64 = 0.6;

/// Drop below the threshold required to confirm a beat.
pub const STEP_RESILIENCY: f64 = 30.0;

/// Floor for the adaptive threshold.
pub const MIN_THRESHOLD: f64 = 20.0;

/// Ceiling for the adaptive threshold.
pub const MAX_THRESHOLD: f64 = 800.0;

/// Fraction of the last peak the threshold falls to over one beat period.
pub const THRESHOLD_FALLOFF_TARGET: f64 = 0.3;

/// Per-sample multiplicative decay used when no rhythm is locked.
pub const THRESHOLD_DECAY_FACTOR: f64 = 0.99;

/// Beat-free time after which the period estimate is discarded, ms.
pub const INVALID_READOUT_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BeatState {
    /// Settling holdoff after the first sample.
    Init,
    /// Threshold decaying, waiting for a rising edge.
    Waiting,
    /// Rising edge in progress, threshold tracks the peak.
    FollowingSlope,
    /// Signal dipped below the threshold, confirmation pending.
    MaybeDetected,
    /// Refractory window after a confirmed beat.
    Masking,
}

/// Adaptive-threshold beat detector.
///
/// Feed it the filtered, inverted AC waveform one sample at a time;
/// it reports each confirmed beat and exposes the smoothed pulse rate.
#[derive(Debug, Clone)]
pub struct BeatDetector {
    state: BeatState,
    threshold: f64,
    beat_period: f64,
    last_max_value: f64,
    ts_last_beat: Option<u64>,
    ts_origin: Option<u64>,
}

impl BeatDetector {
    pub fn new() -> Self {
        Self {
            state: BeatState::Init,
            threshold: MIN_THRESHOLD,
            beat_period: 0.0,
            last_max_value: 0.0,
            ts_last_beat: None,
            ts_origin: None,
        }
    }

    /// Runs the detector over one sample taken at `now_ms`.
    ///
    /// Returns `true` exactly once per detected beat. `now_ms` must not
    /// go backwards between calls.
    pub fn process_sample(&mut self, sample: f64, now_ms: u64) -> bool {
        let mut beat = false;

        match self.state {
            BeatState::Init => {
                let origin = *self.ts_origin.get_or_insert(now_ms);
                if now_ms.saturating_sub(origin) > INIT_HOLDOFF_MS {
                    self.state = BeatState::Waiting;
                }
            }

            BeatState::Waiting => {
                if sample > self.threshold {
                    self.threshold = sample.min(MAX_THRESHOLD);
                    self.state = BeatState::FollowingSlope;
                }

                // Tracking lost, discard the rhythm.
                if let Some(ts) = self.ts_last_beat {
                    if now_ms.saturating_sub(ts) > INVALID_READOUT_DELAY_MS {
                        self.beat_period = 0.0;
                        self.last_max_value = 0.0;
                    }
                }

                self.decrease_threshold();
            }

            BeatState::FollowingSlope => {
                if sample < self.threshold {
                    self.state = BeatState::MaybeDetected;
                } else {
                    self.threshold = sample.min(MAX_THRESHOLD);
                }
            }

            BeatState::MaybeDetected => {
                if sample + STEP_RESILIENCY < self.threshold {
                    beat = true;
                    self.last_max_value = sample;
                    self.state = BeatState::Masking;

                    if let Some(ts) = self.ts_last_beat {
                        let delta = now_ms.saturating_sub(ts);
                        if delta > 0 {
                            self.beat_period = BEAT_PERIOD_EMA_ALPHA * delta as f64
                                + (1.0 - BEAT_PERIOD_EMA_ALPHA) * self.beat_period;
                        }
                    }
                    self.ts_last_beat = Some(now_ms);
                } else {
                    self.state = BeatState::FollowingSlope;
                }
            }

            BeatState::Masking => {
                if let Some(ts) = self.ts_last_beat {
                    if now_ms.saturating_sub(ts) > MASKING_HOLDOFF_MS {
                        self.state = BeatState::Waiting;
                    }
                }
                self.decrease_threshold();
            }
        }

        beat
    }

    /// Smoothed pulse rate in beats per minute, 0 while no rhythm is locked.
    pub fn rate(&self) -> f64 {
        if self.beat_period > 0.0 {
            60_000.0 / self.beat_period
        } else {
            0.0
        }
    }

    /// Current value of the adaptive threshold, for diagnostics.
    pub fn current_threshold(&self) -> f64 {
        self.threshold
    }

    fn decrease_threshold(&mut self) {
        if self.last_max_value > 0.0 && self.beat_period > 0.0 {
            // Paced falloff: reach FALLOFF_TARGET of the last peak in
            // one beat period's worth of samples.
            let samples_per_beat = self.beat_period / types::SAMPLE_PERIOD_MS as f64;
            self.threshold -=
                self.last_max_value * (1.0 - THRESHOLD_FALLOFF_TARGET) / samples_per_beat;
        } else {
            self.threshold *= THRESHOLD_DECAY_FACTOR;
        }

        if self.threshold < MIN_THRESHOLD {
            self.threshold = MIN_THRESHOLD;
        }
    }
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new()
    }
}
