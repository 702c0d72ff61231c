//! Simulated PPG front end
//!
//! [`SimSensor`] implements [`PpgSensor`] over a [`PpgWaveform`],
//! pacing acquisition with a shared [`ManualClock`]: every elapsed
//! sample period deposits one sample pair into a bounded FIFO, and
//! polling drains it, exactly like a hardware driver servicing the
//! real chip's ring buffer. When the FIFO overflows the oldest samples
//! are dropped, mirroring the chip's write pointer wrapping.
//!
//! LED reprogramming feeds back into the signal: each channel's
//! baseline scales with its drive current relative to the nominal
//! calibration point, so the oximeter's bias controller converges in
//! simulation just as it would against hardware.

use std::collections::VecDeque;

use tracing::debug;

use pulsox_core::sensor::{PpgSensor, SensorError, SensorResult};
use pulsox_core::timing::{ManualClock, MillisClock};
use pulsox_core::types::{LedCurrent, SamplePair, SAMPLE_PERIOD_MS};

use crate::waveform::{PpgWaveform, PpgWaveformConfig};

/// Samples the simulated FIFO holds before dropping the oldest.
pub const FIFO_DEPTH: usize = 16;

/// Drive current at which the IR baseline is calibrated.
pub const NOMINAL_IR_CURRENT: LedCurrent = LedCurrent::MA_50;

/// Drive current at which the red baseline is calibrated.
pub const NOMINAL_RED_CURRENT: LedCurrent = LedCurrent::MA_27_1;

/// Clock-paced simulated sensor.
pub struct SimSensor {
    waveform: PpgWaveform,
    clock: ManualClock,
    fifo: VecDeque<SamplePair>,
    /// Timestamp up to which the waveform has been sampled.
    last_fill_ms: u64,
    ir_current: LedCurrent,
    red_current: LedCurrent,
    /// Every accepted (IR, red) current programming, in order.
    led_log: Vec<(LedCurrent, LedCurrent)>,
    overruns: u64,
    configured: bool,
    shut_down: bool,
    injected: VecDeque<SamplePair>,
    fault: Option<SensorError>,
}

impl SimSensor {
    pub fn new(config: PpgWaveformConfig, clock: ManualClock) -> Self {
        Self::from_waveform(PpgWaveform::new(config), clock)
    }

    /// Simulated sensor with a seeded noise stream, for reproducible runs.
    pub fn with_seed(config: PpgWaveformConfig, clock: ManualClock, seed: u64) -> Self {
        Self::from_waveform(PpgWaveform::with_seed(config, seed), clock)
    }

    fn from_waveform(waveform: PpgWaveform, clock: ManualClock) -> Self {
        let last_fill_ms = clock.now_ms();
        Self {
            waveform,
            clock,
            fifo: VecDeque::with_capacity(FIFO_DEPTH),
            last_fill_ms,
            ir_current: NOMINAL_IR_CURRENT,
            red_current: NOMINAL_RED_CURRENT,
            led_log: Vec::new(),
            overruns: 0,
            configured: false,
            shut_down: false,
            injected: VecDeque::new(),
            fault: None,
        }
    }

    /// Queues raw sample pairs to be served ahead of the synthetic
    /// waveform. Injected pairs bypass the LED gain model.
    pub fn inject_samples(&mut self, samples: Vec<SamplePair>) {
        self.injected.extend(samples);
    }

    /// Makes the next poll fail with the given error.
    pub fn inject_fault(&mut self, err: SensorError) {
        self.fault = Some(err);
    }

    /// Samples dropped to FIFO overflow so far.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Every LED programming accepted since construction.
    pub fn led_log(&self) -> &[(LedCurrent, LedCurrent)] {
        &self.led_log
    }

    pub fn ir_current(&self) -> LedCurrent {
        self.ir_current
    }

    pub fn red_current(&self) -> LedCurrent {
        self.red_current
    }

    /// Deposits every sample period elapsed since the last fill.
    fn fill(&mut self) {
        let now = self.clock.now_ms();
        let pending = now.saturating_sub(self.last_fill_ms) / SAMPLE_PERIOD_MS;

        for _ in 0..pending {
            let pair = match self.injected.pop_front() {
                Some(p) => p,
                None => self.synth_pair(),
            };
            self.fifo.push_back(pair);
            if self.fifo.len() > FIFO_DEPTH {
                self.fifo.pop_front();
                self.overruns += 1;
            }
        }
        self.last_fill_ms += pending * SAMPLE_PERIOD_MS;
    }

    fn synth_pair(&mut self) -> SamplePair {
        let ir_gain = self.ir_current.milliamps() / NOMINAL_IR_CURRENT.milliamps();
        let red_gain = self.red_current.milliamps() / NOMINAL_RED_CURRENT.milliamps();
        let (ir, red) = self.waveform.next_sample();
        SamplePair::new(quantize(ir * ir_gain), quantize(red * red_gain))
    }
}

fn quantize(x: f64) -> u16 {
    x.round().clamp(0.0, 65_535.0) as u16
}

impl PpgSensor for SimSensor {
    fn configure(&mut self) -> SensorResult<()> {
        self.configured = true;
        self.shut_down = false;
        self.fifo.clear();
        self.last_fill_ms = self.clock.now_ms();
        debug!("Simulated sensor configured");
        Ok(())
    }

    fn poll_samples(&mut self) -> SensorResult<Vec<SamplePair>> {
        if let Some(err) = self.fault.take() {
            return Err(err);
        }
        if !self.configured {
            return Err(SensorError::NotConfigured);
        }
        if !self.shut_down {
            self.fill();
        }
        Ok(self.fifo.drain(..).collect())
    }

    fn set_led_currents(&mut self, ir: LedCurrent, red: LedCurrent) -> SensorResult<()> {
        // Samples already due keep the old brightness.
        if self.configured && !self.shut_down {
            self.fill();
        }
        self.ir_current = ir;
        self.red_current = red;
        self.led_log.push((ir, red));
        debug!("LED currents set, IR {:.1} mA, red {:.1} mA", ir.milliamps(), red.milliamps());
        Ok(())
    }

    fn shutdown(&mut self) -> SensorResult<()> {
        if self.configured {
            self.fill();
        }
        self.shut_down = true;
        debug!("Simulated sensor shut down");
        Ok(())
    }

    fn resume(&mut self) -> SensorResult<()> {
        self.shut_down = false;
        self.last_fill_ms = self.clock.now_ms();
        debug!("Simulated sensor resumed");
        Ok(())
    }
}
