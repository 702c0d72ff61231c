//! High-level pulse oximeter pipeline
//!
//! Wires the whole signal chain onto a [`PpgSensor`] and runs it from
//! a caller-driven polling loop:
//!
//! ```text
//!             raw IR ----> DcRemover ---> -1 ---> LowPassFilter ---> BeatDetector
//!   sensor                     |                                         |
//!   FIFO                       +------------- ir AC ------------+        | beats
//!                                                               v        v
//!             raw red ---> DcRemover ------- red AC --------> SpO2Calculator
//! ```
//!
//! The IR channel drives beat detection; its AC part is inverted first
//! because the pulse shows up as an absorption dip in raw counts, and
//! the detector wants the upstroke pointing up. Both channels' AC
//! parts feed the SpO2 window.
//!
//! Alongside the signal chain runs a slow bang-bang controller that
//! keeps the two channels' DC baselines together by stepping the red
//! LED current, one table step at most every adjustment period. The
//! baselines are compared in DC accumulator units.
//!
//! Call [`PulseOximeter::update`] at least as often as samples arrive;
//! each call drains the sensor FIFO and advances every stage. All
//! timing comes from the injected [`MillisClock`].

use tracing::{debug, info, trace};

use crate::beat_detector::BeatDetector;
use crate::dc_remover::DcRemover;
use crate::lowpass::LowPassFilter;
use crate::sensor::{PpgSensor, SensorResult};
use crate::spo2::SpO2Calculator;
use crate::timing::MillisClock;
use crate::types::{LedCurrent, SamplePair};

/// Minimum interval between LED bias checks, ms.
pub const CURRENT_ADJUSTMENT_PERIOD_MS: u64 = 500;

/// Baseline mismatch, in DC accumulator units, that triggers a bias step.
pub const LED_BIAS_DEADBAND: f64 = 70_000.0;

/// Leak coefficient of both channels' DC removers.
pub const DC_REMOVER_ALPHA: f64 = 0.95;

/// Operating state of the oximeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OximeterState {
    /// Not yet initialized.
    Init,
    /// Running, no pulse locked.
    Idle,
    /// Running with a locked pulse; SpO2 accumulation active.
    Detecting,
}

/// Complete oximetry pipeline over a PPG sensor.
pub struct PulseOximeter<S: PpgSensor, C: MillisClock> {
    sensor: S,
    clock: C,
    ir_dc: DcRemover,
    red_dc: DcRemover,
    lpf: LowPassFilter,
    detector: BeatDetector,
    spo2: SpO2Calculator,
    state: OximeterState,
    ir_current: LedCurrent,
    red_current: LedCurrent,
    ts_last_bias_check: Option<u64>,
}

impl<S: PpgSensor, C: MillisClock> PulseOximeter<S, C> {
    pub fn new(sensor: S, clock: C) -> Self {
        Self {
            sensor,
            clock,
            ir_dc: DcRemover::new(DC_REMOVER_ALPHA),
            red_dc: DcRemover::new(DC_REMOVER_ALPHA),
            lpf: LowPassFilter::new(),
            detector: BeatDetector::new(),
            spo2: SpO2Calculator::new(),
            state: OximeterState::Init,
            ir_current: LedCurrent::MA_50,
            red_current: LedCurrent::MA_27_1,
            ts_last_bias_check: None,
        }
    }

    /// Configures the sensor, programs the starting LED currents and
    /// starts acquisition.
    pub fn initialize(&mut self) -> SensorResult<()> {
        self.sensor.configure()?;
        self.sensor.set_led_currents(self.ir_current, self.red_current)?;
        self.ir_dc.reset();
        self.red_dc.reset();
        self.state = OximeterState::Idle;
        info!(
            "Sensor configured, IR LED at {:.1} mA, red LED at {:.1} mA",
            self.ir_current.milliamps(),
            self.red_current.milliamps()
        );
        Ok(())
    }

    /// Drains the sensor FIFO and runs every buffered sample through
    /// the pipeline, then services the LED bias controller.
    pub fn update(&mut self) -> SensorResult<()> {
        let batch = self.sensor.poll_samples()?;
        if batch.is_empty() {
            return Ok(());
        }

        for pair in batch {
            self.process_pair(pair);
        }
        self.check_current_bias()
    }

    fn process_pair(&mut self, pair: SamplePair) {
        let ir_ac = self.ir_dc.step(pair.ir as f64);
        let red_ac = self.red_dc.step(pair.red as f64);

        // The pulse is an absorption dip; mirror it so the detector
        // sees the upstroke as a rising edge.
        let filtered = self.lpf.step(-ir_ac);
        let beat = self.detector.process_sample(filtered, self.clock.now_ms());
        if beat {
            trace!("Beat detected, rate {:.1} bpm", self.detector.rate());
        }

        if self.detector.rate() > 0.0 {
            if self.state != OximeterState::Detecting {
                debug!("Pulse lock acquired at {:.1} bpm", self.detector.rate());
                self.state = OximeterState::Detecting;
            }
            self.spo2.update(ir_ac, red_ac, beat);
        } else if self.state == OximeterState::Detecting {
            debug!("Pulse lock lost, clearing SpO2 window");
            self.state = OximeterState::Idle;
            self.spo2.reset();
        }
    }

    fn check_current_bias(&mut self) -> SensorResult<()> {
        let now = self.clock.now_ms();
        if let Some(last) = self.ts_last_bias_check {
            if now.saturating_sub(last) <= CURRENT_ADJUSTMENT_PERIOD_MS {
                return Ok(());
            }
        }

        let ir_dcw = self.ir_dc.dc_level();
        let red_dcw = self.red_dc.dc_level();

        let mut adjusted = false;
        if ir_dcw - red_dcw > LED_BIAS_DEADBAND && self.red_current < LedCurrent::MAX {
            self.red_current = self.red_current.step_up();
            adjusted = true;
        } else if red_dcw - ir_dcw > LED_BIAS_DEADBAND && self.red_current > LedCurrent::MIN {
            self.red_current = self.red_current.step_down();
            adjusted = true;
        }

        if adjusted {
            self.sensor.set_led_currents(self.ir_current, self.red_current)?;
            debug!("Red LED current stepped to {:.1} mA", self.red_current.milliamps());
        }
        self.ts_last_bias_check = Some(now);
        Ok(())
    }

    /// Smoothed pulse rate in bpm, 0 while no pulse is locked.
    pub fn heart_rate(&self) -> f64 {
        self.detector.rate()
    }

    /// Latest SpO2 estimate in percent, 0 when none is available.
    pub fn spo2(&self) -> u8 {
        self.spo2.spo2()
    }

    /// Beat detector threshold, for tuning and diagnostics.
    pub fn current_threshold(&self) -> f64 {
        self.detector.current_threshold()
    }

    pub fn state(&self) -> OximeterState {
        self.state
    }

    pub fn ir_led_current(&self) -> LedCurrent {
        self.ir_current
    }

    /// Red LED current as last set by the bias controller.
    pub fn red_led_current(&self) -> LedCurrent {
        self.red_current
    }

    /// Overrides the IR LED drive current and reprograms the sensor.
    pub fn set_ir_led_current(&mut self, current: LedCurrent) -> SensorResult<()> {
        self.ir_current = current;
        self.sensor.set_led_currents(self.ir_current, self.red_current)
    }

    /// Puts the sensor into its low-power state.
    pub fn shutdown(&mut self) -> SensorResult<()> {
        self.sensor.shutdown()
    }

    /// Wakes the sensor from shutdown.
    pub fn resume(&mut self) -> SensorResult<()> {
        self.sensor.resume()
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }
}
