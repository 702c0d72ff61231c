//! Simulated pulse oximeter monitor
//!
//! Runs the full pipeline over a synthetic subject and prints the
//! readouts as they stabilize.
//!
//! Run with: cargo run --example monitor -p pulsox-sim

use pulsox_core::prelude::*;
use pulsox_sim::{PpgWaveformConfig, SimSensor};

fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let clock = ManualClock::new();
    let config = PpgWaveformConfig::with_vitals(72.0, 97.0);
    let sensor = SimSensor::new(config, clock.clone());
    let mut ox = PulseOximeter::new(sensor, clock.clone());

    ox.initialize().expect("simulated sensor configures");

    // Thirty simulated seconds, polled at the acquisition rate.
    for tick in 0..3_000u64 {
        ox.update().expect("simulated sensor does not fault");
        clock.advance(10);

        if tick % 100 == 0 {
            let rate = ox.heart_rate();
            let spo2 = ox.spo2();
            if rate > 1.0 {
                print!("t={:6} ms  pulse {:5.1} bpm", clock.now_ms(), rate);
                if spo2 > 0 {
                    print!("  SpO2 {spo2:3}%");
                }
                println!();
            }
        }
    }

    println!(
        "final readout: {:.1} bpm, SpO2 {}%, red LED at {:.1} mA",
        ox.heart_rate(),
        ox.spo2(),
        ox.red_led_current().milliamps()
    );
}
