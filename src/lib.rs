//! Temper Sanitizer - verify that a temperature was held long enough.
//!
//! This library samples a temperature once per second, aggregates the
//! samples into fixed windows, and tracks runs of consecutive windows whose
//! statistic (min, max or average) meets a target. A run that lasts the
//! configured minimum time is a complete *bake* (or *chill*, when the
//! target is a ceiling); a run that breaks early is recorded as incomplete.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Temper Sanitizer                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Sensor    │──▶│  Windowing  │──▶│  Criterion  │       │
//! │  │ (collector) │   │ (N samples) │   │ (min/max/avg)│      │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                              │              │
//! │                                              ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │   Session   │◀────────────────────│ Classifier  │       │
//! │  │   Report    │                     │ (intervals) │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use temper_sanitizer::{BakeMonitor, Config, EndReason, ReplaySensor, TickOutcome, WriteSink};
//!
//! let config = Config::default();
//! let mut monitor = BakeMonitor::new(&config);
//! let mut sensor = ReplaySensor::new(vec![50.0; 7200]);
//! let mut out = WriteSink::stdout();
//!
//! while let Ok(TickOutcome::Continue) = monitor.tick(&mut sensor, &mut out) {}
//! for line in monitor.finish(EndReason::Completed).lines() {
//!     println!("{line}");
//! }
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod sensor;
pub mod stats;

// Re-export key types at crate root for convenience
pub use collector::{Collector, CollectorConfig, CollectorError, Reading};
pub use config::{Config, ConfigError, Scale, Settings};
pub use core::{
    BakeMonitor, Comparison, Criterion, EndReason, Interval, IntervalClassifier, Mode,
    MonitorError, SampleWindow, SessionReport, Statistic, StatusSink, TickOutcome,
    WriteSink,
};
pub use sensor::{HwmonSensor, ReplaySensor, SensorError, SimulatedSensor, TemperatureSource};
pub use stats::{SessionStats, SharedSessionStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shown when no temperature device can be opened.
pub const NO_DEVICE_MESSAGE: &str = r#"
No temperature device found.

The monitor reads Linux hwmon sensors (/sys/class/hwmon/*/temp*_input).
  • List what is available with:   temper-sanitizer devices
  • Pick one explicitly with:      temper-sanitizer run --device <path>
  • Replay a recording with:       temper-sanitizer run --source replay --replay <file>
  • Try it without hardware with:  temper-sanitizer run --source simulated

If the device exists but cannot be read, check its permissions.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_device_message_contents() {
        assert!(NO_DEVICE_MESSAGE.contains("No temperature device found"));
        assert!(NO_DEVICE_MESSAGE.contains("temper-sanitizer devices"));
        assert!(NO_DEVICE_MESSAGE.contains("--source simulated"));
    }
}
