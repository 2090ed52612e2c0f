//! Emulated temperature device.
//!
//! Approaches a setpoint exponentially from an ambient start, with a small
//! periodic ripple so windows do not all look the same. Deterministic: the
//! n-th reading depends only on n and the parameters.

use super::{SensorError, TemperatureSource};

#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    ambient: f64,
    setpoint: f64,
    /// Readings needed to close ~63% of the gap to the setpoint
    time_constant: f64,
    ripple: f64,
    step: u64,
}

impl SimulatedSensor {
    pub fn new(ambient: f64, setpoint: f64) -> Self {
        Self {
            ambient,
            setpoint,
            time_constant: 30.0,
            ripple: 0.5,
            step: 0,
        }
    }

    pub fn with_time_constant(mut self, readings: f64) -> Self {
        self.time_constant = readings.max(f64::EPSILON);
        self
    }

    pub fn with_ripple(mut self, amplitude: f64) -> Self {
        self.ripple = amplitude.abs();
        self
    }

    fn value_at(&self, step: u64) -> f64 {
        let t = step as f64;
        let approach = 1.0 - (-t / self.time_constant).exp();
        let base = self.ambient + (self.setpoint - self.ambient) * approach;
        base + self.ripple * (t / 7.0).sin()
    }
}

impl TemperatureSource for SimulatedSensor {
    fn name(&self) -> &str {
        "simulated"
    }

    fn read_celsius(&mut self) -> Result<f64, SensorError> {
        let value = self.value_at(self.step);
        self.step += 1;
        Ok(value)
    }
}
