//! Temperature reading sources.
//!
//! Every source reports Celsius; conversion to the configured scale
//! happens in the monitor.

pub mod hwmon;
pub mod replay;
pub mod simulated;

pub use hwmon::{HwmonSensor, HwmonSensorInfo};
pub use replay::ReplaySensor;
pub use simulated::SimulatedSensor;

/// A synchronous source of temperature readings.
pub trait TemperatureSource: Send {
    /// Human-readable name of the device.
    fn name(&self) -> &str;

    /// Take one reading in degrees Celsius.
    fn read_celsius(&mut self) -> Result<f64, SensorError>;
}

impl<T: TemperatureSource + ?Sized> TemperatureSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read_celsius(&mut self) -> Result<f64, SensorError> {
        (**self).read_celsius()
    }
}

/// Errors raised by reading sources.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    /// No compatible device was found
    NotFound(String),
    /// The device could not be read
    Read(String),
    /// The device returned something that is not a temperature
    Parse(String),
    /// A replayed recording has no more readings
    Exhausted,
}

impl std::fmt::Display for SensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorError::NotFound(e) => write!(f, "No temperature device found: {e}"),
            SensorError::Read(e) => write!(f, "Read error: {e}"),
            SensorError::Parse(e) => write!(f, "Invalid reading: {e}"),
            SensorError::Exhausted => write!(f, "No more readings available"),
        }
    }
}

impl std::error::Error for SensorError {}
