//! Replay of recorded readings.

use super::{SensorError, TemperatureSource};
use std::collections::VecDeque;
use std::path::Path;

/// Replays a fixed sequence of Celsius readings, then reports
/// [`SensorError::Exhausted`].
#[derive(Debug, Clone)]
pub struct ReplaySensor {
    name: String,
    readings: VecDeque<f64>,
}

impl ReplaySensor {
    pub fn new(readings: impl IntoIterator<Item = f64>) -> Self {
        Self {
            name: "replay".to_string(),
            readings: readings.into_iter().collect(),
        }
    }

    /// Load readings from a text file, one value per line.
    ///
    /// Blank lines and lines starting with `#` are skipped. Values are
    /// interpreted in `unit`, so a Fahrenheit recording can be replayed
    /// as-is.
    pub fn from_file(path: &Path, unit: crate::config::Scale) -> Result<Self, SensorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SensorError::NotFound(format!("{}: {e}", path.display())))?;

        let readings = content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .map(|(line_no, line)| {
                line.parse::<f64>()
                    .map(|value| unit.to_celsius(value))
                    .map_err(|e| SensorError::Parse(format!("line {line_no}: '{line}': {e}")))
            })
            .collect::<Result<VecDeque<f64>, SensorError>>()?;

        Ok(Self {
            name: path.display().to_string(),
            readings,
        })
    }

    /// Number of readings left to replay.
    pub fn remaining(&self) -> usize {
        self.readings.len()
    }
}

impl TemperatureSource for ReplaySensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_celsius(&mut self) -> Result<f64, SensorError> {
        self.readings.pop_front().ok_or(SensorError::Exhausted)
    }
}
