//! Linux hwmon temperature sensors.
//!
//! Each `temp*_input` file under `/sys/class/hwmon/hwmon*/` holds the
//! current temperature in millidegrees Celsius.

use super::{SensorError, TemperatureSource};
use std::path::{Path, PathBuf};

/// Default hwmon class directory.
pub const HWMON_ROOT: &str = "/sys/class/hwmon";

/// A discovered temperature input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HwmonSensorInfo {
    /// Path of the `temp*_input` file
    pub path: PathBuf,
    /// Chip name from the `name` file, if any
    pub chip: String,
    /// Channel label from `temp*_label`, if any
    pub label: Option<String>,
}

impl HwmonSensorInfo {
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => format!("{} ({label})", self.chip),
            None => self.chip.clone(),
        }
    }
}

/// A single hwmon temperature input.
#[derive(Debug, Clone)]
pub struct HwmonSensor {
    path: PathBuf,
    name: String,
}

impl HwmonSensor {
    /// Open a specific `temp*_input` file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SensorError> {
        let path = path.into();
        if !path.is_file() {
            return Err(SensorError::NotFound(format!("{} does not exist", path.display())));
        }
        let name = path.display().to_string();
        Ok(Self { path, name })
    }

    /// Open the first readable sensor under the default hwmon root.
    pub fn discover() -> Result<Self, SensorError> {
        Self::discover_in(Path::new(HWMON_ROOT))
    }

    /// Open the first readable sensor under `root`.
    pub fn discover_in(root: &Path) -> Result<Self, SensorError> {
        let info = Self::list_in(root)
            .into_iter()
            .find(|info| read_millidegrees(&info.path).is_ok())
            .ok_or_else(|| {
                SensorError::NotFound(format!("no readable temp*_input under {}", root.display()))
            })?;

        Ok(Self {
            name: info.display_name(),
            path: info.path,
        })
    }

    /// List all temperature inputs under the default hwmon root.
    pub fn list() -> Vec<HwmonSensorInfo> {
        Self::list_in(Path::new(HWMON_ROOT))
    }

    /// List all temperature inputs under `root`, sorted by path.
    pub fn list_in(root: &Path) -> Vec<HwmonSensorInfo> {
        let mut sensors: Vec<HwmonSensorInfo> = std::fs::read_dir(root)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .flat_map(|chip_dir| inputs_of(&chip_dir))
                    .collect()
            })
            .unwrap_or_default();

        sensors.sort_by(|a, b| a.path.cmp(&b.path));
        sensors
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TemperatureSource for HwmonSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_celsius(&mut self) -> Result<f64, SensorError> {
        read_millidegrees(&self.path).map(|milli| milli as f64 / 1000.0)
    }
}

/// Temperature inputs of one hwmon chip directory.
fn inputs_of(chip_dir: &Path) -> Vec<HwmonSensorInfo> {
    let chip = std::fs::read_to_string(chip_dir.join("name"))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| {
            chip_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

    std::fs::read_dir(chip_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| {
                    let file_name = e.file_name().to_string_lossy().into_owned();
                    let channel = file_name
                        .strip_prefix("temp")?
                        .strip_suffix("_input")?
                        .to_string();
                    let label = std::fs::read_to_string(chip_dir.join(format!("temp{channel}_label")))
                        .ok()
                        .map(|s| s.trim().to_string());
                    Some(HwmonSensorInfo {
                        path: e.path(),
                        chip: chip.clone(),
                        label,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn read_millidegrees(path: &Path) -> Result<i64, SensorError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SensorError::Read(format!("{}: {e}", path.display())))?;
    content
        .trim()
        .parse::<i64>()
        .map_err(|e| SensorError::Parse(format!("'{}': {e}", content.trim())))
}
