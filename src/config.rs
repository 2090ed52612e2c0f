//! Configuration for the Temper Sanitizer.
//!
//! Settings arrive untyped (JSON file, CLI flags) as [`Settings`] and are
//! validated once into a [`Config`]. Nothing downstream handles unknown
//! statistic, operator or scale names.

use crate::core::criterion::{Comparison, Statistic};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Raw, unvalidated settings as stored on disk or given on the command line.
///
/// Unknown keys are rejected so a misspelled setting can't silently fall
/// back to its default. The camelCase spellings are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Target temperature in the configured scale
    pub target: f64,

    /// Temperature scale name (fahrenheit, f, celcius, c)
    pub scale: String,

    /// Window length in seconds (one sample per second)
    pub interval: u64,

    /// Seconds an interval must be sustained to count as complete
    #[serde(alias = "minTime")]
    pub min_time: u64,

    /// Comparison operator applied as `statistic <op> target`
    #[serde(alias = "compareOp")]
    pub compare_op: String,

    /// Window statistic (min, max, average)
    #[serde(alias = "useStat")]
    pub use_stat: String,

    /// Directory for exported session reports
    pub export_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("temper-sanitizer");

        Self {
            target: 120.0,
            scale: "fahrenheit".to_string(),
            interval: 60,
            min_time: 120 * 60, // 2 hours
            compare_op: ">=".to_string(),
            use_stat: "average".to_string(),
            export_path: data_dir.join("reports"),
        }
    }
}

impl Settings {
    /// Load settings from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from a specific file, falling back to defaults if it
    /// does not exist.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
            let settings: Settings =
                serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
            Ok(settings)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save settings to a specific file.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("temper-sanitizer")
            .join("config.json")
    }
}

/// Temperature scale used for targets, status lines and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Fahrenheit,
    Celsius,
}

impl Scale {
    /// Convert a Celsius reading into this scale.
    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            Scale::Fahrenheit => celsius * 1.8 + 32.0,
            Scale::Celsius => celsius,
        }
    }

    /// Convert a value in this scale back to Celsius.
    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            Scale::Fahrenheit => (value - 32.0) / 1.8,
            Scale::Celsius => value,
        }
    }

    /// Unit suffix for display.
    pub fn symbol(self) -> &'static str {
        match self {
            Scale::Fahrenheit => "°F",
            Scale::Celsius => "°C",
        }
    }
}

impl FromStr for Scale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fahrenheit" | "f" => Ok(Scale::Fahrenheit),
            // "celcius" is the historical spelling accepted by older config files
            "celcius" | "celsius" | "c" => Ok(Scale::Celsius),
            _ => Err(ConfigError::UnknownScale(s.to_string())),
        }
    }
}

/// Validated monitor configuration, read-only for the whole session.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub target: f64,
    pub scale: Scale,
    pub interval_secs: u32,
    pub min_total_secs: u64,
    pub comparison: Comparison,
    pub statistic: Statistic,
    pub export_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: 120.0,
            scale: Scale::Fahrenheit,
            interval_secs: 60,
            min_total_secs: 120 * 60,
            comparison: Comparison::GreaterOrEqual,
            statistic: Statistic::Average,
            export_path: Settings::default().export_path,
        }
    }
}

impl TryFrom<Settings> for Config {
    type Error = ConfigError;

    fn try_from(settings: Settings) -> Result<Self, Self::Error> {
        let statistic: Statistic = settings.use_stat.parse()?;
        let comparison: Comparison = settings.compare_op.parse()?;
        let scale: Scale = settings.scale.parse()?;

        let interval_secs = u32::try_from(settings.interval)
            .ok()
            .filter(|&secs| secs >= 1)
            .ok_or(ConfigError::InvalidInterval(settings.interval))?;

        Ok(Self {
            target: settings.target,
            scale,
            interval_secs,
            min_total_secs: settings.min_time,
            comparison,
            statistic,
            export_path: settings.export_path,
        })
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            target: config.target,
            scale: match config.scale {
                Scale::Fahrenheit => "fahrenheit".to_string(),
                Scale::Celsius => "celcius".to_string(),
            },
            interval: u64::from(config.interval_secs),
            min_time: config.min_total_secs,
            compare_op: config.comparison.symbol().to_string(),
            use_stat: config.statistic.name().to_string(),
            export_path: config.export_path.clone(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    UnknownStatistic(String),
    UnknownComparison(String),
    UnknownScale(String),
    InvalidInterval(u64),
    Io(String),
    Parse(String),
    Serialize(String),
}

impl ConfigError {
    /// Process exit status for this error category.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::UnknownStatistic(_) => 5,
            ConfigError::UnknownComparison(_) => 6,
            ConfigError::UnknownScale(_) => 4,
            ConfigError::InvalidInterval(_) => 3,
            ConfigError::Io(_) | ConfigError::Parse(_) | ConfigError::Serialize(_) => 1,
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownStatistic(s) => {
                write!(f, "Unknown statistic '{s}' (use min, max, or average)")
            }
            ConfigError::UnknownComparison(s) => {
                write!(f, "Unknown comparison '{s}' (use <, <=, >, or >=)")
            }
            ConfigError::UnknownScale(s) => {
                write!(f, "The scale '{s}' is unknown (use fahrenheit or celcius)")
            }
            ConfigError::InvalidInterval(secs) => {
                write!(f, "Interval must be at least 1 second, got {secs}")
            }
            ConfigError::Io(e) => write!(f, "IO error: {e}"),
            ConfigError::Parse(e) => write!(f, "Parse error: {e}"),
            ConfigError::Serialize(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
