//! End-of-session report.
//!
//! Collects the completed and incomplete intervals of a run, renders them
//! as plain-text lines and exports them as JSON.

use crate::config::Scale;
use crate::core::classifier::Interval;
use crate::core::criterion::{Comparison, Mode, Statistic};
use crate::stats::StatsSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The name of this producer.
pub const PRODUCER_NAME: &str = "temper-sanitizer";

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndReason {
    /// An interval reached the minimum time
    Completed,
    /// The user stopped the session
    Interrupted,
    /// The device could not be read
    ReadFailed {
        message: String,
        bake_seconds: u64,
        at: DateTime<Utc>,
    },
}

/// Criterion settings echoed in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionSummary {
    pub statistic: Statistic,
    pub comparison: Comparison,
    pub target: f64,
    pub scale: Scale,
    pub interval_secs: u32,
    pub min_total_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub producer: String,
    pub version: String,
    pub mode: Mode,
    pub criterion: CriterionSummary,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub complete: Vec<Interval>,
    pub incomplete: Vec<Interval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_progress: Option<Interval>,
    pub end_reason: EndReason,
    pub stats: StatsSnapshot,
}

impl SessionReport {
    pub fn is_success(&self) -> bool {
        !self.complete.is_empty()
    }

    /// Plain-text summary, one line per entry.
    pub fn lines(&self) -> Vec<String> {
        let term = self.mode.term_lower();
        let symbol = self.criterion.scale.symbol();
        let mut lines = Vec::new();

        if let EndReason::ReadFailed {
            message,
            bake_seconds,
            at,
        } = &self.end_reason
        {
            lines.push("#Couldn't finish reading temperature.".to_string());
            lines.push(format!("#  The device seems to be disconnected ({message})."));
            lines.push(format!("exit_datetime: {}", at.to_rfc3339()));
            lines.push(format!("exit_{term}_seconds: {bake_seconds}"));
            lines.push(format!("#exit_{term}_minutes: {}", *bake_seconds as f64 / 60.0));
        } else if self.end_reason == EndReason::Interrupted {
            lines.push(format!("#{} interrupted by user.", self.mode.term()));
        }

        lines.push(format!("complete_{term}s: {}", self.complete.len()));
        for (i, interval) in self.complete.iter().enumerate() {
            lines.push(describe(i + 1, interval, symbol));
        }
        lines.push(format!("incomplete_{term}s: {}", self.incomplete.len()));
        for (i, interval) in self.incomplete.iter().enumerate() {
            lines.push(describe(i + 1, interval, symbol));
        }
        if let Some(interval) = &self.in_progress {
            lines.push(format!("#current_{term}:"));
            lines.push(describe(1, interval, symbol));
        }

        lines
    }

    /// Write the report as pretty JSON into `dir`, returning the file path.
    pub fn export(&self, dir: &Path) -> Result<PathBuf, std::io::Error> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "session_{}_{}.json",
            self.finished_at.format("%Y%m%d_%H%M%S"),
            &self.session_id.to_string()[..8]
        ));
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

fn describe(index: usize, interval: &Interval, symbol: &str) -> String {
    let mean = interval
        .mean_temperature()
        .map(|m| format!("{m:.2}{symbol}"))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "#  {index}: {}s ({:.1}m) over {} window(s), mean {mean}, from {} to {}, warmup {}m",
        interval.elapsed_secs,
        interval.elapsed_secs as f64 / 60.0,
        interval.temperatures.len(),
        interval.started_at.format("%H:%M:%S"),
        interval.ended_at.format("%H:%M:%S"),
        interval.warmup_secs as f64 / 60.0,
    )
}
