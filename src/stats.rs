//! Session statistics.
//!
//! Counters for what the monitor has processed during the current run.
//! Nothing is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub struct SessionStats {
    /// Number of samples fed to the monitor
    samples: AtomicU64,
    /// Number of windows closed
    windows_closed: AtomicU64,
    /// Number of windows that met the criterion
    qualifying_windows: AtomicU64,
    /// Number of intervals that reached the minimum time
    intervals_completed: AtomicU64,
    /// Number of intervals broken before the minimum time
    intervals_incomplete: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            samples: AtomicU64::new(0),
            windows_closed: AtomicU64::new(0),
            qualifying_windows: AtomicU64::new(0),
            intervals_completed: AtomicU64::new(0),
            intervals_incomplete: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn record_sample(&self) {
        self.samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed window and whether it qualified.
    pub fn record_window(&self, qualified: bool) {
        self.windows_closed.fetch_add(1, Ordering::Relaxed);
        if qualified {
            self.qualifying_windows.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_interval_completed(&self) {
        self.intervals_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_interval_incomplete(&self) {
        self.intervals_incomplete.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples: self.samples.load(Ordering::Relaxed),
            windows_closed: self.windows_closed.load(Ordering::Relaxed),
            qualifying_windows: self.qualifying_windows.load(Ordering::Relaxed),
            intervals_completed: self.intervals_completed.load(Ordering::Relaxed),
            intervals_incomplete: self.intervals_incomplete.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Samples read: {}\n\
             - Windows closed: {}\n\
             - Qualifying windows: {}\n\
             - Intervals completed: {}\n\
             - Intervals incomplete: {}\n\
             - Session duration: {} seconds",
            stats.samples,
            stats.windows_closed,
            stats.qualifying_windows,
            stats.intervals_completed,
            stats.intervals_incomplete,
            stats.session_duration_secs
        )
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub samples: u64,
    pub windows_closed: u64,
    pub qualifying_windows: u64,
    pub intervals_completed: u64,
    pub intervals_incomplete: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared statistics.
pub type SharedSessionStats = Arc<SessionStats>;

pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = SessionStats::new();
        stats.record_sample();
        stats.record_sample();
        stats.record_window(true);
        stats.record_window(false);
        stats.record_interval_incomplete();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.samples, 2);
        assert_eq!(snapshot.windows_closed, 2);
        assert_eq!(snapshot.qualifying_windows, 1);
        assert_eq!(snapshot.intervals_completed, 0);
        assert_eq!(snapshot.intervals_incomplete, 1);
    }

    #[test]
    fn test_summary_format() {
        let stats = create_shared_stats();
        let summary = stats.summary();

        assert!(summary.contains("Samples read: 0"));
        assert!(summary.contains("Windows closed"));
        assert!(summary.contains("Intervals completed"));
    }
}
