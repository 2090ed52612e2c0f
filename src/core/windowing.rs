//! Fixed-length sample windows.
//!
//! Samples are buffered until the window holds `interval_secs` of them
//! (one sample per second of wall time), then the window is closed and its
//! contents handed to the criterion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The window currently being filled.
#[derive(Debug, Clone, Default)]
pub struct SampleWindow {
    /// Number of samples in the window
    count: u32,
    /// Sum of the samples in the window
    total: f64,
    /// Samples in arrival order
    values: Vec<f64>,
    /// Timestamp of the first sample
    start: Option<DateTime<Utc>>,
    /// Timestamp of the most recent sample
    end: Option<DateTime<Utc>>,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample taken at `timestamp`.
    pub fn add_sample(&mut self, value: f64, timestamp: DateTime<Utc>) {
        self.count += 1;
        self.total += value;
        self.values.push(value);
        self.start.get_or_insert(timestamp);
        self.end = Some(timestamp);
    }

    /// Whether the window has collected a full interval of samples.
    pub fn is_full(&self, interval_secs: u32) -> bool {
        self.count >= interval_secs
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Hand out the buffered samples and reset the window to empty.
    pub fn close_and_reset(&mut self) -> ClosedWindow {
        let taken = std::mem::take(self);
        let now = Utc::now();
        ClosedWindow {
            start: taken.start.unwrap_or(now),
            end: taken.end.unwrap_or(now),
            count: taken.count,
            total: taken.total,
            values: taken.values,
        }
    }
}

/// A window that has been closed and is ready for evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub count: u32,
    pub total: f64,
    pub values: Vec<f64>,
}

impl ClosedWindow {
    /// Mean of the window (`total / count`), or 0 for an empty window.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / f64::from(self.count)
        }
    }

    /// Smallest sample, or `None` for an empty window.
    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    /// Largest sample, or `None` for an empty window.
    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_bookkeeping_invariants_hold_per_sample() {
        let mut window = SampleWindow::new();
        let start = Utc::now();
        let samples = [71.0, 72.5, 69.25, 80.0];

        assert_eq!(window.count() as usize, window.values().len());
        assert_eq!(window.total(), 0.0);

        for (i, &value) in samples.iter().enumerate() {
            window.add_sample(value, start + Duration::seconds(i as i64));
            assert_eq!(window.count() as usize, window.values().len());
            assert_eq!(window.total(), window.values().iter().sum::<f64>());
        }
    }

    #[test]
    fn test_is_full() {
        let mut window = SampleWindow::new();
        let now = Utc::now();
        window.add_sample(1.0, now);
        assert!(!window.is_full(2));
        window.add_sample(2.0, now);
        assert!(window.is_full(2));
        assert!(window.is_full(1));
    }

    #[test]
    fn test_close_and_reset() {
        let mut window = SampleWindow::new();
        let start = Utc::now();
        window.add_sample(10.0, start);
        window.add_sample(20.0, start + Duration::seconds(1));
        window.add_sample(30.0, start + Duration::seconds(2));

        let closed = window.close_and_reset();
        assert_eq!(closed.count, 3);
        assert_eq!(closed.total, 60.0);
        assert_eq!(closed.values, vec![10.0, 20.0, 30.0]);
        assert_eq!(closed.start, start);
        assert_eq!(closed.end, start + Duration::seconds(2));
        assert_eq!(closed.average(), 20.0);
        assert_eq!(closed.min(), Some(10.0));
        assert_eq!(closed.max(), Some(30.0));

        assert!(window.is_empty());
        assert_eq!(window.total(), 0.0);
        assert!(window.values().is_empty());
    }
}
