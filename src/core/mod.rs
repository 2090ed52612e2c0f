//! Core functionality for the Temper Sanitizer.
//!
//! This module contains:
//! - Window accumulation of raw samples
//! - Criterion evaluation for closed windows
//! - Classification of windows into bake/chill intervals
//! - The monitor that drives all three, and the session report

pub mod classifier;
pub mod criterion;
pub mod monitor;
pub mod report;
pub mod windowing;

// Re-export commonly used types
pub use classifier::{ActiveInterval, Interval, IntervalClassifier, Step, TickOutcome, Transition};
pub use criterion::{Comparison, Criterion, Mode, Statistic};
pub use monitor::{BakeMonitor, MonitorError, StatusSink, WriteSink};
pub use report::{CriterionSummary, EndReason, SessionReport, PRODUCER_NAME};
pub use windowing::{ClosedWindow, SampleWindow};
