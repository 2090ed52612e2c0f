//! The sampling loop driver.
//!
//! Feeds readings into the current window and, each time a window fills,
//! evaluates the criterion, advances the interval classifier and emits a
//! status line.

use crate::config::{Config, Scale};
use crate::core::classifier::{IntervalClassifier, TickOutcome, Transition};
use crate::core::criterion::{Criterion, Mode, Statistic};
use crate::core::report::{CriterionSummary, EndReason, SessionReport, PRODUCER_NAME};
use crate::core::windowing::{ClosedWindow, SampleWindow};
use crate::sensor::{SensorError, TemperatureSource};
use crate::stats::{create_shared_stats, SharedSessionStats};
use chrono::{DateTime, Utc};
use std::io::Write;
use uuid::Uuid;

/// Receives the printable lines produced by the monitor.
pub trait StatusSink {
    fn emit(&mut self, line: &str);
}

impl StatusSink for Vec<String> {
    fn emit(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Writes status lines to any `Write`, flushing after each line.
///
/// A failed write is logged once and remembered. Later lines are still
/// attempted so a transient error doesn't silence the rest of the session.
pub struct WriteSink<W: Write> {
    writer: W,
    failed: bool,
}

impl WriteSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> WriteSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failed: false,
        }
    }

    /// Whether any line failed to be written.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StatusSink for WriteSink<W> {
    fn emit(&mut self, line: &str) {
        let result = writeln!(self.writer, "{line}").and_then(|_| self.writer.flush());
        if let Err(e) = result {
            if !self.failed {
                tracing::warn!("Could not write status line: {e}");
            }
            self.failed = true;
        }
    }
}

/// Errors that end a monitoring session.
#[derive(Debug)]
pub enum MonitorError {
    /// The device failed mid-session
    ReadFailed {
        source: SensorError,
        /// Accumulated seconds of the interval in progress
        bake_seconds: u64,
        at: DateTime<Utc>,
    },
}

impl std::fmt::Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorError::ReadFailed {
                source,
                bake_seconds,
                at,
            } => write!(
                f,
                "Couldn't finish reading temperature at {} after {bake_seconds}s of the current interval: {source}",
                at.to_rfc3339()
            ),
        }
    }
}

impl MonitorError {
    /// How this error ends the session in the report.
    pub fn end_reason(&self) -> EndReason {
        match self {
            MonitorError::ReadFailed {
                source,
                bake_seconds,
                at,
            } => EndReason::ReadFailed {
                message: source.to_string(),
                bake_seconds: *bake_seconds,
                at: *at,
            },
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::ReadFailed { source, .. } => Some(source),
        }
    }
}

/// Drives one monitoring session.
pub struct BakeMonitor {
    criterion: Criterion,
    scale: Scale,
    interval_secs: u32,
    window: SampleWindow,
    classifier: IntervalClassifier,
    stats: SharedSessionStats,
    session_id: Uuid,
    started_at: DateTime<Utc>,
}

impl BakeMonitor {
    pub fn new(config: &Config) -> Self {
        Self::with_stats(config, create_shared_stats())
    }

    /// Create a monitor that records into existing statistics.
    pub fn with_stats(config: &Config, stats: SharedSessionStats) -> Self {
        let criterion = Criterion::new(config.statistic, config.comparison, config.target);
        let mode = config.comparison.mode();

        if mode == Mode::Chill && config.statistic == Statistic::Maximum {
            tracing::warn!(
                "Using min or average is recommended for chill, but you selected {}",
                config.statistic
            );
        }

        Self {
            criterion,
            scale: config.scale,
            interval_secs: config.interval_secs,
            window: SampleWindow::new(),
            classifier: IntervalClassifier::new(config.min_total_secs, mode),
            stats,
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    /// Take one reading from `source` and process it.
    pub fn tick<S, O>(&mut self, source: &mut S, sink: &mut O) -> Result<TickOutcome, MonitorError>
    where
        S: TemperatureSource + ?Sized,
        O: StatusSink + ?Sized,
    {
        let celsius = source
            .read_celsius()
            .map_err(|e| self.read_failed(e, Utc::now()))?;
        Ok(self.feed(celsius, Utc::now(), sink))
    }

    /// Process a reading that was already taken.
    pub fn feed<O>(&mut self, celsius: f64, timestamp: DateTime<Utc>, sink: &mut O) -> TickOutcome
    where
        O: StatusSink + ?Sized,
    {
        self.stats.record_sample();
        self.window
            .add_sample(self.scale.from_celsius(celsius), timestamp);

        if !self.window.is_full(self.interval_secs) {
            return TickOutcome::Continue;
        }

        let closed = self.window.close_and_reset();
        let operand = self.criterion.evaluate(&closed.values);
        let step = self.classifier.classify(&closed, operand);

        self.stats.record_window(operand.is_some());
        match step.transition {
            Transition::Completed => self.stats.record_interval_completed(),
            Transition::Abandoned => self.stats.record_interval_incomplete(),
            Transition::Idle | Transition::Started | Transition::Extended => {}
        }

        tracing::debug!(
            "Window closed: {} samples, operand {:?}, transition {:?}",
            closed.count,
            operand,
            step.transition
        );
        sink.emit(&self.status_line(&closed, operand.is_some()));

        if step.outcome == TickOutcome::SessionComplete {
            sink.emit(&format!("#{} is finished: ", self.mode().term()));
        }
        step.outcome
    }

    /// Build the error for a failed read, capturing the interval progress.
    pub fn read_failed(&self, source: SensorError, at: DateTime<Utc>) -> MonitorError {
        MonitorError::ReadFailed {
            source,
            bake_seconds: self.classifier.current_elapsed_secs(),
            at,
        }
    }

    fn status_line(&self, window: &ClosedWindow, qualified: bool) -> String {
        let progress = match self.classifier.current() {
            Some(active) if active.elapsed_secs() > 0 => {
                let remaining =
                    self.classifier.min_total_secs() as f64 - active.elapsed_secs() as f64;
                format!("  # remaining:{}m", remaining / 60.0)
            }
            _ => format!(
                "  # pre{}_mins:{}",
                self.mode().term_lower(),
                self.classifier.warmup_secs() as f64 / 60.0
            ),
        };
        let min = window.min().unwrap_or(f64::NAN);

        format!(
            "#{}Last {} second(s) avg:{}; min:{}{}",
            self.criterion.marker(qualified),
            window.count,
            window.average(),
            min,
            progress
        )
    }

    pub fn mode(&self) -> Mode {
        self.classifier.mode()
    }

    pub fn classifier(&self) -> &IntervalClassifier {
        &self.classifier
    }

    pub fn stats(&self) -> &SharedSessionStats {
        &self.stats
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn is_complete(&self) -> bool {
        !self.classifier.completed().is_empty()
    }

    /// End the session and build its report.
    pub fn finish(self, end_reason: EndReason) -> SessionReport {
        let mode = self.mode();
        let criterion = CriterionSummary {
            statistic: self.criterion.statistic,
            comparison: self.criterion.comparison,
            target: self.criterion.target,
            scale: self.scale,
            interval_secs: self.interval_secs,
            min_total_secs: self.classifier.min_total_secs(),
        };
        let stats = self.stats.snapshot();
        let (complete, incomplete, in_progress) = self.classifier.into_results();

        SessionReport {
            session_id: self.session_id,
            producer: PRODUCER_NAME.to_string(),
            version: crate::VERSION.to_string(),
            mode,
            criterion,
            started_at: self.started_at,
            finished_at: Utc::now(),
            complete,
            incomplete,
            in_progress,
            end_reason,
            stats,
        }
    }
}
