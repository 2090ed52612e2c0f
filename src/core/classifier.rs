//! Interval classification.
//!
//! Consecutive qualifying windows form an interval. An interval is moved to
//! the completed list on the window where its accumulated time reaches the
//! minimum, and to the incomplete list if a non-qualifying window arrives
//! first. The session is over as soon as one interval has completed.

use crate::core::criterion::Mode;
use crate::core::windowing::ClosedWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A closed bake or chill interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Operand of every qualifying window, in order
    pub temperatures: Vec<f64>,
    /// Accumulated duration in whole windows
    pub elapsed_secs: u64,
    /// Warmup time stamped when the interval was closed
    pub warmup_secs: u64,
    /// Start of the first qualifying window
    pub started_at: DateTime<Utc>,
    /// End of the last qualifying window
    pub ended_at: DateTime<Utc>,
}

impl Interval {
    /// Mean of the recorded operands.
    pub fn mean_temperature(&self) -> Option<f64> {
        if self.temperatures.is_empty() {
            None
        } else {
            Some(self.temperatures.iter().sum::<f64>() / self.temperatures.len() as f64)
        }
    }
}

/// The interval currently accumulating qualifying windows.
///
/// An `ActiveInterval` always holds at least one qualifying window and
/// always has less accumulated time than the minimum; reaching the minimum
/// consumes it (see [`Progress`]).
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveInterval {
    temperatures: Vec<f64>,
    elapsed_secs: u64,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
}

/// Result of extending an active interval by one qualifying window.
enum Progress {
    Pending(ActiveInterval),
    Reached(ActiveInterval),
}

impl ActiveInterval {
    fn open(operand: f64, window: &ClosedWindow, min_total_secs: u64) -> Progress {
        Self {
            temperatures: Vec::new(),
            elapsed_secs: 0,
            started_at: window.start,
            ended_at: window.end,
        }
        .extend(operand, window, min_total_secs)
    }

    fn extend(mut self, operand: f64, window: &ClosedWindow, min_total_secs: u64) -> Progress {
        self.temperatures.push(operand);
        self.elapsed_secs += u64::from(window.count);
        self.ended_at = window.end;
        if self.elapsed_secs >= min_total_secs {
            Progress::Reached(self)
        } else {
            Progress::Pending(self)
        }
    }

    fn close(self, warmup_secs: u64) -> Interval {
        Interval {
            temperatures: self.temperatures,
            elapsed_secs: self.elapsed_secs,
            warmup_secs,
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Snapshot of the in-progress interval for reporting.
    pub fn snapshot(&self, warmup_secs: u64) -> Interval {
        self.clone().close(warmup_secs)
    }
}

/// What a single window did to the classifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No interval active and the window did not qualify
    Idle,
    /// A new interval was opened
    Started,
    /// The active interval absorbed another qualifying window
    Extended,
    /// An interval reached the minimum and was completed
    Completed,
    /// The active interval was broken before reaching the minimum
    Abandoned,
}

/// Whether the session continues after a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    SessionComplete,
}

/// Result of classifying one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub transition: Transition,
    pub outcome: TickOutcome,
}

/// State machine over closed windows.
#[derive(Debug, Clone)]
pub struct IntervalClassifier {
    min_total_secs: u64,
    mode: Mode,
    current: Option<ActiveInterval>,
    completed: Vec<Interval>,
    incomplete: Vec<Interval>,
    warmup_secs: u64,
}

impl IntervalClassifier {
    pub fn new(min_total_secs: u64, mode: Mode) -> Self {
        Self {
            min_total_secs,
            mode,
            current: None,
            completed: Vec::new(),
            incomplete: Vec::new(),
            warmup_secs: 0,
        }
    }

    /// Classify a closed window given the criterion result for it.
    ///
    /// `operand` is `Some` when the window qualified.
    pub fn classify(&mut self, window: &ClosedWindow, operand: Option<f64>) -> Step {
        let transition = match (self.current.take(), operand) {
            (None, None) => Transition::Idle,
            (None, Some(operand)) => {
                match ActiveInterval::open(operand, window, self.min_total_secs) {
                    Progress::Pending(active) => {
                        tracing::debug!("{} started at {}", self.mode.term(), active.started_at);
                        self.current = Some(active);
                        Transition::Started
                    }
                    Progress::Reached(active) => self.complete(active),
                }
            }
            (Some(active), Some(operand)) => {
                match active.extend(operand, window, self.min_total_secs) {
                    Progress::Pending(active) => {
                        self.current = Some(active);
                        Transition::Extended
                    }
                    Progress::Reached(active) => self.complete(active),
                }
            }
            (Some(active), None) => self.abandon(active),
        };

        let outcome = if self.completed.is_empty() {
            TickOutcome::Continue
        } else {
            TickOutcome::SessionComplete
        };

        Step {
            transition,
            outcome,
        }
    }

    fn complete(&mut self, active: ActiveInterval) -> Transition {
        let interval = active.close(self.warmup_secs);
        tracing::info!(
            "{} complete after {}s ({} windows)",
            self.mode.term(),
            interval.elapsed_secs,
            interval.temperatures.len()
        );
        self.completed.push(interval);
        Transition::Completed
    }

    fn abandon(&mut self, active: ActiveInterval) -> Transition {
        if active.elapsed_secs < self.min_total_secs {
            let interval = active.close(self.warmup_secs);
            tracing::info!(
                "{} interrupted after {}s of {}s",
                self.mode.term(),
                interval.elapsed_secs,
                self.min_total_secs
            );
            self.incomplete.push(interval);
            Transition::Abandoned
        } else {
            // Unreachable while `extend` promotes on the threshold window.
            tracing::warn!(
                "Logic error detected: {term} reached {elapsed}s without completing \
                 (appending {term} to complete {term}s anyway); pre{term} minutes: {warmup}",
                term = self.mode.term_lower(),
                elapsed = active.elapsed_secs,
                warmup = self.warmup_secs as f64 / 60.0,
            );
            self.completed.push(active.close(self.warmup_secs));
            Transition::Completed
        }
    }

    pub fn current(&self) -> Option<&ActiveInterval> {
        self.current.as_ref()
    }

    /// Accumulated seconds of the active interval, 0 if none.
    pub fn current_elapsed_secs(&self) -> u64 {
        self.current.as_ref().map_or(0, |a| a.elapsed_secs)
    }

    pub fn completed(&self) -> &[Interval] {
        &self.completed
    }

    pub fn incomplete(&self) -> &[Interval] {
        &self.incomplete
    }

    pub fn warmup_secs(&self) -> u64 {
        self.warmup_secs
    }

    pub fn min_total_secs(&self) -> u64 {
        self.min_total_secs
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Consume the classifier, returning (completed, incomplete, in-progress).
    pub fn into_results(self) -> (Vec<Interval>, Vec<Interval>, Option<Interval>) {
        let in_progress = self.current.map(|a| a.close(self.warmup_secs));
        (self.completed, self.incomplete, in_progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::criterion::{Comparison, Criterion, Statistic};
    use crate::core::windowing::SampleWindow;
    use chrono::Duration;

    fn window_of(samples: &[f64]) -> ClosedWindow {
        let mut window = SampleWindow::new();
        let start = Utc::now();
        for (i, &s) in samples.iter().enumerate() {
            window.add_sample(s, start + Duration::seconds(i as i64));
        }
        window.close_and_reset()
    }

    fn run(
        classifier: &mut IntervalClassifier,
        criterion: &Criterion,
        windows: &[&[f64]],
    ) -> Vec<Step> {
        windows
            .iter()
            .map(|samples| {
                let window = window_of(samples);
                let operand = criterion.evaluate(&window.values);
                classifier.classify(&window, operand)
            })
            .collect()
    }

    #[test]
    fn test_idle_windows_never_create_intervals() {
        let criterion = Criterion::new(Statistic::Average, Comparison::GreaterOrEqual, 70.0);
        let mut classifier = IntervalClassifier::new(4, Mode::Bake);

        for _ in 0..20 {
            let steps = run(&mut classifier, &criterion, &[&[60.0, 61.0]]);
            assert_eq!(steps[0].transition, Transition::Idle);
            assert_eq!(steps[0].outcome, TickOutcome::Continue);
        }
        assert!(classifier.current().is_none());
        assert!(classifier.completed().is_empty());
        assert!(classifier.incomplete().is_empty());
    }

    #[test]
    fn test_promotion_on_threshold_window() {
        // interval=2, minTime=4: windows average 71.5, 73.5, 68.5, 75.5, 77.5
        let criterion = Criterion::new(Statistic::Average, Comparison::GreaterOrEqual, 70.0);
        let mut classifier = IntervalClassifier::new(4, Mode::Bake);

        let steps = run(&mut classifier, &criterion, &[&[71.0, 72.0]]);
        assert_eq!(steps[0].transition, Transition::Started);
        assert_eq!(classifier.current_elapsed_secs(), 2);

        let steps = run(&mut classifier, &criterion, &[&[73.0, 74.0]]);
        assert_eq!(steps[0].transition, Transition::Completed);
        assert_eq!(steps[0].outcome, TickOutcome::SessionComplete);
        assert!(classifier.current().is_none());
        assert_eq!(classifier.completed().len(), 1);
        assert_eq!(classifier.completed()[0].temperatures, vec![71.5, 73.5]);
        assert_eq!(classifier.completed()[0].elapsed_secs, 4);

        let steps = run(&mut classifier, &criterion, &[&[69.0, 68.0]]);
        assert_eq!(steps[0].transition, Transition::Idle);
        assert!(classifier.incomplete().is_empty());

        let steps = run(&mut classifier, &criterion, &[&[75.0, 76.0]]);
        assert_eq!(steps[0].transition, Transition::Started);
        assert_eq!(classifier.current().unwrap().temperatures(), &[75.5]);

        let steps = run(&mut classifier, &criterion, &[&[77.0, 78.0]]);
        assert_eq!(steps[0].transition, Transition::Completed);
        assert_eq!(classifier.completed().len(), 2);
        assert_eq!(classifier.completed()[1].temperatures, vec![75.5, 77.5]);
    }

    #[test]
    fn test_first_window_can_complete() {
        let criterion = Criterion::new(Statistic::Minimum, Comparison::Greater, 100.0);
        let mut classifier = IntervalClassifier::new(3, Mode::Bake);

        let steps = run(&mut classifier, &criterion, &[&[101.0, 102.0, 103.0]]);
        assert_eq!(steps[0].transition, Transition::Completed);
        assert_eq!(steps[0].outcome, TickOutcome::SessionComplete);
        assert_eq!(classifier.completed()[0].temperatures, vec![101.0]);
    }

    #[test]
    fn test_break_before_threshold_is_incomplete() {
        let criterion = Criterion::new(Statistic::Maximum, Comparison::LessOrEqual, 4.0);
        let mut classifier = IntervalClassifier::new(6, Mode::Chill);

        let steps = run(
            &mut classifier,
            &criterion,
            &[&[3.0, 3.5], &[2.0, 4.0], &[4.5, 3.0]],
        );
        let transitions: Vec<Transition> = steps.iter().map(|s| s.transition).collect();
        assert_eq!(
            transitions,
            vec![Transition::Started, Transition::Extended, Transition::Abandoned]
        );
        assert!(steps.iter().all(|s| s.outcome == TickOutcome::Continue));

        assert!(classifier.current().is_none());
        assert!(classifier.completed().is_empty());
        assert_eq!(classifier.incomplete().len(), 1);

        let interval = &classifier.incomplete()[0];
        assert_eq!(interval.temperatures, vec![3.5, 4.0]);
        assert_eq!(interval.elapsed_secs, 4);
        assert_eq!(interval.warmup_secs, 0);
    }

    #[test]
    fn test_active_interval_never_reaches_threshold() {
        let criterion = Criterion::new(Statistic::Average, Comparison::GreaterOrEqual, 50.0);
        let mut classifier = IntervalClassifier::new(10, Mode::Bake);

        for samples in [[55.0, 56.0, 57.0]; 8] {
            let window = window_of(&samples);
            let operand = criterion.evaluate(&window.values);
            classifier.classify(&window, operand);
            if let Some(active) = classifier.current() {
                assert!(active.elapsed_secs() < classifier.min_total_secs());
            }
        }
        assert_eq!(classifier.completed().len(), 2);
        assert!(classifier.incomplete().is_empty());
    }

    #[test]
    fn test_overdue_interval_is_filed_as_completed() {
        let mut classifier = IntervalClassifier::new(4, Mode::Bake);
        let now = Utc::now();
        classifier.current = Some(ActiveInterval {
            temperatures: vec![80.0, 81.0, 82.0],
            elapsed_secs: 6,
            started_at: now,
            ended_at: now,
        });

        let step = classifier.classify(&window_of(&[10.0, 10.0]), None);
        assert_eq!(step.transition, Transition::Completed);
        assert_eq!(step.outcome, TickOutcome::SessionComplete);
        assert!(classifier.current().is_none());
        assert!(classifier.incomplete().is_empty());
        assert_eq!(classifier.completed()[0].elapsed_secs, 6);
    }

    #[test]
    fn test_into_results_includes_in_progress() {
        let criterion = Criterion::new(Statistic::Average, Comparison::GreaterOrEqual, 70.0);
        let mut classifier = IntervalClassifier::new(100, Mode::Bake);
        run(&mut classifier, &criterion, &[&[80.0], &[81.0]]);

        let (completed, incomplete, in_progress) = classifier.into_results();
        assert!(completed.is_empty());
        assert!(incomplete.is_empty());
        let in_progress = in_progress.unwrap();
        assert_eq!(in_progress.elapsed_secs, 2);
        assert_eq!(in_progress.mean_temperature(), Some(80.5));
    }
}
