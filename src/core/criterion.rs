//! Criterion evaluation for a closed window.
//!
//! A window qualifies when its chosen statistic compares favourably against
//! the target. The statistic value that passed the test is returned so the
//! caller records exactly the number that satisfied it.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Statistic computed over the samples of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Minimum,
    Maximum,
    Average,
}

impl Statistic {
    /// Compute the statistic. Returns `None` for an empty slice.
    pub fn compute(self, samples: &[f64]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        let value = match self {
            Statistic::Minimum => samples.iter().copied().fold(f64::INFINITY, f64::min),
            Statistic::Maximum => samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Statistic::Average => samples.iter().sum::<f64>() / samples.len() as f64,
        };
        Some(value)
    }

    /// Canonical configuration name.
    pub fn name(self) -> &'static str {
        match self {
            Statistic::Minimum => "min",
            Statistic::Maximum => "max",
            Statistic::Average => "average",
        }
    }
}

impl FromStr for Statistic {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "min" | "minimum" => Ok(Statistic::Minimum),
            "max" | "maximum" => Ok(Statistic::Maximum),
            "avg" | "average" => Ok(Statistic::Average),
            _ => Err(ConfigError::UnknownStatistic(s.to_string())),
        }
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Comparison operator applied as `operand <op> target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterOrEqual,
}

impl Comparison {
    /// Test `operand <op> target`.
    pub fn holds(self, operand: f64, target: f64) -> bool {
        match self {
            Comparison::Less => operand < target,
            Comparison::LessOrEqual => operand <= target,
            Comparison::Greater => operand > target,
            Comparison::GreaterOrEqual => operand >= target,
        }
    }

    /// The operator that holds exactly when this one does not.
    pub fn opposite(self) -> Self {
        match self {
            Comparison::Less => Comparison::GreaterOrEqual,
            Comparison::LessOrEqual => Comparison::Greater,
            Comparison::Greater => Comparison::LessOrEqual,
            Comparison::GreaterOrEqual => Comparison::Less,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
        }
    }

    /// Whether holding this criterion means heating or cooling.
    pub fn mode(self) -> Mode {
        match self {
            Comparison::Less | Comparison::LessOrEqual => Mode::Chill,
            Comparison::Greater | Comparison::GreaterOrEqual => Mode::Bake,
        }
    }
}

impl FromStr for Comparison {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(Comparison::Less),
            "<=" => Ok(Comparison::LessOrEqual),
            ">" => Ok(Comparison::Greater),
            ">=" => Ok(Comparison::GreaterOrEqual),
            _ => Err(ConfigError::UnknownComparison(s.to_string())),
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Direction of the process being verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Bake,
    Chill,
}

impl Mode {
    /// Capitalized term used in headlines ("Bake", "Chill").
    pub fn term(self) -> &'static str {
        match self {
            Mode::Bake => "Bake",
            Mode::Chill => "Chill",
        }
    }

    /// Lowercase term used inside status lines.
    pub fn term_lower(self) -> &'static str {
        match self {
            Mode::Bake => "bake",
            Mode::Chill => "chill",
        }
    }
}

/// A fully specified criterion: `statistic(window) <comparison> target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Criterion {
    pub statistic: Statistic,
    pub comparison: Comparison,
    pub target: f64,
}

impl Criterion {
    pub fn new(statistic: Statistic, comparison: Comparison, target: f64) -> Self {
        Self {
            statistic,
            comparison,
            target,
        }
    }

    /// Build a criterion from untyped names.
    ///
    /// The statistic is validated before the operator, and each failure maps
    /// to its own error variant.
    pub fn parse(statistic: &str, comparison: &str, target: f64) -> Result<Self, ConfigError> {
        let statistic = statistic.parse()?;
        let comparison = comparison.parse()?;
        Ok(Self::new(statistic, comparison, target))
    }

    /// Evaluate a window.
    ///
    /// Returns the operand when the comparison holds, `None` otherwise (and
    /// for an empty window).
    pub fn evaluate(&self, samples: &[f64]) -> Option<f64> {
        let operand = self.statistic.compute(samples)?;
        self.comparison
            .holds(operand, self.target)
            .then_some(operand)
    }

    /// Render `(<op> <target>) ` for a status line, using the configured
    /// operator when the window qualified and its opposite otherwise.
    pub fn marker(&self, qualified: bool) -> String {
        let op = if qualified {
            self.comparison
        } else {
            self.comparison.opposite()
        };
        format!("({} {}) ", op, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [f64; 3] = [10.0, 20.0, 30.0];

    #[test]
    fn test_average_qualifies() {
        let criterion = Criterion::parse("average", ">=", 15.0).unwrap();
        assert_eq!(criterion.evaluate(&SAMPLES), Some(20.0));
    }

    #[test]
    fn test_min_does_not_qualify() {
        let criterion = Criterion::parse("min", ">=", 15.0).unwrap();
        assert_eq!(criterion.evaluate(&SAMPLES), None);
    }

    #[test]
    fn test_max_does_not_qualify() {
        let criterion = Criterion::parse("max", "<", 25.0).unwrap();
        assert_eq!(criterion.evaluate(&SAMPLES), None);
    }

    #[test]
    fn test_operand_is_the_statistic_that_passed() {
        let criterion = Criterion::parse("maximum", ">", 25.0).unwrap();
        assert_eq!(criterion.evaluate(&SAMPLES), Some(30.0));

        let criterion = Criterion::parse("minimum", "<=", 10.0).unwrap();
        assert_eq!(criterion.evaluate(&SAMPLES), Some(10.0));

        let criterion = Criterion::parse("avg", "<", 20.0).unwrap();
        assert_eq!(criterion.evaluate(&SAMPLES), None);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let criterion = Criterion::parse("average", ">=", 20.0).unwrap();
        let first = criterion.evaluate(&SAMPLES);
        for _ in 0..10 {
            assert_eq!(criterion.evaluate(&SAMPLES), first);
        }
    }

    #[test]
    fn test_empty_window_never_qualifies() {
        let criterion = Criterion::parse("min", "<", 1000.0).unwrap();
        assert_eq!(criterion.evaluate(&[]), None);
    }

    #[test]
    fn test_unknown_names_are_distinct_errors() {
        assert!(matches!(
            Criterion::parse("median", ">=", 0.0),
            Err(ConfigError::UnknownStatistic(_))
        ));
        assert!(matches!(
            Criterion::parse("average", "=>", 0.0),
            Err(ConfigError::UnknownComparison(_))
        ));
    }

    #[test]
    fn test_opposite_operator_table() {
        assert_eq!(Comparison::GreaterOrEqual.opposite(), Comparison::Less);
        assert_eq!(Comparison::Greater.opposite(), Comparison::LessOrEqual);
        assert_eq!(Comparison::LessOrEqual.opposite(), Comparison::Greater);
        assert_eq!(Comparison::Less.opposite(), Comparison::GreaterOrEqual);
    }

    #[test]
    fn test_mode_follows_operator() {
        assert_eq!(Comparison::GreaterOrEqual.mode(), Mode::Bake);
        assert_eq!(Comparison::Greater.mode(), Mode::Bake);
        assert_eq!(Comparison::Less.mode(), Mode::Chill);
        assert_eq!(Comparison::LessOrEqual.mode(), Mode::Chill);
    }

    #[test]
    fn test_marker() {
        let criterion = Criterion::parse("average", ">=", 70.0).unwrap();
        assert_eq!(criterion.marker(true), "(>= 70) ");
        assert_eq!(criterion.marker(false), "(< 70) ");
    }
}
