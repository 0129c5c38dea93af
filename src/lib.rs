//! The check_teamredminer crate implements a nagios/icinga check for the TeamRedMiner API.
//!
//! A check run fetches the miner status once, turns it into [MetricSample]s, evaluates them
//! against a set of [ThresholdRule]s and renders the result in the plugin output format.
//!
//! ```rust
//! # use check_teamredminer::{evaluate_all, Direction, MetricSample, Report, ServiceState, ThresholdRule};
//! let rule = ThresholdRule::new("hashrate", 100.0, 90.0, Direction::BelowIsWorse).unwrap();
//! let sample = MetricSample::new("hashrate", 85.0, "MH/s");
//! let result = evaluate_all(&[rule], &[sample]);
//! assert_eq!(result.overall(), ServiceState::Critical);
//!
//! let report = Report::new("TEAMREDMINER").with_evaluation(result);
//! assert_eq!(
//!     &report.to_nagios_string(),
//!     "TEAMREDMINER CRITICAL: hashrate CRITICAL: 85<=90MH/s | hashrate=85MH/s;100;90"
//! );
//! ```

use std::fmt;

pub mod check;
pub mod config_generator;
mod error;
mod evaluator;
mod metric;
mod report;
mod runner;
pub mod source;
mod threshold;

pub use crate::error::{CheckError, ConfigError, SourceError};
pub use crate::evaluator::{evaluate_all, EvaluationResult, MetricOutcome, RuleSet};
pub use crate::metric::MetricSample;
pub use crate::report::Report;
pub use crate::runner::{Runner, RunnerResult};
pub use crate::threshold::{Direction, Evaluation, ThresholdRule};

/// Represents a service state from nagios.
///
/// The variant order is the aggregation order: `Ok < Warning < Critical < Unknown`. Unknown is
/// the worst outcome since it means a metric could not be evaluated at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceState {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceState {
    /// Returns the corresponding nagios exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }

    /// Folds states into the worst one. An empty input yields Unknown, since nothing was
    /// evaluated.
    pub fn worst_of<I>(states: I) -> ServiceState
    where
        I: IntoIterator<Item = ServiceState>,
    {
        states.into_iter().max().unwrap_or(ServiceState::Unknown)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}
