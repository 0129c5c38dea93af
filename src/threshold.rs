use std::fmt;

use crate::{ConfigError, MetricSample, ServiceState};

/// Which side of a bound is the bad one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Values at or above a bound breach it, e.g. temperatures.
    AboveIsWorse,
    /// Values at or below a bound breach it, e.g. hashrate or uptime.
    BelowIsWorse,
}

impl Direction {
    fn breaches(&self, value: f64, bound: f64) -> bool {
        match self {
            Direction::AboveIsWorse => value >= bound,
            Direction::BelowIsWorse => value <= bound,
        }
    }

    /// Whether `a` is strictly worse than `b`.
    fn is_worse(&self, a: f64, b: f64) -> bool {
        match self {
            Direction::AboveIsWorse => a > b,
            Direction::BelowIsWorse => a < b,
        }
    }

    fn operator(&self) -> &'static str {
        match self {
            Direction::AboveIsWorse => ">=",
            Direction::BelowIsWorse => "<=",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::AboveIsWorse => f.write_str("higher is worse"),
            Direction::BelowIsWorse => f.write_str("lower is worse"),
        }
    }
}

/// Warning and critical bounds for one metric.
///
/// A rule without any bound is informational only and always evaluates to Ok.
///
/// ```rust
/// # use check_teamredminer::{Direction, MetricSample, ServiceState, ThresholdRule};
/// let rule = ThresholdRule::new("temperature_0", 70.0, 90.0, Direction::AboveIsWorse).unwrap();
/// let evaluation = rule.evaluate(&MetricSample::new("temperature_0", 75.0, "C")).unwrap();
/// assert_eq!(evaluation.state(), ServiceState::Warning);
/// assert_eq!(evaluation.message(), "temperature_0 WARNING: 75>=70C");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdRule {
    metric_name: String,
    warning: Option<f64>,
    critical: Option<f64>,
    direction: Direction,
}

impl ThresholdRule {
    /// Creates a rule, validating that both bounds are finite and that critical is strictly worse
    /// than warning when both are given.
    pub fn new(
        metric_name: impl Into<String>,
        warning: impl Into<Option<f64>>,
        critical: impl Into<Option<f64>>,
        direction: Direction,
    ) -> Result<Self, ConfigError> {
        let metric_name = metric_name.into();
        let warning = warning.into();
        let critical = critical.into();

        for (kind, bound) in [("warning", warning), ("critical", critical)] {
            if bound.map_or(false, |b| !b.is_finite()) {
                return Err(ConfigError::NonFiniteBound {
                    metric: metric_name,
                    kind,
                });
            }
        }

        if let (Some(warning), Some(critical)) = (warning, critical) {
            if !direction.is_worse(critical, warning) {
                return Err(ConfigError::InvertedBounds {
                    metric: metric_name,
                    warning,
                    critical,
                    direction,
                });
            }
        }

        Ok(ThresholdRule {
            metric_name,
            warning,
            critical,
            direction,
        })
    }

    /// The same bounds and direction, applied to another metric.
    pub fn for_metric(&self, metric_name: impl Into<String>) -> ThresholdRule {
        ThresholdRule {
            metric_name: metric_name.into(),
            ..self.clone()
        }
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    pub fn warning(&self) -> Option<f64> {
        self.warning
    }

    pub fn critical(&self) -> Option<f64> {
        self.critical
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Evaluates the sample against this rule. Bounds are inclusive: a value exactly at a bound
    /// already breaches it.
    pub fn evaluate(&self, sample: &MetricSample) -> Result<Evaluation, ConfigError> {
        if sample.name() != self.metric_name {
            return Err(ConfigError::MetricMismatch {
                rule: self.metric_name.clone(),
                sample: sample.name().to_owned(),
            });
        }

        Ok(self.evaluate_matched(sample))
    }

    /// Evaluates a sample already known to carry this rule's metric name.
    pub(crate) fn evaluate_matched(&self, sample: &MetricSample) -> Evaluation {
        let breached = [
            (ServiceState::Critical, self.critical),
            (ServiceState::Warning, self.warning),
        ]
        .into_iter()
        .find_map(|(state, bound)| {
            bound
                .filter(|b| self.direction.breaches(sample.value(), *b))
                .map(|b| (state, b))
        });

        match breached {
            Some((state, bound)) => Evaluation {
                state,
                message: format!(
                    "{} {}: {}{}{}{}",
                    sample.name(),
                    state,
                    sample.value(),
                    self.direction.operator(),
                    bound,
                    sample.unit()
                ),
            },
            None => Evaluation {
                state: ServiceState::Ok,
                message: format!(
                    "{} {}: {}{}",
                    sample.name(),
                    ServiceState::Ok,
                    sample.value(),
                    sample.unit()
                ),
            },
        }
    }
}

/// The outcome of evaluating one sample against its rule.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    state: ServiceState,
    message: String,
}

impl Evaluation {
    pub(crate) fn unknown(message: String) -> Self {
        Evaluation {
            state: ServiceState::Unknown,
            message,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
