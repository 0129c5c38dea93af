use std::process;

use crate::{EvaluationResult, MetricOutcome, ServiceState};

/// A Report is what nagios gets to see of a single check run: the overall state, a summary of
/// the problems and the perfdata of every evaluated metric.
///
/// A Report without an evaluation is Unknown.
///
/// ```rust
/// # use check_teamredminer::{Report, ServiceState};
/// let report = Report::new("TEAMREDMINER");
/// assert_eq!(report.state(), ServiceState::Unknown);
/// assert_eq!(&report.to_nagios_string(), "TEAMREDMINER UNKNOWN");
/// ```
pub struct Report {
    name: String,
    evaluation: Option<EvaluationResult>,
}

impl Report {
    pub fn new(name: &str) -> Self {
        Report {
            name: name.to_owned(),
            evaluation: None,
        }
    }

    pub fn with_evaluation(mut self, evaluation: EvaluationResult) -> Self {
        self.evaluation = Some(evaluation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluation(&self) -> Option<&EvaluationResult> {
        self.evaluation.as_ref()
    }

    pub fn state(&self) -> ServiceState {
        self.evaluation
            .as_ref()
            .map_or(ServiceState::Unknown, |e| e.overall())
    }

    /// Returns a string which nagios understands to determine the service state.
    pub fn to_nagios_string(&self) -> String {
        let mut s = format!("{} {}", self.name, self.state());

        let Some(evaluation) = &self.evaluation else {
            return s;
        };

        if !evaluation.messages().is_empty() {
            s.push_str(&format!(": {}", evaluation.messages().join(", ")));
        }

        let perf: Vec<String> = evaluation
            .outcomes()
            .iter()
            .filter_map(perf_string)
            .collect();
        if !perf.is_empty() {
            s.push_str(" | ");
            s.push_str(&perf.join(" "));
        }

        s
    }

    pub fn exit_code(&self) -> i32 {
        self.state().exit_code()
    }

    /// Will print Self::to_nagios_string and exit with the exit code from Self::exit_code
    pub fn print_and_exit(&self) -> ! {
        println!("{}", self.to_nagios_string());
        process::exit(self.exit_code());
    }
}

/// `label=value[unit];[warning];[critical]`, or None if the metric was never reported.
fn perf_string(outcome: &MetricOutcome) -> Option<String> {
    let sample = outcome.sample()?;
    let bound = |b: Option<f64>| b.map(|b| b.to_string()).unwrap_or_default();

    Some(format!(
        "{}={}{};{};{}",
        sample.perf_label(),
        sample.value(),
        sample.unit(),
        bound(outcome.rule().warning()),
        bound(outcome.rule().critical()),
    ))
}

#[cfg(test)]
mod tests {
    use crate::{evaluate_all, Direction, MetricSample, Report, ServiceState, ThresholdRule};

    fn report(rules: &[ThresholdRule], samples: &[MetricSample]) -> Report {
        Report::new("TEAMREDMINER").with_evaluation(evaluate_all(rules, samples))
    }

    #[test]
    fn test_report_ok() {
        let rules = [
            ThresholdRule::new("hashrate", 100.0, 90.0, Direction::BelowIsWorse).unwrap(),
            ThresholdRule::new("uptime", None, None, Direction::BelowIsWorse).unwrap(),
        ];
        let samples = [
            MetricSample::new("hashrate", 150.0, "MH/s"),
            MetricSample::new("uptime", 86400.0, "s"),
        ];
        let report = report(&rules, &samples);

        assert_eq!(report.state(), ServiceState::Ok);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(
            &report.to_nagios_string(),
            "TEAMREDMINER OK | hashrate=150MH/s;100;90 uptime=86400s;;"
        );
    }

    #[test]
    fn test_report_problems() {
        let rules = [
            ThresholdRule::new("hashrate", 100.0, 90.0, Direction::BelowIsWorse).unwrap(),
            ThresholdRule::new("uptime", 600.0, 300.0, Direction::BelowIsWorse).unwrap(),
            ThresholdRule::new("temperature_0", None, 90.0, Direction::AboveIsWorse).unwrap(),
        ];
        let samples = [
            MetricSample::new("hashrate", 85.5, "MH/s"),
            MetricSample::new("uptime", 450.0, "s"),
            MetricSample::new("temperature_0", 64.0, "C"),
        ];
        let report = report(&rules, &samples);

        assert_eq!(report.exit_code(), 2);
        assert_eq!(
            &report.to_nagios_string(),
            "TEAMREDMINER CRITICAL: hashrate CRITICAL: 85.5<=90MH/s, uptime WARNING: 450<=600s \
             | hashrate=85.5MH/s;100;90 uptime=450s;600;300 temperature_0=64C;;90"
        );
    }

    #[test]
    fn test_report_missing_metric() {
        let rules = [
            ThresholdRule::new("hashrate", 100.0, 90.0, Direction::BelowIsWorse).unwrap(),
            ThresholdRule::new("uptime", 600.0, 300.0, Direction::BelowIsWorse).unwrap(),
        ];
        let samples = [MetricSample::new("hashrate", 120.0, "MH/s")];
        let report = report(&rules, &samples);

        assert_eq!(report.exit_code(), 3);
        assert_eq!(
            &report.to_nagios_string(),
            "TEAMREDMINER UNKNOWN: uptime UNKNOWN: metric not reported | hashrate=120MH/s;100;90"
        );
    }

    #[test]
    fn test_report_without_rules() {
        let report = report(&[], &[MetricSample::new("hashrate", 1.0, "MH/s")]);
        assert_eq!(report.exit_code(), 3);
        assert_eq!(&report.to_nagios_string(), "TEAMREDMINER UNKNOWN");
    }

    #[test]
    fn test_report_quotes_labels() {
        let rules = [ThresholdRule::new("gpu 0", None, None, Direction::AboveIsWorse).unwrap()];
        let samples = [MetricSample::new("gpu 0", 1.0, "")];
        assert_eq!(
            &report(&rules, &samples).to_nagios_string(),
            "TEAMREDMINER OK | 'gpu 0'=1;;"
        );
    }
}
