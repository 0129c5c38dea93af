use std::collections::HashMap;

use crate::{ConfigError, Evaluation, MetricSample, ServiceState, ThresholdRule};

/// An ordered collection of rules with at most one rule per metric name.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<ThresholdRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        RuleSet::default()
    }

    /// Appends a rule. Rules are evaluated and reported in the order they were pushed.
    pub fn push(&mut self, rule: ThresholdRule) -> Result<(), ConfigError> {
        if self
            .rules
            .iter()
            .any(|r| r.metric_name() == rule.metric_name())
        {
            return Err(ConfigError::DuplicateRule(rule.metric_name().to_owned()));
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn with_rule(mut self, rule: ThresholdRule) -> Result<Self, ConfigError> {
        self.push(rule)?;
        Ok(self)
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn evaluate(&self, samples: &[MetricSample]) -> EvaluationResult {
        evaluate_all(&self.rules, samples)
    }
}

/// The result of one rule: the rule itself, the sample it matched (if the metric was reported)
/// and the evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricOutcome {
    rule: ThresholdRule,
    sample: Option<MetricSample>,
    evaluation: Evaluation,
}

impl MetricOutcome {
    pub fn rule(&self) -> &ThresholdRule {
        &self.rule
    }

    pub fn sample(&self) -> Option<&MetricSample> {
        self.sample.as_ref()
    }

    pub fn name(&self) -> &str {
        self.rule.metric_name()
    }

    pub fn state(&self) -> ServiceState {
        self.evaluation.state()
    }

    pub fn message(&self) -> &str {
        self.evaluation.message()
    }
}

/// Everything one check run found out, in rule order.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationResult {
    outcomes: Vec<MetricOutcome>,
    overall: ServiceState,
    messages: Vec<String>,
}

impl EvaluationResult {
    pub fn outcomes(&self) -> &[MetricOutcome] {
        &self.outcomes
    }

    /// The worst state over all metrics, Unknown if there were no rules.
    pub fn overall(&self) -> ServiceState {
        self.overall
    }

    /// Messages of all metrics that are not Ok, in rule order.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn per_metric(&self) -> HashMap<&str, ServiceState> {
        self.outcomes.iter().map(|o| (o.name(), o.state())).collect()
    }

    pub fn state_of(&self, metric_name: &str) -> Option<ServiceState> {
        self.outcomes
            .iter()
            .find(|o| o.name() == metric_name)
            .map(|o| o.state())
    }
}

/// Applies every rule to the sample of the same name and aggregates the worst state.
///
/// A rule whose metric is missing from `samples` evaluates to Unknown; the other rules are
/// still evaluated. Samples without a rule are ignored.
pub fn evaluate_all(rules: &[ThresholdRule], samples: &[MetricSample]) -> EvaluationResult {
    let mut by_name: HashMap<&str, &MetricSample> = HashMap::with_capacity(samples.len());
    for sample in samples {
        by_name.entry(sample.name()).or_insert(sample);
    }

    let outcomes: Vec<MetricOutcome> = rules
        .iter()
        .map(|rule| {
            let sample = by_name.get(rule.metric_name()).copied();
            let evaluation = match sample {
                Some(sample) => rule.evaluate_matched(sample),
                None => Evaluation::unknown(format!(
                    "{} {}: metric not reported",
                    rule.metric_name(),
                    ServiceState::Unknown
                )),
            };
            tracing::debug!(
                metric = rule.metric_name(),
                state = %evaluation.state(),
                "{}",
                evaluation.message()
            );

            MetricOutcome {
                rule: rule.clone(),
                sample: sample.cloned(),
                evaluation,
            }
        })
        .collect();

    let overall = ServiceState::worst_of(outcomes.iter().map(|o| o.state()));
    let messages = outcomes
        .iter()
        .filter(|o| o.state() != ServiceState::Ok)
        .map(|o| o.message().to_owned())
        .collect();

    EvaluationResult {
        outcomes,
        overall,
        messages,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        evaluate_all, ConfigError, Direction, MetricSample, RuleSet, ServiceState, ThresholdRule,
    };

    fn hashrate_rule() -> ThresholdRule {
        ThresholdRule::new("hashrate", 100.0, 90.0, Direction::BelowIsWorse).unwrap()
    }

    fn uptime_rule() -> ThresholdRule {
        ThresholdRule::new("uptime", 600.0, 300.0, Direction::BelowIsWorse).unwrap()
    }

    fn temperature_rule() -> ThresholdRule {
        ThresholdRule::new("temperature_0", 70.0, 90.0, Direction::AboveIsWorse).unwrap()
    }

    fn samples() -> Vec<MetricSample> {
        vec![
            MetricSample::new("hashrate", 85.0, "MH/s"),
            MetricSample::new("uptime", 450.0, "s"),
            MetricSample::new("temperature_0", 65.0, "C"),
        ]
    }

    #[test]
    fn test_empty_rules() {
        let result = evaluate_all(&[], &samples());
        assert_eq!(result.overall(), ServiceState::Unknown);
        assert!(result.per_metric().is_empty());
        assert!(result.messages().is_empty());
    }

    #[test]
    fn test_aggregation() {
        let rules = [hashrate_rule(), uptime_rule(), temperature_rule()];
        let result = evaluate_all(&rules, &samples());

        assert_eq!(result.overall(), ServiceState::Critical);
        assert_eq!(result.state_of("hashrate"), Some(ServiceState::Critical));
        assert_eq!(result.state_of("uptime"), Some(ServiceState::Warning));
        assert_eq!(result.state_of("temperature_0"), Some(ServiceState::Ok));
        assert_eq!(result.state_of("nope"), None);
        assert_eq!(
            result.messages(),
            &[
                "hashrate CRITICAL: 85<=90MH/s".to_owned(),
                "uptime WARNING: 450<=600s".to_owned(),
            ]
        );
    }

    #[test]
    fn test_overall_ignores_rule_order() {
        let rules = [hashrate_rule(), uptime_rule(), temperature_rule()];
        let forward = evaluate_all(&rules, &samples());

        let reversed: Vec<ThresholdRule> = rules.iter().rev().cloned().collect();
        let backward = evaluate_all(&reversed, &samples());

        assert_eq!(forward.overall(), backward.overall());
        assert_eq!(forward.per_metric(), backward.per_metric());
        assert_eq!(
            backward.messages(),
            &[
                "uptime WARNING: 450<=600s".to_owned(),
                "hashrate CRITICAL: 85<=90MH/s".to_owned(),
            ]
        );
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let rules = [temperature_rule(), uptime_rule(), hashrate_rule()];
        let first = evaluate_all(&rules, &samples());
        let second = evaluate_all(&rules, &samples());
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_metric_is_unknown() {
        let rules = [hashrate_rule(), uptime_rule()];
        let samples = [MetricSample::new("hashrate", 85.0, "MH/s")];
        let result = evaluate_all(&rules, &samples);

        assert_eq!(result.state_of("hashrate"), Some(ServiceState::Critical));
        assert_eq!(result.state_of("uptime"), Some(ServiceState::Unknown));
        assert_eq!(result.overall(), ServiceState::Unknown);
        assert_eq!(
            result.messages(),
            &[
                "hashrate CRITICAL: 85<=90MH/s".to_owned(),
                "uptime UNKNOWN: metric not reported".to_owned(),
            ]
        );
        assert!(result.outcomes()[1].sample().is_none());
    }

    #[test]
    fn test_missing_metric_without_bounds_is_unknown() {
        let rules = [ThresholdRule::new("uptime", None, None, Direction::BelowIsWorse).unwrap()];
        let result = evaluate_all(&rules, &[]);
        assert_eq!(result.overall(), ServiceState::Unknown);
    }

    #[test]
    fn test_unreferenced_samples_are_ignored() {
        let result = evaluate_all(&[uptime_rule()], &samples());
        assert_eq!(result.outcomes().len(), 1);
        assert_eq!(result.overall(), ServiceState::Warning);
    }

    #[test]
    fn test_rule_set() {
        let rules = RuleSet::new()
            .with_rule(hashrate_rule())
            .and_then(|r| r.with_rule(uptime_rule()))
            .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.evaluate(&samples()).overall(), ServiceState::Critical);

        let err = rules.with_rule(hashrate_rule()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRule(name) if name == "hashrate"));
    }
}
