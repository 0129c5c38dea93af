//! The TeamRedMiner check: which metrics exist and which rules apply to them.

use std::collections::HashSet;

use crate::source::{MinerStatus, StatusSource};
use crate::{
    CheckError, ConfigError, Direction, EvaluationResult, MetricSample, Report, RuleSet,
    ThresholdRule,
};

pub const REPORT_NAME: &str = "TEAMREDMINER";

pub const HASHRATE: &str = "hashrate";
pub const UPTIME: &str = "uptime";

/// Optional warning and critical bound of one metric family.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub warning: Option<f64>,
    pub critical: Option<f64>,
}

impl Bounds {
    pub fn new(warning: impl Into<Option<f64>>, critical: impl Into<Option<f64>>) -> Self {
        Bounds {
            warning: warning.into(),
            critical: critical.into(),
        }
    }

    fn rule(&self, metric_name: &str, direction: Direction) -> Result<ThresholdRule, ConfigError> {
        ThresholdRule::new(metric_name, self.warning, self.critical, direction)
    }
}

/// The thresholds the check is configured with.
///
/// Hashrate and uptime have no bounds by default and are reported for information only. GPU
/// temperatures default to 70/90 C, memory temperatures to 90/110 C.
#[derive(Clone, Debug, PartialEq)]
pub struct Thresholds {
    pub hashrate: Bounds,
    pub uptime: Bounds,
    pub temperature: Bounds,
    pub memory_temperature: Bounds,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            hashrate: Bounds::default(),
            uptime: Bounds::default(),
            temperature: Bounds::new(70.0, 90.0),
            memory_temperature: Bounds::new(90.0, 110.0),
        }
    }
}

impl Thresholds {
    /// Validates every bound and builds the rules known before talking to the miner.
    pub fn plan(&self) -> Result<CheckPlan, ConfigError> {
        let rules = RuleSet::new()
            .with_rule(self.hashrate.rule(HASHRATE, Direction::BelowIsWorse)?)?
            .with_rule(self.uptime.rule(UPTIME, Direction::BelowIsWorse)?)?;

        Ok(CheckPlan {
            rules,
            alive: ThresholdRule::new("alive", None, 0.0, Direction::BelowIsWorse)?,
            temperature: self
                .temperature
                .rule("temperature", Direction::AboveIsWorse)?,
            memory_temperature: self
                .memory_temperature
                .rule("memory_temperature", Direction::AboveIsWorse)?,
        })
    }
}

/// Validated rules: fixed ones for the miner and templates for every GPU it reports.
#[derive(Clone, Debug)]
pub struct CheckPlan {
    rules: RuleSet,
    alive: ThresholdRule,
    temperature: ThresholdRule,
    memory_temperature: ThresholdRule,
}

impl CheckPlan {
    /// Turns the status into samples and adds a rule for every per-GPU sample.
    pub fn expand(&self, status: &MinerStatus) -> (RuleSet, Vec<MetricSample>) {
        let mut rules = self.rules.clone();
        let mut samples = Vec::new();

        if let Some(hashrate) = status.hashrate {
            samples.push(MetricSample::new(HASHRATE, hashrate, "MH/s"));
        }
        if let Some(uptime) = status.uptime_seconds {
            samples.push(MetricSample::new(UPTIME, uptime, "s"));
        }

        let mut seen = HashSet::new();
        for device in &status.devices {
            if !seen.insert(device.gpu) {
                tracing::warn!(gpu = device.gpu, "GPU reported twice, ignoring duplicate");
                continue;
            }

            let per_gpu = [
                (&self.alive, device.alive.map(|a| if a { 1.0 } else { 0.0 }), ""),
                (&self.temperature, device.temperature, "C"),
                (&self.memory_temperature, device.memory_temperature, "C"),
            ];
            for (template, value, unit) in per_gpu {
                let Some(value) = value else { continue };
                let name = format!("{}_{}", template.metric_name(), device.gpu);

                // names are unique: the fixed rules have no suffix and gpu ids were deduplicated
                if rules.push(template.for_metric(name.as_str())).is_ok() {
                    samples.push(MetricSample::new(name, value, unit));
                }
            }
        }

        (rules, samples)
    }
}

/// Evaluates an already fetched status.
pub fn evaluate_status(
    thresholds: &Thresholds,
    status: &MinerStatus,
) -> Result<EvaluationResult, ConfigError> {
    let (rules, samples) = thresholds.plan()?.expand(status);
    Ok(rules.evaluate(&samples))
}

/// Runs the whole check. Thresholds are validated before the miner is contacted.
pub fn run_check<S>(source: &S, thresholds: &Thresholds) -> Result<Report, CheckError>
where
    S: StatusSource + ?Sized,
{
    let plan = thresholds.plan()?;
    let status = source.fetch_status()?;

    let (rules, samples) = plan.expand(&status);
    tracing::debug!(rules = rules.len(), samples = samples.len(), "evaluating");

    Ok(Report::new(REPORT_NAME).with_evaluation(rules.evaluate(&samples)))
}
