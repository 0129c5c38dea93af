/// A single observed value of one metric within one check run.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricSample {
    name: String,
    value: f64,
    unit: String,
}

impl MetricSample {
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        MetricSample {
            name: name.into(),
            value,
            unit: unit.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// The label as it may appear in the perfdata section.
    pub(crate) fn perf_label(&self) -> String {
        // replace `=`
        let label = self.name.replace('=', "_");

        // quote `'`
        let label = label.replace('\'', "''");

        // quote if contains spaces
        if label.contains(' ') {
            format!("'{}'", label)
        } else {
            label
        }
    }
}
