use std::fmt::Display;
use std::marker::PhantomData;

use crate::{Report, ServiceState};

/// Runs a check and reports its error, if any, as Unknown: a check that could not look at the
/// service has nothing to say about its health.
pub struct Runner<E> {
    name: String,
    _error: PhantomData<E>,
}

impl<E: Display> Runner<E> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            _error: PhantomData,
        }
    }

    pub fn safe_run(self, f: impl FnOnce() -> Result<Report, E>) -> RunnerResult<E> {
        match f() {
            Ok(report) => RunnerResult::Ok(report),
            Err(err) => {
                let state = ServiceState::Unknown;
                tracing::debug!(%state, error = %err, "check failed");
                RunnerResult::Err {
                    name: self.name,
                    state,
                    error: err,
                }
            }
        }
    }
}

pub enum RunnerResult<E> {
    Ok(Report),
    Err {
        name: String,
        state: ServiceState,
        error: E,
    },
}

impl<E: Display> RunnerResult<E> {
    pub fn state(&self) -> ServiceState {
        match self {
            RunnerResult::Ok(report) => report.state(),
            RunnerResult::Err { state, .. } => *state,
        }
    }

    pub fn to_nagios_string(&self) -> String {
        match self {
            RunnerResult::Ok(report) => report.to_nagios_string(),
            RunnerResult::Err { name, state, error } => {
                format!("{} {}: Failed to execute check: {}", name, state, error)
            }
        }
    }

    pub fn print_and_exit(self) -> ! {
        println!("{}", self.to_nagios_string());
        std::process::exit(self.state().exit_code());
    }
}
