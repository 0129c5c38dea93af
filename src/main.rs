use std::process;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use check_teamredminer::check::{run_check, Bounds, Thresholds, REPORT_NAME};
use check_teamredminer::config_generator::print_icinga_command_if_requested;
use check_teamredminer::source::{TeamRedMinerApi, DEFAULT_HOST, DEFAULT_PORT};
use check_teamredminer::{CheckError, Runner, ServiceState};

/// Nagios/Icinga check for TeamRedMiner: hashrate, uptime and GPU health.
#[derive(Parser)]
#[command(name = "check_teamredminer", version)]
struct Cli {
    /// Print more output
    #[arg(short, long)]
    verbose: bool,

    /// Print even more output
    #[arg(short, long)]
    debug: bool,

    /// Host address of TeamRedMiner API
    #[arg(long, env = "TEAMREDMINER_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Port of TeamRedMiner API
    #[arg(long, env = "TEAMREDMINER_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Timeout, in seconds, when requesting TeamRedMiner API
    #[arg(
        long,
        env = "TEAMREDMINER_TIMEOUT",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    /// Raise warning if hashrate goes below this threshold
    #[arg(long)]
    hashrate_warning: Option<f64>,

    /// Raise critical if hashrate goes below this threshold
    #[arg(long)]
    hashrate_critical: Option<f64>,

    /// Raise warning if uptime goes below this threshold
    #[arg(long)]
    uptime_warning: Option<f64>,

    /// Raise critical if uptime goes below this threshold
    #[arg(long)]
    uptime_critical: Option<f64>,

    /// Raise warning if temperature goes over this threshold
    #[arg(long, default_value_t = 70.0)]
    temperature_warning: f64,

    /// Raise critical if temperature goes over this threshold
    #[arg(long, default_value_t = 90.0)]
    temperature_critical: f64,

    /// Raise warning if memory temperature goes over this threshold
    #[arg(long, default_value_t = 90.0)]
    memory_temperature_warning: f64,

    /// Raise critical if memory temperature goes over this threshold
    #[arg(long, default_value_t = 110.0)]
    memory_temperature_critical: f64,
}

impl Cli {
    fn thresholds(&self) -> Thresholds {
        Thresholds {
            hashrate: Bounds::new(self.hashrate_warning, self.hashrate_critical),
            uptime: Bounds::new(self.uptime_warning, self.uptime_critical),
            temperature: Bounds::new(self.temperature_warning, self.temperature_critical),
            memory_temperature: Bounds::new(
                self.memory_temperature_warning,
                self.memory_temperature_critical,
            ),
        }
    }

    fn init_tracing(&self) {
        let level = if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        // stdout belongs to the plugin output
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}

/// Exit code for a failed parse. Usage errors are UNKNOWN to nagios, clap would exit with
/// CRITICAL's code. `--help` and `--version` are not failures.
fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        ServiceState::Unknown.exit_code()
    } else {
        0
    }
}

fn main() {
    match print_icinga_command_if_requested("teamredminer", &Cli::command()) {
        Ok(true) => process::exit(0),
        Ok(false) => {}
        Err(err) => {
            eprintln!("failed to generate the Icinga command: {}", err);
            process::exit(ServiceState::Unknown.exit_code());
        }
    }

    let cli = Cli::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        process::exit(usage_exit_code(&err))
    });
    cli.init_tracing();

    let api = TeamRedMinerApi::new(&cli.host, cli.port, Duration::from_secs(cli.timeout));
    let thresholds = cli.thresholds();

    Runner::<CheckError>::new(REPORT_NAME)
        .safe_run(|| run_check(&api, &thresholds))
        .print_and_exit()
}
