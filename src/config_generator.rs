//! Generates the Icinga2 `CheckCommand` object for a check from its clap definition.
//!
//! ```text
//! GENERATE_ICINGA_COMMAND=1 check_teamredminer
//! ```

use std::path::Path;

pub const GENERATE_ENV_VAR: &str = "GENERATE_ICINGA_COMMAND";

#[derive(Debug, thiserror::Error)]
pub enum IcingaCommandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid executable path")]
    InvalidExecutablePath,
    #[error("argument {0} has no long name")]
    MissingLongArgument(String),
}

/// One command line argument as Icinga sees it.
#[derive(Debug, PartialEq)]
pub struct CommandArgument {
    flag: String,
    var: String,
    description: Option<String>,
    is_switch: bool,
    default_value: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct CheckCommand {
    name: String,
    arguments: Vec<CommandArgument>,
}

impl CheckCommand {
    /// Collects the arguments of `cmd`. Custom variables are named `<name>_<long_arg>`.
    pub fn from_clap(name: &str, cmd: &clap::Command) -> Result<Self, IcingaCommandError> {
        let mut arguments = Vec::new();

        for arg in cmd.get_arguments() {
            let id = arg.get_id().as_str();
            if id == "help" || id == "version" {
                continue;
            }

            let long = arg
                .get_long()
                .ok_or_else(|| IcingaCommandError::MissingLongArgument(id.to_owned()))?;

            arguments.push(CommandArgument {
                flag: format!("--{long}"),
                var: format!("{}_{}", name, long.replace('-', "_")),
                description: arg.get_help().map(|s| s.to_string()),
                is_switch: !arg.get_action().takes_values(),
                default_value: arg
                    .get_default_values()
                    .first()
                    .and_then(|v| v.to_str())
                    .map(|s| s.to_owned()),
            });
        }

        Ok(CheckCommand {
            name: name.to_owned(),
            arguments,
        })
    }

    pub fn render(&self, executable: &Path) -> Result<String, IcingaCommandError> {
        let executable = executable
            .to_str()
            .ok_or(IcingaCommandError::InvalidExecutablePath)?;

        let mut out = format!("object CheckCommand \"{}\" {{\n", self.name);
        out.push_str(&format!("  command = [ \"{}\" ]\n", escape(executable)));
        out.push_str("  arguments = {\n");

        for arg in &self.arguments {
            out.push_str(&format!("    \"{}\" = {{\n", arg.flag));
            if arg.is_switch {
                out.push_str(&format!("      set_if = \"${}$\"\n", arg.var));
            } else {
                out.push_str(&format!("      value = \"${}$\"\n", arg.var));
            }
            if let Some(description) = &arg.description {
                out.push_str(&format!("      description = \"{}\"\n", escape(description)));
            }
            out.push_str("    }\n");
        }
        out.push_str("  }\n");

        let defaults: Vec<_> = self
            .arguments
            .iter()
            .filter_map(|a| a.default_value.as_ref().map(|d| (&a.var, d)))
            .collect();
        if !defaults.is_empty() {
            out.push('\n');
            for (var, default) in defaults {
                out.push_str(&format!("  vars.{} = \"{}\"\n", var, escape(default)));
            }
        }

        out.push_str("}\n");
        Ok(out)
    }
}

/// Escapes a value for an Icinga2 DSL string: quotes get a backslash, `$` is doubled so it is not
/// read as the start of a runtime macro.
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "$$")
}

/// Prints the CheckCommand for the running executable if GENERATE_ICINGA_COMMAND is set.
///
/// Returns whether it printed anything, so the caller can exit instead of running the check.
pub fn print_icinga_command_if_requested(
    name: &str,
    cmd: &clap::Command,
) -> Result<bool, IcingaCommandError> {
    if std::env::var_os(GENERATE_ENV_VAR).is_none() {
        return Ok(false);
    }

    let command = CheckCommand::from_clap(name, cmd)?;
    let out = command.render(&std::env::current_exe()?)?;
    print!("{}", out);
    Ok(true)
}
