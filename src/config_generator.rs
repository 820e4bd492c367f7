//! Icinga2 `CheckCommand` generation from a clap command definition.

use clap::ArgAction;

/// Environment variable that switches a plugin into command generation mode.
pub const GENERATE_ENV: &str = "GENERATE_ICINGA_COMMAND";

pub struct CommandDescription {
    arguments: Vec<ArgumentDescription>,
}

pub struct ArgumentDescription {
    name: String,
    value: String,
    description: Option<String>,
    is_flag: bool,
    default_value: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ToIcingaCommandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid executable path")]
    InvalidExecutablePath,
    #[error("error converting to command description: {0}")]
    CommandDescriptionFromError(#[from] CommandDescriptionFromError),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandDescriptionFromError {
    #[error("argument `{0}` has no long name")]
    MissingLongArgument(String),
}

impl CommandDescription {
    /// Renders the `CheckCommand` object for the executable at `executable`.
    pub fn render(&self, name: &str, executable: &str) -> String {
        let mut out = format!("object CheckCommand \"{name}\" {{\n");
        out.push_str(&format!("  command = [ \"{}\" ]\n", escape_string(executable)));
        out.push_str("  arguments = {\n");

        for arg in &self.arguments {
            out.push_str(&format!("    \"--{}\" = {{\n", arg.name));
            if arg.is_flag {
                out.push_str(&format!("      set_if = \"${}$\"\n", arg.value));
            } else {
                out.push_str(&format!("      value = \"${}$\"\n", arg.value));
            }
            if let Some(description) = &arg.description {
                out.push_str(&format!(
                    "      description = \"{}\"\n",
                    escape_string(description)
                ));
            }
            out.push_str("    }\n");
        }
        out.push_str("  }\n");

        let defaults: Vec<_> = self
            .arguments
            .iter()
            .filter_map(|arg| arg.default_value.as_ref().map(|d| (&arg.value, d)))
            .collect();
        if !defaults.is_empty() {
            out.push('\n');
            for (value, default) in defaults {
                out.push_str(&format!("  vars.{value} = \"{}\"\n", escape_string(default)));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Renders the `CheckCommand` object for the running executable.
    pub fn to_icinga_command(&self, name: &str) -> Result<String, ToIcingaCommandError> {
        let current_exe = std::env::current_exe()?;
        let executable = current_exe
            .to_str()
            .ok_or(ToIcingaCommandError::InvalidExecutablePath)?;
        Ok(self.render(name, executable))
    }
}

fn escape_string(s: &str) -> String {
    ["\\", "\"", "$"]
        .iter()
        .fold(s.to_string(), |acc, c| acc.replace(c, &format!("\\{c}")))
}

impl TryFrom<&clap::Command> for CommandDescription {
    type Error = CommandDescriptionFromError;

    fn try_from(cmd: &clap::Command) -> Result<Self, Self::Error> {
        let mut arguments = Vec::new();

        for arg in cmd.get_arguments() {
            let name = arg
                .get_long()
                .ok_or_else(|| CommandDescriptionFromError::MissingLongArgument(arg.get_id().to_string()))?
                .to_owned();

            if matches!(name.as_str(), "help" | "version") {
                continue;
            }

            let value = name.replace('-', "_");
            let description = arg.get_help().map(|s| s.to_string());
            let is_flag = matches!(arg.get_action(), ArgAction::SetTrue | ArgAction::Count);

            let default_value = arg
                .get_default_values()
                .first()
                .and_then(|v| v.to_str())
                .filter(|_| !is_flag)
                .map(|s| s.to_string());

            arguments.push(ArgumentDescription {
                name,
                value,
                description,
                is_flag,
                default_value,
            });
        }

        Ok(CommandDescription { arguments })
    }
}

/// Print the Icinga command configuration if the GENERATE_ICINGA_COMMAND environment variable is set
/// and exit the process.
pub fn print_icinga_command_config_if_env_and_exit(
    name: &str,
    cmd: &clap::Command,
) -> Result<(), ToIcingaCommandError> {
    if std::env::var_os(GENERATE_ENV).is_none() {
        return Ok(());
    }

    let description = CommandDescription::try_from(cmd)?;
    let out = description.to_icinga_command(name)?;

    println!("{}", out.trim());
    std::process::exit(0);
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::*;
    use crate::backup::BackupCli;

    #[derive(Parser)]
    struct Cli {
        #[arg(long)]
        namespace: String,
        /// The "metric" to $check
        #[arg(long, default_value = "CPUUtilization")]
        metric: String,
        #[arg(long)]
        print_error_details: bool,
        #[arg(short = 'v', long, action = ArgAction::Count)]
        verbose: u8,
    }

    #[test]
    fn test_render() {
        let description = CommandDescription::try_from(&Cli::command()).unwrap();
        let out = description.render("aws_cloudwatch", "/usr/lib/nagios/plugins/check_aws_cloudwatch");

        let expected = r#"object CheckCommand "aws_cloudwatch" {
  command = [ "/usr/lib/nagios/plugins/check_aws_cloudwatch" ]
  arguments = {
    "--namespace" = {
      value = "$namespace$"
    }
    "--metric" = {
      value = "$metric$"
      description = "The \"metric\" to \$check"
    }
    "--print-error-details" = {
      set_if = "$print_error_details$"
    }
    "--verbose" = {
      set_if = "$verbose$"
    }
  }

  vars.metric = "CPUUtilization"
}
"#;
        assert_eq!(out, expected);
    }

    #[test]
    fn test_positional_argument_is_rejected() {
        #[derive(Parser)]
        struct Positional {
            target: String,
        }

        let err = CommandDescription::try_from(&Positional::command())
            .err()
            .expect("positional arguments have no long name");
        assert_eq!(err.to_string(), "argument `target` has no long name");
    }

    #[test]
    fn test_backup_command() {
        let description = CommandDescription::try_from(&BackupCli::command()).unwrap();
        let out = description.render("aws_backups", "check_aws_backups");

        assert!(out.contains("\"--aws-region\" = {\n      value = \"$aws_region$\""));
        assert!(out.contains("\"--debug\" = {\n      set_if = \"$debug$\""));
        assert!(out.contains("  vars.period = \"24\"\n"));
        assert!(out.contains("  vars.no_data_state = \"ok\"\n"));
        assert!(!out.contains("vars.debug"));
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string(r#"a "b" $c$ \d"#), r#"a \"b\" \$c\$ \\d"#);
    }
}
