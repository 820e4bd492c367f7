//! Command line arguments shared by all checks.

use clap::error::ErrorKind;
use clap::{ArgAction, Args, Parser};

use crate::ServiceState;

/// Connection settings for the AWS SDK.
#[derive(Args, Clone, Debug)]
pub struct AwsArgs {
    /// AWS region (Example: us-east-1)
    #[arg(
        short = 'r',
        long = "aws-region",
        alias = "aws_region",
        env = "AWS_REGION",
        value_name = "AWS_REGION"
    )]
    pub region: String,

    /// AWS profile from the shared config files
    #[arg(
        short = 'p',
        long = "aws-profile",
        alias = "aws_profile",
        value_name = "AWS_PROFILE"
    )]
    pub profile: Option<String>,

    /// Timeout (SECONDS) for each AWS operation
    #[arg(long, value_name = "SECONDS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,
}

/// Diagnostics on stderr.
#[derive(Args, Clone, Debug, Default)]
pub struct OutputArgs {
    /// Verbose output to stderr, repeat for debug output
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Debug output to stderr
    #[arg(long, alias = "verboseverbose")]
    pub debug: bool,

    /// Print error details to stderr when the check fails
    #[arg(long)]
    pub print_error_details: bool,
}

impl OutputArgs {
    pub fn verbosity(&self) -> u8 {
        if self.debug {
            self.verbose.max(2)
        } else {
            self.verbose
        }
    }
}

/// Parses the command line. Usage errors are reported as an unknown service
/// state instead of clap's default exit code, which nagios would read as critical.
pub fn parse_or_exit<T: Parser>(name: &str) -> T {
    match T::try_parse() {
        Ok(cli) => cli,
        Err(err) => match usage_error(name, &err) {
            Some((line, state)) => {
                eprintln!("{}", err.render());
                println!("{line}");
                std::process::exit(state.exit_code());
            }
            None => err.exit(),
        },
    }
}

/// Status line and state for a failed parse. `None` for help and version
/// output, which clap prints itself.
pub fn usage_error(name: &str, err: &clap::Error) -> Option<(String, ServiceState)> {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => None,
        _ => {
            let state = ServiceState::Unknown;
            Some((format!("{name} {state}: {}", usage_error_line(err)), state))
        }
    }
}

/// First line of a clap error without the `error: ` prefix.
pub fn usage_error_line(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let line = rendered.lines().next().unwrap_or_default().trim();
    line.strip_prefix("error: ").unwrap_or(line).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        aws: AwsArgs,
        #[command(flatten)]
        output: OutputArgs,
    }

    #[test]
    fn test_aws_args() {
        let cli = TestCli::try_parse_from(["test", "-r", "eu-west-1", "-p", "prod"]).unwrap();
        assert_eq!(cli.aws.region, "eu-west-1");
        assert_eq!(cli.aws.profile.as_deref(), Some("prod"));
        assert_eq!(cli.aws.timeout, 30);

        let cli = TestCli::try_parse_from([
            "test",
            "--aws_region",
            "us-east-1",
            "--aws_profile",
            "dev",
            "--timeout",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.aws.region, "us-east-1");
        assert_eq!(cli.aws.profile.as_deref(), Some("dev"));
        assert_eq!(cli.aws.timeout, 5);

        assert!(TestCli::try_parse_from(["test", "-r", "us-east-1", "--timeout", "0"]).is_err());
    }

    #[test]
    fn test_verbosity() {
        let cli = TestCli::try_parse_from(["test", "-r", "x"]).unwrap();
        assert_eq!(cli.output.verbosity(), 0);
        assert!(!cli.output.print_error_details);

        let cli = TestCli::try_parse_from(["test", "-r", "x", "-v"]).unwrap();
        assert_eq!(cli.output.verbosity(), 1);

        let cli = TestCli::try_parse_from(["test", "-r", "x", "-vv"]).unwrap();
        assert_eq!(cli.output.verbosity(), 2);

        let cli = TestCli::try_parse_from(["test", "-r", "x", "--debug"]).unwrap();
        assert_eq!(cli.output.verbosity(), 2);

        let cli =
            TestCli::try_parse_from(["test", "-r", "x", "--print-error-details"]).unwrap();
        assert!(cli.output.print_error_details);
    }

    #[test]
    fn test_usage_error() {
        let err = TestCli::try_parse_from(["test", "-r", "x", "--timeout", "0"]).unwrap_err();
        let (line, state) = usage_error("TEST", &err).unwrap();
        assert!(line.starts_with("TEST UNKNOWN: invalid value '0' for '--timeout"), "{line}");
        assert_eq!(state.exit_code(), 3);

        let err = TestCli::try_parse_from(["test", "--help"]).unwrap_err();
        assert_eq!(usage_error("TEST", &err), None);
    }

    #[test]
    fn test_usage_error_line() {
        let err = TestCli::try_parse_from(["test", "-r", "x", "--bogus"]).unwrap_err();
        let line = usage_error_line(&err);
        assert!(line.contains("--bogus"), "{line}");
        assert!(!line.starts_with("error:"), "{line}");
    }
}
