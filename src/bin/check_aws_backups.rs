//! Nagios/Icinga plugin counting failed AWS Backup jobs.
//!
//! Usage:
//!
//! ```text
//! check_aws_backups -r eu-west-1 -b Default -P 24 -w 0 -c 2
//! ```
//!
//! Set `GENERATE_ICINGA_COMMAND` to print an Icinga2 `CheckCommand` instead.

use clap::CommandFactory;

use check_aws::backup::{self, AwsBackupSource, BackupCli};
use check_aws::config_generator::print_icinga_command_config_if_env_and_exit;
use check_aws::{aws, cli, logging, Runner, ServiceState};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = print_icinga_command_config_if_env_and_exit("aws_backups", &BackupCli::command())
    {
        println!("{} {}: {err}", backup::NAME, ServiceState::Unknown);
        std::process::exit(ServiceState::Unknown.exit_code());
    }

    let cli: BackupCli = cli::parse_or_exit(backup::NAME);
    logging::init(cli.output.verbosity());
    tracing::debug!(?cli, "parsed arguments");

    let config = aws::load_config(&cli.aws).await;
    let source = AwsBackupSource::new(&config);
    let result = backup::check(&cli, &source, chrono::Utc::now()).await;

    Runner::for_check(backup::NAME, cli.no_data_state)
        .print_error_details(cli.output.print_error_details)
        .finish(result)
        .print_and_exit()
}
