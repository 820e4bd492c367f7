//! Nagios/Icinga plugin checking one CloudWatch metric statistic.
//!
//! Usage:
//!
//! ```text
//! check_aws_cloudwatch -r eu-west-1 -n AWS/RDS -d DBInstanceIdentifier=mydb \
//!     -M FreeStorageSpace -w 20000000000 -c 10000000000 -C le
//! ```
//!
//! Set `GENERATE_ICINGA_COMMAND` to print an Icinga2 `CheckCommand` instead.

use clap::CommandFactory;

use check_aws::cloudwatch::{self, CloudWatchCli, CloudWatchSource};
use check_aws::config_generator::print_icinga_command_config_if_env_and_exit;
use check_aws::{aws, cli, logging, Runner, ServiceState};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = print_icinga_command_config_if_env_and_exit("aws_cloudwatch", &CloudWatchCli::command())
    {
        println!("{} {}: {err}", cloudwatch::NAME, ServiceState::Unknown);
        std::process::exit(ServiceState::Unknown.exit_code());
    }

    let cli: CloudWatchCli = cli::parse_or_exit(cloudwatch::NAME);
    logging::init(cli.output.verbosity());
    tracing::debug!(?cli, "parsed arguments");

    let config = aws::load_config(&cli.aws).await;
    let source = CloudWatchSource::new(&config);
    let result = cloudwatch::check(&cli, &source, chrono::Utc::now()).await;

    Runner::for_check(cloudwatch::NAME, cli.no_data_state)
        .print_error_details(cli.output.print_error_details)
        .finish(result)
        .print_and_exit()
}
