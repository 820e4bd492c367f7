//! Check for failed AWS Backup jobs in a recent time window.

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_backup::error::DisplayErrorContext;
use aws_sdk_backup::primitives::DateTime as AwsDateTime;
use chrono::{DateTime, Duration, Utc};
use clap::Parser;

use crate::cli::{AwsArgs, OutputArgs};
use crate::{CheckError, Comparator, Metric, Resource, ServiceState};

/// Prefix of the status line.
pub const NAME: &str = "AWS-BACKUP";

/// Job state counted against the thresholds.
pub const FAILED: &str = "FAILED";

/// Page size for `ListBackupJobs`.
const PAGE_SIZE: i32 = 1000;

/// Check AWS Backup jobs.
#[derive(Parser, Clone, Debug)]
#[command(name = "check_aws_backups", version)]
pub struct BackupCli {
    /// Limit backup jobs to a resource ARN
    #[arg(short = 'a', long, alias = "resource_arn", value_name = "RESOURCE-ARN")]
    pub resource_arn: Option<String>,

    /// Limit backup jobs to a resource type
    #[arg(short = 't', long, alias = "resource_type", value_enum, ignore_case = true)]
    pub resource_type: Option<ResourceType>,

    /// Limit backup jobs to a backup vault
    #[arg(short = 'b', long, alias = "backup_vault_name", value_name = "BACKUP-VAULT")]
    pub backup_vault_name: Option<String>,

    /// Period (HOURS) to go back for jobs
    #[arg(short = 'P', long, value_name = "PERIOD", default_value_t = 24, value_parser = clap::value_parser!(u32).range(1..))]
    pub period: u32,

    /// Value (INT) for WARNING if the FAILED count is greater
    #[arg(short = 'w', long, value_name = "WARNING", default_value_t = 0)]
    pub warning: u64,

    /// Value (INT) for CRITICAL if the FAILED count is greater
    #[arg(short = 'c', long, value_name = "CRITICAL", default_value_t = 0)]
    pub critical: u64,

    /// Status reported when no backup job exists in the period
    #[arg(long, value_enum, ignore_case = true, default_value_t = ServiceState::Ok)]
    pub no_data_state: ServiceState,

    #[command(flatten)]
    pub aws: AwsArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ResourceType {
    #[value(name = "EBS")]
    Ebs,
    #[value(name = "EC2")]
    Ec2,
    #[value(name = "EFS")]
    Efs,
    #[value(name = "RDS")]
    Rds,
    #[value(name = "Aurora")]
    Aurora,
    #[value(name = "DDB", alias = "DynamoDB")]
    DynamoDb,
    #[value(name = "SGW", alias = "Storage Gateway")]
    StorageGateway,
    #[value(name = "FSx")]
    Fsx,
    #[value(name = "S3")]
    S3,
}

impl ResourceType {
    /// Name as used by the AWS Backup API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Ebs => "EBS",
            ResourceType::Ec2 => "EC2",
            ResourceType::Efs => "EFS",
            ResourceType::Rds => "RDS",
            ResourceType::Aurora => "Aurora",
            ResourceType::DynamoDb => "DynamoDB",
            ResourceType::StorageGateway => "Storage Gateway",
            ResourceType::Fsx => "FSx",
            ResourceType::S3 => "S3",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JobFilter {
    pub resource_arn: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub backup_vault_name: Option<String>,
    pub created_after: DateTime<Utc>,
}

impl JobFilter {
    pub fn new(cli: &BackupCli, now: DateTime<Utc>) -> Self {
        Self {
            resource_arn: cli.resource_arn.clone(),
            resource_type: cli.resource_type,
            backup_vault_name: cli.backup_vault_name.clone(),
            created_after: now - Duration::hours(i64::from(cli.period)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupJob {
    pub state: String,
}

#[async_trait]
pub trait BackupJobSource {
    async fn jobs(&self, filter: &JobFilter) -> Result<Vec<BackupJob>, CheckError>;
}

/// [BackupJobSource] backed by `ListBackupJobs`.
pub struct AwsBackupSource {
    client: aws_sdk_backup::Client,
}

impl AwsBackupSource {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_backup::Client::new(config),
        }
    }
}

#[async_trait]
impl BackupJobSource for AwsBackupSource {
    async fn jobs(&self, filter: &JobFilter) -> Result<Vec<BackupJob>, CheckError> {
        let mut jobs = Vec::new();
        let mut next_token = None;

        loop {
            tracing::debug!(?filter, ?next_token, "listing backup jobs");

            let output = self
                .client
                .list_backup_jobs()
                .max_results(PAGE_SIZE)
                .set_by_resource_arn(filter.resource_arn.clone())
                .set_by_resource_type(filter.resource_type.map(|t| t.as_str().to_owned()))
                .set_by_backup_vault_name(filter.backup_vault_name.clone())
                .by_created_after(AwsDateTime::from_millis(
                    filter.created_after.timestamp_millis(),
                ))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|err| {
                    CheckError::api("backup", DisplayErrorContext(&err).to_string(), err)
                })?;

            jobs.extend(output.backup_jobs().iter().map(|job| BackupJob {
                state: job
                    .state()
                    .map(|s| s.as_str().to_owned())
                    .unwrap_or_else(|| "UNKNOWN".to_owned()),
            }));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_owned()),
                None => break,
            }
        }

        tracing::debug!(count = jobs.len(), "listed backup jobs");
        Ok(jobs)
    }
}

/// Number of jobs per state, ordered by state name.
pub fn count_states(jobs: &[BackupJob]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for job in jobs {
        *counts.entry(job.state.clone()).or_insert(0) += 1;
    }
    counts
}

/// Lists the jobs of the period and evaluates the number of failed ones.
pub async fn check<S>(
    cli: &BackupCli,
    source: &S,
    now: DateTime<Utc>,
) -> Result<Resource, CheckError>
where
    S: BackupJobSource + ?Sized,
{
    let filter = JobFilter::new(cli, now);
    let jobs = source.jobs(&filter).await?;

    if jobs.is_empty() {
        return Err(CheckError::NoData(format!(
            "no backup jobs in last {} hours",
            cli.period
        )));
    }

    let counts = count_states(&jobs);
    let failed = counts.get(FAILED).copied().unwrap_or(0);
    let total = jobs.len() as u64;

    tracing::info!(failed, total, ?counts, "counted backup jobs");

    let summary = counts
        .iter()
        .map(|(state, n)| format!("{state}={n}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut resource = Resource::new(NAME).with_description(format!(
        "{failed} failed of {total} backup jobs in last {} hours ({summary})",
        cli.period
    ));

    resource.push(
        Metric::new("failed", failed)
            .with_thresholds(cli.warning, cli.critical, Comparator::Gt)
            .with_minimum(0),
    );
    for (state, n) in counts {
        resource.push(Metric::new(format!("jobs_{state}"), n));
    }

    Ok(resource)
}
