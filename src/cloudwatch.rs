//! Check a single CloudWatch metric statistic against thresholds.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudwatch::error::DisplayErrorContext;
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types;
use chrono::{DateTime, Duration, Utc};
use clap::Parser;

use crate::cli::{AwsArgs, OutputArgs};
use crate::{CheckError, Comparator, Metric, Resource, ServiceState, Unit};

/// Prefix of the status line.
pub const NAME: &str = "CLOUDWATCH";

/// Check an AWS CloudWatch metric.
#[derive(Parser, Clone, Debug)]
#[command(name = "check_aws_cloudwatch", version)]
pub struct CloudWatchCli {
    /// Namespace of the CloudWatch metric (Example: AWS/RDS)
    #[arg(short = 'n', long, value_name = "NAMESPACE")]
    pub namespace: String,

    /// CloudWatch dimensions as NAME=VALUE[,NAME=VALUE] (Example: DBInstanceIdentifier=myDbName)
    #[arg(short = 'd', long, value_name = "DIMENSIONS")]
    pub dimensions: Option<Dimensions>,

    /// CloudWatch metric (Example: FreeStorageSpace)
    #[arg(short = 'M', long, value_name = "METRIC")]
    pub metric: String,

    /// CloudWatch statistic
    #[arg(short = 's', long, value_enum, ignore_case = true, default_value_t = Statistic::Average)]
    pub statistic: Statistic,

    /// Period (SECONDS) for the statistic and the time range queried
    #[arg(short = 'P', long, value_name = "PERIOD", default_value_t = 300, value_parser = clap::value_parser!(i32).range(1..))]
    pub period: i32,

    /// Value (FLOAT) for WARNING status
    #[arg(short = 'w', long, value_name = "WARNING", allow_negative_numbers = true, value_parser = parse_threshold)]
    pub warning: f64,

    /// Value (FLOAT) for CRITICAL status
    #[arg(short = 'c', long, value_name = "CRITICAL", allow_negative_numbers = true, value_parser = parse_threshold)]
    pub critical: f64,

    /// Comparator applied between the metric value and WARNING/CRITICAL
    #[arg(short = 'C', long, value_enum, ignore_case = true)]
    pub comparator: Comparator,

    /// Status reported when no datapoint is returned
    #[arg(long, value_enum, ignore_case = true, default_value_t = ServiceState::Unknown)]
    pub no_data_state: ServiceState,

    #[command(flatten)]
    pub aws: AwsArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Thresholds must be finite, NaN would never (or always) trigger.
fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|err| format!("{err}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("`{s}` is not a finite number"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

/// Comma separated list of `NAME=VALUE` pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dimensions(pub Vec<Dimension>);

impl FromStr for Dimensions {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((name, value)) if !name.trim().is_empty() => Ok(Dimension {
                    name: name.trim().to_owned(),
                    value: value.trim().to_owned(),
                }),
                _ => Err(CheckError::InvalidArgument(format!(
                    "dimension `{pair}` is not NAME=VALUE"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Dimensions)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Statistic {
    #[value(name = "SampleCount")]
    SampleCount,
    #[value(name = "Average")]
    Average,
    #[value(name = "Sum")]
    Sum,
    #[value(name = "Minimum")]
    Minimum,
    #[value(name = "Maximum")]
    Maximum,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::SampleCount => "SampleCount",
            Statistic::Average => "Average",
            Statistic::Sum => "Sum",
            Statistic::Minimum => "Minimum",
            Statistic::Maximum => "Maximum",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricQuery {
    pub namespace: String,
    pub metric: String,
    pub dimensions: Vec<Dimension>,
    pub statistic: Statistic,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub period: i32,
}

impl MetricQuery {
    /// Query for one period ending at `now`.
    pub fn new(cli: &CloudWatchCli, now: DateTime<Utc>) -> Self {
        Self {
            namespace: cli.namespace.clone(),
            metric: cli.metric.clone(),
            dimensions: cli.dimensions.clone().unwrap_or_default().0,
            statistic: cli.statistic,
            start: now - Duration::seconds(i64::from(cli.period)),
            end: now,
            period: cli.period,
        }
    }
}

/// One datapoint, reduced to the requested statistic.
#[derive(Clone, Debug, PartialEq)]
pub struct Datapoint {
    pub timestamp: Option<DateTime<Utc>>,
    pub value: Option<f64>,
    pub unit: Option<String>,
}

#[async_trait]
pub trait MetricSource {
    async fn statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>, CheckError>;
}

/// [MetricSource] backed by `GetMetricStatistics`.
pub struct CloudWatchSource {
    client: aws_sdk_cloudwatch::Client,
}

impl CloudWatchSource {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_cloudwatch::Client::new(config),
        }
    }
}

#[async_trait]
impl MetricSource for CloudWatchSource {
    async fn statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>, CheckError> {
        let dimensions = query
            .dimensions
            .iter()
            .map(|d| types::Dimension::builder().name(&d.name).value(&d.value).build())
            .collect::<Vec<_>>();

        tracing::debug!(?query, "requesting metric statistics");

        let output = self
            .client
            .get_metric_statistics()
            .namespace(&query.namespace)
            .metric_name(&query.metric)
            .set_dimensions(Some(dimensions))
            .start_time(AwsDateTime::from_millis(query.start.timestamp_millis()))
            .end_time(AwsDateTime::from_millis(query.end.timestamp_millis()))
            .period(query.period)
            .statistics(types::Statistic::from(query.statistic.as_str()))
            .send()
            .await
            .map_err(|err| {
                CheckError::api("cloudwatch", DisplayErrorContext(&err).to_string(), err)
            })?;

        tracing::debug!(datapoints = ?output.datapoints(), "received metric statistics");

        output
            .datapoints()
            .iter()
            .map(|dp| -> Result<Datapoint, CheckError> {
                let timestamp = dp.timestamp().map(to_chrono).transpose()?;
                Ok(Datapoint {
                    timestamp,
                    value: statistic_value(dp, query.statistic),
                    unit: dp.unit().map(|u| u.as_str().to_owned()),
                })
            })
            .collect()
    }
}

fn statistic_value(dp: &types::Datapoint, statistic: Statistic) -> Option<f64> {
    match statistic {
        Statistic::SampleCount => dp.sample_count(),
        Statistic::Average => dp.average(),
        Statistic::Sum => dp.sum(),
        Statistic::Minimum => dp.minimum(),
        Statistic::Maximum => dp.maximum(),
    }
}

fn to_chrono(dt: &AwsDateTime) -> Result<DateTime<Utc>, CheckError> {
    DateTime::<Utc>::from_timestamp(dt.secs(), dt.subsec_nanos())
        .ok_or_else(|| CheckError::InvalidTimestamp(format!("{dt:?}")))
}

/// Maps a CloudWatch unit name to a perfdata unit. Rates and bit units have
/// no nagios counterpart.
pub fn perf_unit(cloudwatch_unit: &str) -> Unit {
    match cloudwatch_unit {
        "Seconds" => Unit::Seconds,
        "Milliseconds" => Unit::Milliseconds,
        "Microseconds" => Unit::Microseconds,
        "Percent" => Unit::Percentage,
        "Bytes" => Unit::Bytes,
        "Kilobytes" => Unit::Kilobytes,
        "Megabytes" => Unit::Megabytes,
        "Gigabytes" => Unit::Gigabytes,
        "Terabytes" => Unit::Terabytes,
        "Count" => Unit::Counter,
        _ => Unit::None,
    }
}

/// Fetches the statistic and evaluates the most recent datapoint.
pub async fn check<S>(
    cli: &CloudWatchCli,
    source: &S,
    now: DateTime<Utc>,
) -> Result<Resource, CheckError>
where
    S: MetricSource + ?Sized,
{
    let query = MetricQuery::new(cli, now);
    let datapoints = source.statistics(&query).await?;
    let count = datapoints.len();

    let latest = datapoints
        .into_iter()
        .max_by_key(|dp| dp.timestamp)
        .ok_or_else(|| {
            CheckError::NoData(format!(
                "no datapoints for {} {} in the last {} seconds",
                query.namespace, query.metric, query.period
            ))
        })?;

    let value = latest
        .value
        .ok_or(CheckError::MissingStatistic(query.statistic.as_str()))?;

    tracing::info!(count, value, timestamp = ?latest.timestamp, "using most recent datapoint");

    let unit = latest.unit.as_deref().filter(|u| *u != "None");
    let description = match unit {
        Some(unit) => format!("{} ({}) is {} {}", query.metric, query.statistic, value, unit),
        None => format!("{} ({}) is {}", query.metric, query.statistic, value),
    };

    let metric = Metric::new(query.metric.as_str(), value)
        .with_thresholds(cli.warning, cli.critical, cli.comparator)
        .with_unit(unit.map(perf_unit).unwrap_or_default());

    Ok(Resource::new(NAME)
        .with_description(description)
        .with_result(metric))
}
