//! Nagios/Icinga checks for AWS.
//!
//! The crate provides two plugins, `check_aws_cloudwatch` and
//! `check_aws_backups`, and the small plugin toolkit they are built on:
//! service states, thresholded metrics with perfdata, resources and a runner
//! that turns errors into a status line and exit code.
//!
//! ```rust
//! # use check_aws::{Comparator, Metric, Resource, ServiceState};
//! let resource = Resource::new("AWS-BACKUP")
//!     .with_description("2 failed of 12 backup jobs in last 24 hours")
//!     .with_result(Metric::new("failed", 2).with_thresholds(0, 1, Comparator::Gt));
//!
//! assert_eq!(resource.state(), ServiceState::Critical);
//! assert_eq!(
//!     resource.to_nagios_string(),
//!     "AWS-BACKUP CRITICAL: 2 failed of 12 backup jobs in last 24 hours | failed=2;~:0;~:1"
//! );
//! ```

mod comparator;
mod error;
mod metric;
mod resource;
mod runner;
mod state;

pub mod aws;
pub mod backup;
pub mod cli;
pub mod cloudwatch;
pub mod config_generator;
pub mod logging;

pub use crate::comparator::{evaluate, evaluate_symbol, Comparator, InvalidComparator};
pub use crate::error::CheckError;
pub use crate::metric::{Metric, ResourceMetric, ToPerfString, Unit};
pub use crate::resource::Resource;
pub use crate::runner::{safe_run, Runner, RunnerResult};
pub use crate::state::{InvalidServiceState, ServiceState};
