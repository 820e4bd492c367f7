use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};

use crate::cli::AwsArgs;

/// Loads the shared SDK configuration for the given region and optional profile.
pub async fn load_config(args: &AwsArgs) -> SdkConfig {
    tracing::info!(region = %args.region, profile = ?args.profile, "loading AWS configuration");

    let timeouts = TimeoutConfig::builder()
        .operation_timeout(Duration::from_secs(args.timeout))
        .build();

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(args.region.clone()))
        .timeout_config(timeouts);

    if let Some(profile) = &args.profile {
        loader = loader.profile_name(profile);
    }

    loader.load().await
}
