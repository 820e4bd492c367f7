use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates that get noisy at debug level; held back to warnings.
const QUIET_TARGETS: &[&str] = &["aws_config", "aws_smithy_runtime", "aws_sdk", "hyper", "rustls"];

/// Filter directives for the given verbosity. Plugins stay silent on stderr by
/// default, `-v` enables info and `-vv` debug output for the checks.
pub fn filter_directives(verbosity: u8) -> String {
    let level = match verbosity {
        0 => return "off".to_owned(),
        1 => "info",
        _ => "debug",
    };

    let mut directives = vec![format!("check_aws={level}")];
    directives.extend(QUIET_TARGETS.iter().map(|t| format!("{t}=warn")));
    directives.join(",")
}

/// Installs the global subscriber writing to stderr. `RUST_LOG` takes precedence.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
