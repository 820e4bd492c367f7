use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Represents a service state from nagios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceState {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceState {
    /// Returns the corresponding nagios exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ServiceState::Unknown => 0,
            ServiceState::Ok => 1,
            ServiceState::Warning => 2,
            ServiceState::Critical => 3,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Unknown sorts lowest so that any evaluated metric outweighs it when a
/// resource picks its worst state.
impl PartialOrd for ServiceState {
    fn partial_cmp(&self, other: &ServiceState) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServiceState {
    fn cmp(&self, other: &ServiceState) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid service state `{0}`, expected one of: ok, warning, critical, unknown")]
pub struct InvalidServiceState(String);

impl FromStr for ServiceState {
    type Err = InvalidServiceState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ok" => Ok(ServiceState::Ok),
            "warning" => Ok(ServiceState::Warning),
            "critical" => Ok(ServiceState::Critical),
            "unknown" => Ok(ServiceState::Unknown),
            _ => Err(InvalidServiceState(s.to_owned())),
        }
    }
}
