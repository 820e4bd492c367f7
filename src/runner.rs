use std::fmt::{Debug, Display};

use crate::{CheckError, Resource, ServiceState};

/// Turns the outcome of a check into output and an exit code.
///
/// Errors are reported with [ServiceState::Unknown] unless an `on_error`
/// handler picks a different state.
pub struct Runner<E> {
    name: Option<String>,
    on_error: Option<Box<dyn FnOnce(&E) -> ServiceState>>,
    print_error_details: bool,
}

impl<E: Display + Debug> Runner<E> {
    pub fn new() -> Self {
        Self {
            name: None,
            on_error: None,
            print_error_details: false,
        }
    }

    /// Prefix for the status line printed on error. Successful runs use the
    /// name of the returned resource.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&E) -> ServiceState + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Print the debug representation of an error to stderr. For [CheckError]
    /// and `anyhow::Error` that includes the source chain.
    pub fn print_error_details(mut self, enabled: bool) -> Self {
        self.print_error_details = enabled;
        self
    }

    pub fn safe_run(self, f: impl FnOnce() -> Result<Resource, E>) -> RunnerResult<E> {
        self.finish(f())
    }

    /// Same as [Runner::safe_run] for results that were computed elsewhere,
    /// e.g. by an async check.
    pub fn finish(self, result: Result<Resource, E>) -> RunnerResult<E> {
        match result {
            Ok(resource) => RunnerResult::Ok(resource),
            Err(err) => {
                let state = self
                    .on_error
                    .map(|f| f(&err))
                    .unwrap_or(ServiceState::Unknown);

                tracing::debug!(%state, error = %err, "check failed");

                RunnerResult::Err {
                    name: self.name,
                    state,
                    error: err,
                    print_details: self.print_error_details,
                }
            }
        }
    }
}

impl Runner<CheckError> {
    /// Runner used by the plugins: missing data is reported as
    /// `no_data_state`, every other error as unknown.
    pub fn for_check(name: impl Into<String>, no_data_state: ServiceState) -> Self {
        Runner::new()
            .with_name(name)
            .on_error(move |err: &CheckError| err.service_state(no_data_state))
    }
}

impl<E: Display + Debug> Default for Runner<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the given closure and reports an error with the given state.
pub fn safe_run<E: Display + Debug>(
    f: impl FnOnce() -> Result<Resource, E>,
    error_state: ServiceState,
) -> RunnerResult<E> {
    Runner::new().on_error(move |_| error_state).safe_run(f)
}

pub enum RunnerResult<E> {
    Ok(Resource),
    Err {
        name: Option<String>,
        state: ServiceState,
        error: E,
        print_details: bool,
    },
}

impl<E: Display + Debug> RunnerResult<E> {
    pub fn state(&self) -> ServiceState {
        match self {
            RunnerResult::Ok(resource) => resource.state(),
            RunnerResult::Err { state, .. } => *state,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.state().exit_code()
    }

    pub fn to_nagios_string(&self) -> String {
        match self {
            RunnerResult::Ok(resource) => resource.to_nagios_string(),
            RunnerResult::Err {
                name, state, error, ..
            } => match name {
                Some(name) => format!("{name} {state}: {error}"),
                None => format!("{state}: {error}"),
            },
        }
    }

    /// Error details printed to stderr, if enabled.
    pub fn error_details(&self) -> Option<String> {
        match self {
            RunnerResult::Err {
                error,
                print_details: true,
                ..
            } => Some(format!("{error:?}")),
            _ => None,
        }
    }

    pub fn print_and_exit(self) -> ! {
        if let Some(details) = self.error_details() {
            eprintln!("{details}");
        }

        println!("{}", self.to_nagios_string());
        std::process::exit(self.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("woops")]
    struct EmptyError;

    #[test]
    fn test_runner_ok() {
        let result = Runner::<EmptyError>::new()
            .on_error(|_| panic!("on_error must not run for a successful check"))
            .safe_run(|| Ok(Resource::new("test").with_fixed_state(ServiceState::Warning)));

        assert!(matches!(result, RunnerResult::Ok(_)));
        assert_eq!(result.exit_code(), 1);
        assert_eq!(result.to_nagios_string(), "test WARNING");
    }

    #[test]
    fn test_runner_error_defaults_to_unknown() {
        let result = Runner::new()
            .with_name("CLOUDWATCH")
            .safe_run(|| Err(EmptyError));

        assert_eq!(result.state(), ServiceState::Unknown);
        assert_eq!(result.exit_code(), 3);
        assert_eq!(result.to_nagios_string(), "CLOUDWATCH UNKNOWN: woops");
    }

    #[test]
    fn test_runner_on_error_picks_state() {
        let on_error = |e: &CheckError| e.service_state(ServiceState::Ok);

        let result = Runner::new()
            .with_name("AWS-BACKUP")
            .on_error(on_error)
            .finish(Err(CheckError::NoData("no backup jobs".to_owned())));
        assert_eq!(result.state(), ServiceState::Ok);
        assert_eq!(result.to_nagios_string(), "AWS-BACKUP OK: no backup jobs");

        let result = Runner::new()
            .on_error(on_error)
            .finish(Err(CheckError::MissingStatistic("Sum")));
        assert_eq!(result.state(), ServiceState::Unknown);
        assert_eq!(result.to_nagios_string(), "UNKNOWN: datapoint has no Sum value");
    }

    #[test]
    fn test_for_check() {
        let result = Runner::for_check("CLOUDWATCH", ServiceState::Warning)
            .finish(Err(CheckError::NoData("no datapoints".to_owned())));
        assert_eq!(result.exit_code(), 1);
        assert_eq!(result.to_nagios_string(), "CLOUDWATCH WARNING: no datapoints");

        let result = Runner::for_check("CLOUDWATCH", ServiceState::Ok)
            .finish(Err(CheckError::InvalidTimestamp("-1".to_owned())));
        assert_eq!(result.exit_code(), 3);
    }

    #[test]
    fn test_error_details() {
        let api_error = || {
            CheckError::api(
                "backup",
                "dispatch failure",
                io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
            )
        };

        let result = Runner::for_check("AWS-BACKUP", ServiceState::Ok).finish(Err(api_error()));
        assert_eq!(result.error_details(), None);

        let result = Runner::for_check("AWS-BACKUP", ServiceState::Ok)
            .print_error_details(true)
            .finish(Err(api_error()));
        let details = result.error_details().unwrap();
        assert!(
            details.starts_with(
                "backup request failed: dispatch failure\n\nCaused by:\n    0: connect timed out\n"
            ),
            "{details}"
        );
        assert!(details.contains("kind: TimedOut"), "{details}");
        assert!(!details.contains("\\n"), "{details}");
        assert_eq!(
            result.to_nagios_string(),
            "AWS-BACKUP UNKNOWN: backup request failed: dispatch failure"
        );

        let result = Runner::new()
            .print_error_details(true)
            .finish(Err(anyhow::anyhow!("root cause").context("listing jobs")));
        let details = result.error_details().unwrap();
        assert!(details.contains("listing jobs"), "{details}");
        assert!(details.contains("root cause"), "{details}");
    }

    #[test]
    fn test_safe_run_with_state() {
        let result = safe_run(|| Err(EmptyError), ServiceState::Critical);
        assert_eq!(result.exit_code(), 2);
        assert_eq!(result.to_nagios_string(), "CRITICAL: woops");
    }

    #[test]
    fn test_runner_with_anyhow_error() {
        let result = Runner::new()
            .with_name("foo")
            .finish(Err(anyhow::anyhow!("something really bad happened")));
        assert_eq!(
            result.to_nagios_string(),
            "foo UNKNOWN: something really bad happened"
        );
    }
}
