use std::error::Error as _;
use std::fmt;

use crate::ServiceState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error)]
pub enum CheckError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{service} request failed: {message}")]
    Api {
        service: &'static str,
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("{0}")]
    NoData(String),

    #[error("datapoint has no {0} value")]
    MissingStatistic(&'static str),

    #[error("timestamp out of range: {0}")]
    InvalidTimestamp(String),
}

impl CheckError {
    /// Wraps an SDK error. `message` is the one-line form for the status line,
    /// the error itself is kept as the source for `--print-error-details`.
    pub fn api<E>(service: &'static str, message: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CheckError::Api {
            service,
            message: message.into(),
            source: Box::new(err),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, CheckError::NoData(_))
    }

    /// State to report for this error; missing data is reported as `no_data_state`.
    pub fn service_state(&self, no_data_state: ServiceState) -> ServiceState {
        if self.is_no_data() {
            no_data_state
        } else {
            ServiceState::Unknown
        }
    }
}

/// Prints the message followed by the source chain, and for SDK errors the
/// pretty printed debug form of the underlying error.
impl fmt::Debug for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")?;

        let mut next = self.source();
        if next.is_some() {
            write!(f, "\n\nCaused by:")?;
        }
        let mut index = 0;
        while let Some(err) = next {
            write!(f, "\n    {index}: {err}")?;
            index += 1;
            next = err.source();
        }

        if let CheckError::Api { source, .. } = self {
            write!(f, "\n\n{source:#?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::io;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("service error")]
    struct ServiceError {
        code: &'static str,
        #[source]
        cause: io::Error,
    }

    fn access_denied() -> ServiceError {
        ServiceError {
            code: "AccessDenied",
            cause: io::Error::new(io::ErrorKind::PermissionDenied, "not authorized"),
        }
    }

    #[test]
    fn test_api_error_display() {
        let err = CheckError::api("cloudwatch", "dispatch failure: timeout", access_denied());
        assert_eq!(
            err.to_string(),
            "cloudwatch request failed: dispatch failure: timeout"
        );
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("service error"));
    }

    #[test]
    fn test_api_error_debug_shows_chain() {
        let err = CheckError::api("cloudwatch", "access denied", access_denied());
        let details = format!("{err:?}");

        assert!(
            details.starts_with(
                "cloudwatch request failed: access denied\n\nCaused by:\n    \
                 0: service error\n    1: not authorized\n\nServiceError {\n"
            ),
            "{details}"
        );
        assert!(details.contains("    code: \"AccessDenied\",\n"), "{details}");
        assert!(!details.contains("\\n"), "{details}");
    }

    #[test]
    fn test_debug_without_source() {
        let err = CheckError::MissingStatistic("Average");
        assert_eq!(format!("{err:?}"), "datapoint has no Average value");
    }

    #[test]
    fn test_is_no_data() {
        assert!(CheckError::NoData("no datapoints".to_owned()).is_no_data());
        assert!(!CheckError::MissingStatistic("Average").is_no_data());
    }

    #[test]
    fn test_service_state() {
        let no_data = CheckError::NoData("no datapoints".to_owned());
        assert_eq!(no_data.service_state(ServiceState::Ok), ServiceState::Ok);
        assert_eq!(no_data.service_state(ServiceState::Critical), ServiceState::Critical);

        let invalid = CheckError::InvalidArgument("dimension".to_owned());
        assert_eq!(invalid.service_state(ServiceState::Ok), ServiceState::Unknown);
    }
}
