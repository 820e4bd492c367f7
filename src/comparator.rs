//! Threshold evaluation.
//!
//! A [Comparator] is applied between an observed value and a threshold. The
//! critical threshold is always checked first, so a value that meets both
//! thresholds is reported as critical.

use std::fmt;
use std::str::FromStr;

use crate::{ServiceState, ToPerfString};

/// Relational operator used to compare a value against its thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Comparator {
    /// value > threshold
    Gt,
    /// value >= threshold
    Ge,
    /// value < threshold
    Lt,
    /// value <= threshold
    Le,
    /// value == threshold
    Eq,
    /// value != threshold
    Ne,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Gt => "gt",
            Comparator::Ge => "ge",
            Comparator::Lt => "lt",
            Comparator::Le => "le",
            Comparator::Eq => "eq",
            Comparator::Ne => "ne",
        }
    }

    /// Returns true if `value` triggers against `threshold`.
    pub fn triggers<T: PartialOrd>(&self, value: &T, threshold: &T) -> bool {
        match self {
            Comparator::Gt => value > threshold,
            Comparator::Ge => value >= threshold,
            Comparator::Lt => value < threshold,
            Comparator::Le => value <= threshold,
            Comparator::Eq => value == threshold,
            Comparator::Ne => value != threshold,
        }
    }

    /// Renders a threshold as a nagios range for perfdata.
    ///
    /// Nagios ranges alert when the value is *outside* of them (or inside when
    /// prefixed by `@`). A bare `x` means `0:x`, so upper bounds are written
    /// as `~:x` to leave negative values alone.
    pub fn perf_range<T: ToPerfString>(&self, threshold: &T) -> String {
        let t = threshold.to_perf_string();
        match self {
            Comparator::Gt | Comparator::Ge => format!("~:{t}"),
            Comparator::Lt | Comparator::Le => format!("{t}:"),
            Comparator::Eq => format!("@{t}:{t}"),
            Comparator::Ne => format!("{t}:{t}"),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("invalid comparator `{0}`, expected one of: gt, ge, lt, le, eq, ne")]
pub struct InvalidComparator(pub String);

impl FromStr for Comparator {
    type Err = InvalidComparator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gt" => Ok(Comparator::Gt),
            "ge" => Ok(Comparator::Ge),
            "lt" => Ok(Comparator::Lt),
            "le" => Ok(Comparator::Le),
            "eq" => Ok(Comparator::Eq),
            "ne" => Ok(Comparator::Ne),
            _ => Err(InvalidComparator(s.to_owned())),
        }
    }
}

/// Evaluates `value` against the thresholds. An absent threshold never triggers.
///
/// ```rust
/// # use check_aws::{evaluate, Comparator, ServiceState};
/// let state = evaluate(&15e9, Some(&20e9), Some(&10e9), Comparator::Le);
/// assert_eq!(state, ServiceState::Warning);
/// ```
pub fn evaluate<T: PartialOrd>(
    value: &T,
    warning: Option<&T>,
    critical: Option<&T>,
    comparator: Comparator,
) -> ServiceState {
    if critical.is_some_and(|c| comparator.triggers(value, c)) {
        return ServiceState::Critical;
    }

    if warning.is_some_and(|w| comparator.triggers(value, w)) {
        return ServiceState::Warning;
    }

    ServiceState::Ok
}

/// Like [evaluate] but takes the comparator as its symbol. Unknown symbols
/// yield [ServiceState::Unknown].
pub fn evaluate_symbol<T: PartialOrd>(
    value: &T,
    warning: &T,
    critical: &T,
    symbol: &str,
) -> ServiceState {
    match symbol.parse::<Comparator>() {
        Ok(comparator) => evaluate(value, Some(warning), Some(critical), comparator),
        Err(err) => {
            tracing::debug!(%err, "cannot evaluate thresholds");
            ServiceState::Unknown
        }
    }
}
