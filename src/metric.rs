use std::fmt;

use crate::{evaluate, Comparator, ServiceState};

/// The purpose of ToPerfString is only so one can define custom representations of custom types
/// without using the ToString trait so we don't interfere with that.
///
/// Also used internally for generation of the final output.
pub trait ToPerfString {
    fn to_perf_string(&self) -> String;
}

macro_rules! perf_string_via_display {
    ($($t:ty),*) => {
        $(
            impl ToPerfString for $t {
                fn to_perf_string(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

perf_string_via_display!(u8, u16, u32, u64, usize, i8, i16, i32, i64, f32, f64);

impl<T: ToPerfString> ToPerfString for Option<T> {
    fn to_perf_string(&self) -> String {
        match self {
            Some(v) => v.to_perf_string(),
            None => String::new(),
        }
    }
}

/// Units of measurement nagios understands in perfdata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Unit {
    #[default]
    None,
    Seconds,
    Milliseconds,
    Microseconds,
    Percentage,
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
    Terabytes,
    Counter,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unit::None => "",
            Unit::Seconds => "s",
            Unit::Milliseconds => "ms",
            Unit::Microseconds => "us",
            Unit::Percentage => "%",
            Unit::Bytes => "B",
            Unit::Kilobytes => "KB",
            Unit::Megabytes => "MB",
            Unit::Gigabytes => "GB",
            Unit::Terabytes => "TB",
            Unit::Counter => "c",
        };
        f.write_str(s)
    }
}

/// A single measured value with optional thresholds.
///
/// The state is only determined if at least one threshold is set, otherwise
/// the metric is pure perfdata and does not influence the resource state.
///
/// ```rust
/// # use check_aws::{Comparator, Metric, ServiceState};
/// let metric = Metric::new("failed", 2).with_thresholds(0, 1, Comparator::Gt);
/// assert_eq!(metric.state(), Some(ServiceState::Critical));
/// assert_eq!(metric.perf_string(), "failed=2;~:0;~:1");
/// ```
#[derive(Clone, Debug)]
pub struct Metric<T> {
    name: String,
    value: T,
    warning: Option<T>,
    critical: Option<T>,
    comparator: Comparator,
    min: Option<T>,
    max: Option<T>,
    unit: Unit,
}

impl<T> Metric<T>
where
    T: PartialOrd + ToPerfString,
{
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
            warning: None,
            critical: None,
            comparator: Comparator::Ge,
            min: None,
            max: None,
            unit: Unit::None,
        }
    }

    pub fn with_thresholds(
        mut self,
        warning: impl Into<Option<T>>,
        critical: impl Into<Option<T>>,
        comparator: Comparator,
    ) -> Self {
        self.warning = warning.into();
        self.critical = critical.into();
        self.comparator = comparator;
        self
    }

    pub fn with_minimum(mut self, min: T) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_maximum(mut self, max: T) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn state(&self) -> Option<ServiceState> {
        if self.warning.is_none() && self.critical.is_none() {
            return None;
        }

        Some(evaluate(
            &self.value,
            self.warning.as_ref(),
            self.critical.as_ref(),
            self.comparator,
        ))
    }

    pub fn perf_string(&self) -> String {
        let range = |t: &Option<T>| {
            t.as_ref()
                .map(|t| self.comparator.perf_range(t))
                .unwrap_or_default()
        };

        let fields = [
            format!("{}{}", self.value.to_perf_string(), self.unit),
            range(&self.warning),
            range(&self.critical),
            self.min.to_perf_string(),
            self.max.to_perf_string(),
        ];

        let joined = fields.join(";");
        format!("{}={}", perf_label(&self.name), joined.trim_end_matches(';'))
    }
}

fn perf_label(name: &str) -> String {
    let label = name.replace('=', "_").replace('\'', "''");

    if label.contains(' ') {
        format!("'{label}'")
    } else {
        label
    }
}

/// Object-safe view of a metric so a resource can hold metrics of mixed value types.
pub trait ResourceMetric {
    fn name(&self) -> &str;
    fn state(&self) -> Option<ServiceState>;
    fn perf_string(&self) -> String;
}

impl<T> ResourceMetric for Metric<T>
where
    T: PartialOrd + ToPerfString,
{
    fn name(&self) -> &str {
        Metric::name(self)
    }

    fn state(&self) -> Option<ServiceState> {
        Metric::state(self)
    }

    fn perf_string(&self) -> String {
        Metric::perf_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_without_thresholds() {
        let metric = Metric::new("test", 12);
        assert_eq!(metric.name(), "test");
        assert_eq!(metric.value(), &12);
        assert_eq!(metric.state(), None);
        assert_eq!(metric.perf_string(), "test=12");
    }

    #[test]
    fn test_metric_thresholds() {
        let metric = Metric::new("test", 12).with_thresholds(15, 30, Comparator::Ge);
        assert_eq!(metric.state(), Some(ServiceState::Ok));

        let metric = Metric::new("test", 15).with_thresholds(15, 30, Comparator::Ge);
        assert_eq!(metric.state(), Some(ServiceState::Warning));

        let metric = Metric::new("test", 30).with_thresholds(15, 30, Comparator::Ge);
        assert_eq!(metric.state(), Some(ServiceState::Critical));

        let metric = Metric::new("test", 20).with_thresholds(30, 15, Comparator::Le);
        assert_eq!(metric.state(), Some(ServiceState::Warning));

        let metric = Metric::new("test", 10).with_thresholds(30, 15, Comparator::Le);
        assert_eq!(metric.state(), Some(ServiceState::Critical));

        let metric = Metric::new("test", 52).with_thresholds(None, 50, Comparator::Gt);
        assert_eq!(metric.state(), Some(ServiceState::Critical));
    }

    #[test]
    fn test_perf_string() {
        let metric = Metric::new("test", 12)
            .with_thresholds(14, None, Comparator::Gt)
            .with_minimum(0);
        assert_eq!(metric.perf_string(), "test=12;~:14;;0");

        let metric = Metric::new("free", 5.5)
            .with_thresholds(20.0, 10.0, Comparator::Lt)
            .with_unit(Unit::Gigabytes);
        assert_eq!(metric.perf_string(), "free=5.5GB;20:;10:");

        let metric = Metric::new("foo", 12).with_unit(Unit::Microseconds);
        assert_eq!(metric.perf_string(), "foo=12us");

        let metric = Metric::new("pct", 50)
            .with_unit(Unit::Percentage)
            .with_minimum(0)
            .with_maximum(100);
        assert_eq!(metric.perf_string(), "pct=50%;;;0;100");
    }

    #[test]
    fn test_perf_label_escaping() {
        let test_data = [
            ("test", "test=0"),
            ("test=a", "test_a=0"),
            ("te'st", "te''st=0"),
            ("te st", "'te st'=0"),
        ];
        for (label, expected) in &test_data {
            assert_eq!(&Metric::new(*label, 0).perf_string(), expected);
        }
    }
}
