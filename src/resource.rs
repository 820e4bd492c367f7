use std::fmt;
use std::process;

use crate::{Metric, ResourceMetric, ServiceState, ToPerfString};

/// A Resource basically represents a single service if you view it from the perspective of nagios.
/// If you don't fix a state it will determine one from the given metrics.
///
/// ```rust
/// # use check_aws::{Comparator, Metric, Resource};
/// let resource = Resource::new("CLOUDWATCH")
///     .with_description("CPUUtilization (Average) is 91.5 Percent")
///     .with_result(Metric::new("CPUUtilization", 91.5).with_thresholds(80.0, 90.0, Comparator::Gt));
///
/// assert_eq!(
///     resource.to_nagios_string(),
///     "CLOUDWATCH CRITICAL: CPUUtilization (Average) is 91.5 Percent | CPUUtilization=91.5;~:80;~:90"
/// );
/// ```
#[derive(Default)]
pub struct Resource {
    name: Option<String>,
    description: Option<String>,
    state: Option<ServiceState>,
    metrics: Vec<Box<dyn ResourceMetric>>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Fixes the state of this resource. This disables the automatic state
    /// determination based on the included metrics.
    pub fn with_fixed_state(mut self, state: ServiceState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_result<T>(mut self, metric: Metric<T>) -> Self
    where
        T: PartialOrd + ToPerfString + 'static,
    {
        self.push(metric);
        self
    }

    pub fn push<T>(&mut self, metric: Metric<T>)
    where
        T: PartialOrd + ToPerfString + 'static,
    {
        self.metrics.push(Box::new(metric));
    }

    pub fn metrics(&self) -> &[Box<dyn ResourceMetric>] {
        &self.metrics
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Will determine a state by the worst state of the included metrics.
    ///
    /// In case a state is fixed for this resource, it will return that instead.
    /// Without any evaluated metric the state is unknown.
    pub fn state(&self) -> ServiceState {
        if let Some(state) = self.state {
            return state;
        }

        self.metrics
            .iter()
            .filter_map(|m| m.state())
            .max()
            .unwrap_or(ServiceState::Unknown)
    }

    /// Returns a string which nagios understands to determine the service state.
    pub fn to_nagios_string(&self) -> String {
        let mut s = String::new();

        if let Some(name) = &self.name {
            s.push_str(name);
            s.push(' ');
        }

        s.push_str(&self.state().to_string());

        if let Some(description) = &self.description {
            s.push_str(": ");
            s.push_str(description);
        }

        if !self.metrics.is_empty() {
            s.push_str(" |");
            for metric in &self.metrics {
                s.push(' ');
                s.push_str(&metric.perf_string());
            }
        }

        s
    }

    pub fn exit_code(&self) -> i32 {
        self.state().exit_code()
    }

    /// Will print Self::to_nagios_string and exit with the exit code from Self::exit_code
    pub fn print_and_exit(&self) -> ! {
        println!("{}", self.to_nagios_string());
        process::exit(self.exit_code());
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let perfdata: Vec<String> = self.metrics.iter().map(|m| m.perf_string()).collect();

        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("state", &self.state())
            .field("metrics", &perfdata)
            .finish()
    }
}
