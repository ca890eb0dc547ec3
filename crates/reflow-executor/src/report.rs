//! Per-run outcome of the optional operation set.

/// Outcome of one optional operation within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    /// Executed and recorded no new fault.
    Completed,
    /// Executed but crashed or recorded a fault during its own run.
    Failed,
    /// Not enabled for this run.
    Disabled,
    /// Not executed because the named dependency was not satisfied.
    SkippedDependency(String),
}

impl OperationStatus {
    /// Whether the operation executed and completed cleanly.
    pub fn is_completed(&self) -> bool {
        matches!(self, OperationStatus::Completed)
    }

    /// Whether the operation's effect was invoked at all.
    pub fn ran(&self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Completed => "completed",
            OperationStatus::Failed => "failed",
            OperationStatus::Disabled => "disabled",
            OperationStatus::SkippedDependency(_) => "skipped",
        }
    }
}

/// Outcomes of one registry run, in registration order.
#[derive(Debug, Default)]
pub struct RunReport {
    entries: Vec<(String, OperationStatus)>,
}

impl RunReport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, name: impl Into<String>, status: OperationStatus) {
        self.entries.push((name.into(), status));
    }

    /// Status of a named operation, if it was registered.
    pub fn status(&self, name: &str) -> Option<&OperationStatus> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, status)| status)
    }

    /// All outcomes in registration order.
    pub fn entries(&self) -> &[(String, OperationStatus)] {
        &self.entries
    }

    /// Names of operations that completed cleanly.
    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, s)| s.is_completed())
            .map(|(n, _)| n.as_str())
    }

    /// Whether the named operation's effect was invoked.
    pub fn ran(&self, name: &str) -> bool {
        self.status(name).map(OperationStatus::ran).unwrap_or(false)
    }

    /// Report as a JSON object of `name -> status`, for metadata and logs.
    pub fn as_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, status) in &self.entries {
            map.insert(name.clone(), serde_json::Value::String(status.as_str().to_string()));
        }
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_preserves_registration_order() {
        let mut report = RunReport::new();
        report.record("b", OperationStatus::Completed);
        report.record("a", OperationStatus::Disabled);

        let names: Vec<&str> = report.entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_report_status_queries() {
        let mut report = RunReport::new();
        report.record("prepare", OperationStatus::Failed);
        report.record("sync", OperationStatus::SkippedDependency("prepare".into()));

        assert!(report.ran("prepare"));
        assert!(!report.ran("sync"));
        assert!(!report.ran("missing"));
        assert_eq!(report.completed().count(), 0);
    }

    #[test]
    fn test_report_as_json() {
        let mut report = RunReport::new();
        report.record("prepare", OperationStatus::Completed);
        report.record("sync", OperationStatus::Disabled);

        let json = report.as_json();
        assert_eq!(json["prepare"], "completed");
        assert_eq!(json["sync"], "disabled");
    }
}
