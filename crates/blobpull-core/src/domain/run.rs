//! Run model: a historical build of a job as the host reports it.
//!
//! The host owns runs; the core only reads this snapshot. A composite
//! (matrix) run carries its child runs in the order the host reported them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::BuildNumber;

/// Final result of a run.
///
/// Declared from best to worst, so the derived ordering reads as
/// "a < b means a is better than b".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl RunResult {
    pub fn is_better_or_equal_to(self, other: RunResult) -> bool {
        self <= other
    }
}

/// The run that triggered another run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamCause {
    pub job: String,
    pub number: BuildNumber,
}

/// Metadata of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub job: String,
    pub number: BuildNumber,

    /// `None` while the run is still in progress.
    #[serde(default)]
    pub result: Option<RunResult>,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upstream_causes: Vec<UpstreamCause>,

    /// Child runs of a composite (multi-configuration) build.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RunInfo>,
}

impl RunInfo {
    pub fn new(job: impl Into<String>, number: impl Into<BuildNumber>) -> Self {
        Self {
            job: job.into(),
            number: number.into(),
            result: None,
            timestamp: Utc::now(),
            upstream_causes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_result(mut self, result: RunResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn triggered_by(mut self, job: impl Into<String>, number: impl Into<BuildNumber>) -> Self {
        self.upstream_causes.push(UpstreamCause {
            job: job.into(),
            number: number.into(),
        });
        self
    }

    pub fn with_child(mut self, child: RunInfo) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_composite(&self) -> bool {
        !self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_ordering_goes_from_best_to_worst() {
        assert!(RunResult::Success.is_better_or_equal_to(RunResult::Unstable));
        assert!(RunResult::Unstable.is_better_or_equal_to(RunResult::Unstable));
        assert!(!RunResult::Failure.is_better_or_equal_to(RunResult::Unstable));
        assert!(RunResult::Failure < RunResult::Aborted);
    }

    #[test]
    fn result_serializes_as_upper_case() {
        let s = serde_json::to_string(&RunResult::NotBuilt).unwrap();
        assert_eq!(s, "\"NOT_BUILT\"");
    }

    #[test]
    fn run_without_result_is_in_progress() {
        let run = RunInfo::new("app", 3);
        assert!(!run.is_complete());
        assert!(!run.is_composite());

        let run = run.with_result(RunResult::Success).with_child(RunInfo::new("app/axis=a", 3));
        assert!(run.is_complete());
        assert!(run.is_composite());
    }

    #[test]
    fn run_fixture_json_uses_defaults() {
        let json = r#"{ "job": "app", "number": 12, "result": "UNSTABLE" }"#;
        let run: RunInfo = serde_json::from_str(json).expect("deserialize");
        assert_eq!(run.number, BuildNumber::new(12));
        assert_eq!(run.result, Some(RunResult::Unstable));
        assert!(run.upstream_causes.is_empty());
        assert!(run.children.is_empty());
    }

    #[test]
    fn fixture_timestamp_is_kept() {
        use chrono::TimeZone;

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let run = RunInfo::new("app", 4).with_timestamp(at);
        let json = serde_json::to_string(&run).unwrap();
        assert!(json.contains("2024-05-01T12:00:00Z"), "{json}");

        let parsed: RunInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.timestamp, at);
        assert_eq!(parsed, run);
    }
}
