//! Outcome model: per-file results and the aggregated report of one pull.
//!
//! Failures of single files are recorded here as data instead of being
//! swallowed, so "best effort, keep going" is visible in the result.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::artifact::BlobRef;
use super::ids::BuildNumber;
use super::run::RunResult;

/// Message logged when a pull ends with nothing on disk.
pub const NO_FILES_DOWNLOADED: &str = "no files downloaded";

/// Result of one file transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    Downloaded { bytes: u64 },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResult {
    pub blob: BlobRef,

    /// Absolute destination; absent when the path itself was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,

    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileResult {
    pub fn downloaded(blob: BlobRef, destination: PathBuf, bytes: u64) -> Self {
        Self {
            blob,
            destination: Some(destination),
            status: FileStatus::Downloaded { bytes },
        }
    }

    pub fn failed(blob: BlobRef, destination: Option<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            blob,
            destination,
            status: FileStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, FileStatus::Downloaded { .. })
    }
}

/// Per-file results of one pull, across every source run that contributed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub files: Vec<FileResult>,

    /// Source runs that contributed (children for a composite build).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<BuildNumber>,
}

impl DownloadOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: FileResult) {
        self.files.push(result);
    }

    pub fn merge(&mut self, other: DownloadOutcome) {
        self.files.extend(other.files);
        self.sources.extend(other.sources);
    }

    pub fn success_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.files.len() - self.success_count()
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.files
            .iter()
            .map(|f| match f.status {
                FileStatus::Downloaded { bytes } => bytes,
                FileStatus::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileResult> {
        self.files.iter().filter(|f| !f.is_success())
    }
}

/// What the caller should do with the invoking run once the pull is over.
///
/// `status` is `None` when the run's result is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub downloaded: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RunResult>,

    pub message: String,

    #[serde(default)]
    pub outcome: DownloadOutcome,
}

impl StepReport {
    /// Map an outcome to a report: zero successes downgrades the run.
    pub fn from_outcome(outcome: DownloadOutcome) -> Self {
        let downloaded = outcome.success_count();
        if downloaded == 0 {
            Self {
                downloaded,
                status: Some(RunResult::Unstable),
                message: NO_FILES_DOWNLOADED.to_string(),
                outcome,
            }
        } else {
            Self {
                downloaded,
                status: None,
                message: format!("{downloaded} file(s) downloaded"),
                outcome,
            }
        }
    }

    /// Report for a fault that stopped the pull before it finished.
    pub fn fault(message: impl Into<String>) -> Self {
        Self {
            downloaded: 0,
            status: Some(RunResult::Unstable),
            message: message.into(),
            outcome: DownloadOutcome::default(),
        }
    }

    pub fn is_unstable(&self) -> bool {
        self.status == Some(RunResult::Unstable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(path: &str) -> BlobRef {
        BlobRef::new("c", path)
    }

    #[test]
    fn counts_only_successes() {
        let mut outcome = DownloadOutcome::new();
        outcome.push(FileResult::downloaded(blob("a"), PathBuf::from("/d/a"), 10));
        outcome.push(FileResult::failed(blob("b"), None, "boom"));
        outcome.push(FileResult::downloaded(blob("c"), PathBuf::from("/d/c"), 5));

        assert_eq!(outcome.success_count(), 2);
        assert_eq!(outcome.failure_count(), 1);
        assert_eq!(outcome.bytes_downloaded(), 15);
        assert_eq!(outcome.failures().next().unwrap().blob.remote_path, "b");
    }

    #[test]
    fn merge_keeps_order_across_sources() {
        let mut first = DownloadOutcome::new();
        first.sources.push(BuildNumber::new(1));
        first.push(FileResult::downloaded(blob("a"), PathBuf::from("/d/a"), 1));

        let mut second = DownloadOutcome::new();
        second.sources.push(BuildNumber::new(2));

        first.merge(second);
        assert_eq!(first.sources, vec![BuildNumber::new(1), BuildNumber::new(2)]);
        assert_eq!(first.success_count(), 1);
    }

    #[test]
    fn zero_successes_downgrade_the_run() {
        let mut outcome = DownloadOutcome::new();
        outcome.push(FileResult::failed(blob("a"), None, "nope"));
        let report = StepReport::from_outcome(outcome);
        assert!(report.is_unstable());
        assert_eq!(report.message, NO_FILES_DOWNLOADED);
    }

    #[test]
    fn some_successes_leave_the_run_alone() {
        let mut outcome = DownloadOutcome::new();
        outcome.push(FileResult::downloaded(blob("a"), PathBuf::from("/d/a"), 1));
        let report = StepReport::from_outcome(outcome);
        assert_eq!(report.status, None);
        assert_eq!(report.downloaded, 1);
    }

    #[test]
    fn file_status_is_tagged() {
        let r = FileResult::failed(blob("x"), None, "denied");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["status"], "FAILED");
        assert_eq!(v["reason"], "denied");
    }
}
