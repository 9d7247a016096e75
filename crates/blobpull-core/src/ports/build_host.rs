//! BuildHost port - ビルドオーケストレーション側（ジョブ・ラン・環境変数・結果報告）
//!
//! host が持っている情報を読むだけのインターフェース。
//! 結果の書き戻しは `set_result` の一箇所に限る。

use std::sync::Arc;

use crate::domain::errors::Result;
use crate::domain::{ArtifactRecord, BuildNumber, EnvVars, Permalink, RunInfo, RunResult};

/// Run history of one job.
pub trait JobHistory: Send + Sync {
    /// Full name of the job.
    fn name(&self) -> &str;

    /// All runs, newest first.
    fn builds_newest_first(&self) -> Vec<RunInfo>;

    fn build_by_number(&self, number: BuildNumber) -> Option<RunInfo> {
        self.builds_newest_first()
            .into_iter()
            .find(|run| run.number == number)
    }

    /// Resolve a permalink such as `lastSuccessfulBuild`.
    ///
    /// Hosts that track permalinks themselves can override this; the default
    /// walks the history.
    fn permalink(&self, name: &str) -> Option<RunInfo> {
        let link = Permalink::parse(name)?;
        link.resolve(&self.builds_newest_first())
    }
}

/// Services the core needs from the build host.
pub trait BuildHost: Send + Sync {
    /// Environment snapshot of `run` (macro source).
    fn environment(&self, run: &RunInfo) -> Result<EnvVars>;

    fn find_job(&self, full_name: &str) -> Option<Arc<dyn JobHistory>>;

    /// Artifact record attached to `run` by the publish step, if any.
    fn artifact_record(&self, run: &RunInfo) -> Result<Option<ArtifactRecord>>;

    /// Record a new result for the invoking run.
    fn set_result(&self, run: &RunInfo, result: RunResult);
}
