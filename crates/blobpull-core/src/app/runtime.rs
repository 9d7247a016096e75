//! Puller - 1 回の pull を実行する入口
//!
//! # フロー
//! 1. 環境変数の取得とマクロ展開
//! 2. ストレージアカウントの解決・検証
//! 3. ソースの決定（コンテナ直接 or ビルド選択）
//! 4. artifact の解決 → フィルタ → ダウンロード
//! 5. 結果の報告（0 件なら UNSTABLE）
//!
//! `perform` は失敗を呼び出し側に返さない。どの段階の失敗も
//! ログに出したうえで UNSTABLE の `StepReport` になる。

use std::path::Path;
use std::sync::Arc;

use tracing::{Instrument, error, info, info_span, warn};

use crate::app::config::{PullStepConfig, StorageRegistry};
use crate::app::download::Downloader;
use crate::app::resolver::{ArtifactResolver, ResolvedSet, Source};
use crate::domain::errors::{PullError, Result};
use crate::domain::filter::plan;
use crate::domain::{
    BuildFilter, DownloadOutcome, EnvVars, FilterSpec, RunInfo, StepReport, StorageAccountInfo,
    is_valid_container_name,
};
use crate::ports::{BlobStorage, BuildHost, IdGenerator, Workspace};

/// Log marker used when the configured account could not be resolved.
pub const UNKNOWN_ACCOUNT: &str = "unknown account";

/// Wired services for running pull steps. Built with [`PullerBuilder`].
///
/// [`PullerBuilder`]: crate::app::PullerBuilder
pub struct Puller {
    pub(crate) host: Arc<dyn BuildHost>,
    pub(crate) storage: Arc<dyn BlobStorage>,
    pub(crate) workspace: Arc<dyn Workspace>,
    pub(crate) registry: StorageRegistry,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) filter: Arc<dyn BuildFilter>,
}

impl Puller {
    pub fn registry(&self) -> &StorageRegistry {
        &self.registry
    }

    /// Run one pull step on behalf of `run`.
    ///
    /// A downgraded status is also written back through
    /// [`BuildHost::set_result`].
    pub async fn perform(&self, step: &PullStepConfig, run: &RunInfo) -> StepReport {
        let id = self.ids.generate_invocation_id();
        let span = info_span!("pull", invocation = %id, job = %run.job, build = %run.number);

        let report = async {
            match self.try_perform(step, run).await {
                Ok(outcome) => {
                    let report = StepReport::from_outcome(outcome);
                    if report.is_unstable() {
                        warn!(failed = report.outcome.failure_count(), "{}", report.message);
                    } else {
                        info!(
                            downloaded = report.downloaded,
                            failed = report.outcome.failure_count(),
                            bytes = report.outcome.bytes_downloaded(),
                            "pull finished"
                        );
                    }
                    report
                }
                Err(e) => {
                    self.log_fault(step, &e);
                    StepReport::fault(e.to_string())
                }
            }
        }
        .instrument(span)
        .await;

        if let Some(status) = report.status {
            self.host.set_result(run, status);
        }
        report
    }

    fn log_fault(&self, step: &PullStepConfig, e: &PullError) {
        match self.registry.lookup(&step.storage_account) {
            Some(account) => error!(
                account = %account.name,
                endpoint = %account.blob_endpoint,
                kind = ?e.kind(),
                error = %e,
                "pull failed"
            ),
            None => error!(
                account = %step.storage_account,
                endpoint = UNKNOWN_ACCOUNT,
                kind = ?e.kind(),
                error = %e,
                "pull failed"
            ),
        }
    }

    async fn try_perform(&self, step: &PullStepConfig, run: &RunInfo) -> Result<DownloadOutcome> {
        let env = self.host.environment(run)?;

        let account = self
            .registry
            .lookup(&step.storage_account)
            .ok_or_else(|| PullError::AccountNotFound(step.storage_account.clone()))?;
        self.storage.validate_account(&account).await?;

        let filter = FilterSpec::new(
            &env.expand(&step.include),
            &env.expand(&step.exclude),
            step.include_archive_zips,
        )?;
        let root = self.workspace.resolve(&env.expand(&step.download_dir));

        let source = self.choose_source(step, &env, run)?;
        let sets = ArtifactResolver::new(self.host.as_ref(), self.storage.as_ref())
            .resolve(&account, &source)
            .await;

        Ok(self.download_sets(step, &account, &filter, &root, sets).await)
    }

    /// Direct container mode wins over build linkage whenever a container is set.
    fn choose_source(&self, step: &PullStepConfig, env: &EnvVars, run: &RunInfo) -> Result<Source> {
        let container = env.expand(&step.container).trim().to_lowercase();
        if !container.is_empty() {
            if !is_valid_container_name(&container) {
                return Err(PullError::InvalidContainerName(container));
            }
            let prefix = env.expand(&step.blob_prefix).into_owned();
            info!(container = %container, prefix = %prefix, "pulling straight from container");
            return Ok(Source::Container { container, prefix });
        }

        let project = env.expand(&step.project);
        let project = project.trim();
        if project.is_empty() {
            return Ok(Source::Nothing);
        }
        let Some(job) = self.host.find_job(project) else {
            warn!(project, "source job not found");
            return Ok(Source::Nothing);
        };

        match step.selector.select(job.as_ref(), env, self.filter.as_ref(), run) {
            Some(build) => {
                info!(
                    project,
                    selector = %step.selector.describe(),
                    source = %build.number,
                    built_at = %build.timestamp,
                    composite = build.is_composite(),
                    "selected source build"
                );
                Ok(Source::Build(build))
            }
            None => {
                warn!(project, selector = %step.selector.describe(), "no build matched the selector");
                Ok(Source::Nothing)
            }
        }
    }

    async fn download_sets(
        &self,
        step: &PullStepConfig,
        account: &StorageAccountInfo,
        filter: &FilterSpec,
        root: &Path,
        sets: Vec<ResolvedSet>,
    ) -> DownloadOutcome {
        let downloader = Downloader::new(self.storage.as_ref(), self.workspace.as_ref(), account);
        let mut total = DownloadOutcome::new();

        for set in sets {
            let candidates = set.blobs.len();
            let planned = plan(&set.blobs, filter, &set.strip, step.flatten_directories);
            info!(
                source = ?set.source.map(|n| n.get()),
                candidates,
                matched = planned.len(),
                "filtered artifacts"
            );

            let mut outcome = downloader.run(root, planned).await;
            outcome.sources.extend(set.source);
            total.merge(outcome);
        }
        total
    }
}
