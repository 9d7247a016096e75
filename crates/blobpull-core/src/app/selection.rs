//! Build selection - selector を job の履歴に対して評価する
//!
//! 選べなかった場合は常に `None`。エラーにはしない。

use tracing::debug;

use crate::domain::{BuildFilter, BuildNumber, BuildSelector, EnvVars, RunInfo, StatusThreshold};
use crate::ports::JobHistory;

impl BuildSelector {
    /// Pick the source run from `job`'s history.
    ///
    /// `invoking` is the run that asked for the pull; it is never selected
    /// itself and supplies the upstream causes.
    pub fn select(
        &self,
        job: &dyn JobHistory,
        env: &EnvVars,
        filter: &dyn BuildFilter,
        invoking: &RunInfo,
    ) -> Option<RunInfo> {
        let selectable = |run: &RunInfo| filter.is_selectable(run, env);

        match self {
            BuildSelector::Status { threshold } => {
                newest_with_status(job, *threshold, env, filter, invoking)
            }

            BuildSelector::SpecificNumber { number } => {
                let expanded = env.expand(number);
                let Ok(number) = expanded.parse::<BuildNumber>() else {
                    debug!(number = %expanded, "build number does not parse");
                    return None;
                };
                job.build_by_number(number).filter(|run| selectable(run))
            }

            BuildSelector::Permalink { name } => job.permalink(name).filter(|run| selectable(run)),

            BuildSelector::Upstream { fallback } => {
                let triggered = invoking
                    .upstream_causes
                    .iter()
                    .filter(|cause| cause.job == job.name())
                    .find_map(|cause| job.build_by_number(cause.number).filter(|run| selectable(run)));
                match triggered {
                    Some(run) => Some(run),
                    None => {
                        debug!(job = job.name(), "not triggered by this job, falling back to status");
                        newest_with_status(job, *fallback, env, filter, invoking)
                    }
                }
            }

            BuildSelector::Parameterized { parameter, default } => {
                let chosen = env.get(parameter).and_then(BuildSelector::from_parameter);
                let inner = match chosen {
                    Some(selector) => selector,
                    None => {
                        debug!(parameter = %parameter, "parameter absent or unrecognized");
                        match default.as_deref() {
                            // 入れ子の parameterized はループしうるので既定に落とす
                            Some(BuildSelector::Parameterized { .. }) | None => BuildSelector::default(),
                            Some(selector) => selector.clone(),
                        }
                    }
                };
                inner.select(job, env, filter, invoking)
            }
        }
    }
}

fn newest_with_status(
    job: &dyn JobHistory,
    threshold: StatusThreshold,
    env: &EnvVars,
    filter: &dyn BuildFilter,
    invoking: &RunInfo,
) -> Option<RunInfo> {
    job.builds_newest_first().into_iter().find(|run| {
        let is_invoking = run.job == invoking.job && run.number == invoking.number;
        !is_invoking && threshold.accepts(run.result) && filter.is_selectable(run, env)
    })
}
