//! InMemoryBuildHost - 開発・テスト用の host
//!
//! ジョブ履歴、artifact 記録、環境変数をメモリ上に持つ。
//! `HostFixture` から JSON で組み立てられるので CLI の dry run にも使う。

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::domain::errors::{PullError, Result};
use crate::domain::{ArtifactRecord, BuildNumber, EnvVars, RunInfo, RunResult};
use crate::ports::{BuildHost, JobHistory};

/// Job history held in memory, newest first.
#[derive(Debug, Clone)]
pub struct InMemoryJob {
    name: String,
    runs: Vec<RunInfo>,
}

impl InMemoryJob {
    /// Runs may be given in any order; they are kept newest (highest number) first.
    pub fn new(name: impl Into<String>, mut runs: Vec<RunInfo>) -> Self {
        runs.sort_by(|a, b| b.number.cmp(&a.number));
        Self {
            name: name.into(),
            runs,
        }
    }
}

impl JobHistory for InMemoryJob {
    fn name(&self) -> &str {
        &self.name
    }

    fn builds_newest_first(&self) -> Vec<RunInfo> {
        self.runs.clone()
    }
}

type RunKey = (String, BuildNumber);

fn key(run: &RunInfo) -> RunKey {
    (run.job.clone(), run.number)
}

/// Host with jobs, records and environments kept in maps.
#[derive(Debug, Default)]
pub struct InMemoryBuildHost {
    jobs: HashMap<String, Arc<InMemoryJob>>,
    records: HashMap<RunKey, ArtifactRecord>,
    environments: HashMap<RunKey, EnvVars>,
    broken_records: HashSet<RunKey>,
    broken_environment: bool,
    results: Mutex<Vec<(RunKey, RunResult)>>,
}

impl InMemoryBuildHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job(mut self, job: InMemoryJob) -> Self {
        self.jobs.insert(job.name.clone(), Arc::new(job));
        self
    }

    pub fn with_record(mut self, run: &RunInfo, record: ArtifactRecord) -> Self {
        self.records.insert(key(run), record);
        self
    }

    pub fn with_environment(mut self, run: &RunInfo, env: EnvVars) -> Self {
        self.environments.insert(key(run), env);
        self
    }

    /// Reading the record of `run` fails instead of returning it.
    pub fn with_broken_record(mut self, run: &RunInfo) -> Self {
        self.broken_records.insert(key(run));
        self
    }

    /// Every environment lookup fails.
    pub fn with_broken_environment(mut self) -> Self {
        self.broken_environment = true;
        self
    }

    /// Results recorded through `set_result`, oldest first.
    pub fn recorded_results(&self) -> Vec<(String, BuildNumber, RunResult)> {
        self.results
            .lock()
            .map(|guard| {
                guard
                    .iter()
                    .map(|((job, number), result)| (job.clone(), *number, *result))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn last_result_of(&self, run: &RunInfo) -> Option<RunResult> {
        let wanted = key(run);
        self.results.lock().ok().and_then(|guard| {
            guard
                .iter()
                .rev()
                .find(|(k, _)| *k == wanted)
                .map(|(_, result)| *result)
        })
    }
}

impl BuildHost for InMemoryBuildHost {
    fn environment(&self, run: &RunInfo) -> Result<EnvVars> {
        if self.broken_environment {
            return Err(PullError::Environment {
                run: run.number.get(),
                reason: "environment is unavailable".to_string(),
            });
        }
        let mut env = self.environments.get(&key(run)).cloned().unwrap_or_default();
        if env.get("BUILD_NUMBER").is_none() {
            env.insert("BUILD_NUMBER", run.number.to_string());
        }
        if env.get("JOB_NAME").is_none() {
            env.insert("JOB_NAME", run.job.clone());
        }
        Ok(env)
    }

    fn find_job(&self, full_name: &str) -> Option<Arc<dyn JobHistory>> {
        self.jobs
            .get(full_name)
            .map(|job| Arc::clone(job) as Arc<dyn JobHistory>)
    }

    fn artifact_record(&self, run: &RunInfo) -> Result<Option<ArtifactRecord>> {
        let k = key(run);
        if self.broken_records.contains(&k) {
            return Err(PullError::Record {
                run: run.number.get(),
                reason: "record is unreadable".to_string(),
            });
        }
        Ok(self.records.get(&k).cloned())
    }

    fn set_result(&self, run: &RunInfo, result: RunResult) {
        if let Ok(mut guard) = self.results.lock() {
            guard.push((key(run), result));
        }
    }
}

/// JSON description of a host, for dry runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostFixture {
    #[serde(default)]
    pub jobs: Vec<JobFixture>,
    #[serde(default)]
    pub records: Vec<RecordFixture>,
    #[serde(default)]
    pub environments: Vec<EnvironmentFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFixture {
    pub name: String,
    #[serde(default)]
    pub runs: Vec<RunInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFixture {
    pub job: String,
    pub number: BuildNumber,
    #[serde(flatten)]
    pub record: ArtifactRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentFixture {
    pub job: String,
    pub number: BuildNumber,
    pub env: EnvVars,
}

impl HostFixture {
    /// Run `number` of `job`, searching composite children too.
    pub fn find_run(&self, job: &str, number: BuildNumber) -> Option<RunInfo> {
        fn walk(runs: &[RunInfo], job: &str, number: BuildNumber) -> Option<RunInfo> {
            runs.iter().find_map(|run| {
                if run.job == job && run.number == number {
                    Some(run.clone())
                } else {
                    walk(&run.children, job, number)
                }
            })
        }
        self.jobs.iter().find_map(|j| walk(&j.runs, job, number))
    }

    pub fn into_host(self) -> InMemoryBuildHost {
        let mut host = InMemoryBuildHost::new();
        for job in self.jobs {
            host = host.with_job(InMemoryJob::new(job.name, job.runs));
        }
        for rec in self.records {
            host.records.insert((rec.job, rec.number), rec.record);
        }
        for env in self.environments {
            host.environments.insert((env.job, env.number), env.env);
        }
        host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BlobRef;

    #[test]
    fn job_history_is_sorted_newest_first() {
        let job = InMemoryJob::new(
            "app",
            vec![RunInfo::new("app", 1), RunInfo::new("app", 3), RunInfo::new("app", 2)],
        );
        let numbers: Vec<u32> = job
            .builds_newest_first()
            .iter()
            .map(|r| r.number.get())
            .collect();
        assert_eq!(numbers, vec![3, 2, 1]);
        assert_eq!(
            job.build_by_number(BuildNumber::new(2)).map(|r| r.number.get()),
            Some(2)
        );
        assert!(job.build_by_number(BuildNumber::new(9)).is_none());
    }

    #[test]
    fn environment_carries_build_defaults() {
        let run = RunInfo::new("deploy", 8);
        let host = InMemoryBuildHost::new()
            .with_environment(&run, EnvVars::new().with("TARGET", "prod"));
        let env = host.environment(&run).unwrap();
        assert_eq!(env.get("TARGET"), Some("prod"));
        assert_eq!(env.get("BUILD_NUMBER"), Some("8"));
        assert_eq!(env.get("JOB_NAME"), Some("deploy"));
    }

    #[test]
    fn results_are_recorded_per_run() {
        let run = RunInfo::new("deploy", 8);
        let host = InMemoryBuildHost::new();
        host.set_result(&run, RunResult::Unstable);
        assert_eq!(host.last_result_of(&run), Some(RunResult::Unstable));
        assert_eq!(host.recorded_results().len(), 1);
        assert_eq!(host.last_result_of(&RunInfo::new("deploy", 9)), None);
    }

    #[test]
    fn fixture_builds_a_host() {
        let json = r#"{
          "jobs": [
            { "name": "app", "runs": [
              { "job": "app", "number": 2, "result": "SUCCESS",
                "children": [ { "job": "app/os=linux", "number": 2, "result": "SUCCESS" } ] }
            ] }
          ],
          "records": [
            { "job": "app/os=linux", "number": 2,
              "blobs": [ { "container": "artifacts", "remote_path": "app/2/bin/tool" } ] }
          ]
        }"#;
        let fixture: HostFixture = serde_json::from_str(json).unwrap();
        let child = fixture.find_run("app/os=linux", BuildNumber::new(2)).unwrap();
        let host = fixture.into_host();

        assert!(host.find_job("app").is_some());
        assert!(host.find_job("nope").is_none());
        let record = host.artifact_record(&child).unwrap().unwrap();
        assert_eq!(record.blobs, vec![BlobRef::new("artifacts", "app/2/bin/tool")]);
    }

    #[test]
    fn broken_record_is_an_error() {
        let run = RunInfo::new("app", 1);
        let host = InMemoryBuildHost::new().with_broken_record(&run);
        assert!(host.artifact_record(&run).is_err());
    }
}
