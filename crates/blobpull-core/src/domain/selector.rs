//! Build selector model: which historical run of the target job to pull from.
//!
//! The selector is a plain value (tagged union). Evaluation against a job's
//! history lives in `app::selection`; this module only holds the policy
//! shapes and the pure predicates over run results.

use serde::{Deserialize, Serialize};

use super::env::EnvVars;
use super::run::{RunInfo, RunResult};

/// Predicate applied to each candidate run while scanning history.
pub trait BuildFilter: Send + Sync {
    fn is_selectable(&self, run: &RunInfo, env: &EnvVars) -> bool;
}

/// Lets every run through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl BuildFilter for AcceptAll {
    fn is_selectable(&self, _run: &RunInfo, _env: &EnvVars) -> bool {
        true
    }
}

impl<F> BuildFilter for F
where
    F: Fn(&RunInfo, &EnvVars) -> bool + Send + Sync,
{
    fn is_selectable(&self, run: &RunInfo, env: &EnvVars) -> bool {
        self(run, env)
    }
}

/// Result threshold of the status selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusThreshold {
    /// Only `SUCCESS`.
    #[default]
    Stable,
    /// `SUCCESS` or `UNSTABLE`.
    Successful,
    /// Only `UNSTABLE`.
    Unstable,
    /// Any finished run, whatever the result.
    Completed,
}

impl StatusThreshold {
    pub fn accepts(self, result: Option<RunResult>) -> bool {
        let Some(result) = result else {
            return false;
        };
        match self {
            StatusThreshold::Stable => result == RunResult::Success,
            StatusThreshold::Successful => result.is_better_or_equal_to(RunResult::Unstable),
            StatusThreshold::Unstable => result == RunResult::Unstable,
            StatusThreshold::Completed => true,
        }
    }
}

/// Named aliases a job exposes for "the latest run with some property".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permalink {
    LastBuild,
    LastStableBuild,
    LastSuccessfulBuild,
    LastFailedBuild,
    LastUnstableBuild,
    LastUnsuccessfulBuild,
    LastCompletedBuild,
}

impl Permalink {
    pub fn parse(name: &str) -> Option<Self> {
        let link = match name.trim() {
            "lastBuild" => Permalink::LastBuild,
            "lastStableBuild" => Permalink::LastStableBuild,
            "lastSuccessfulBuild" => Permalink::LastSuccessfulBuild,
            "lastFailedBuild" => Permalink::LastFailedBuild,
            "lastUnstableBuild" => Permalink::LastUnstableBuild,
            "lastUnsuccessfulBuild" => Permalink::LastUnsuccessfulBuild,
            "lastCompletedBuild" => Permalink::LastCompletedBuild,
            _ => return None,
        };
        Some(link)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Permalink::LastBuild => "lastBuild",
            Permalink::LastStableBuild => "lastStableBuild",
            Permalink::LastSuccessfulBuild => "lastSuccessfulBuild",
            Permalink::LastFailedBuild => "lastFailedBuild",
            Permalink::LastUnstableBuild => "lastUnstableBuild",
            Permalink::LastUnsuccessfulBuild => "lastUnsuccessfulBuild",
            Permalink::LastCompletedBuild => "lastCompletedBuild",
        }
    }

    pub fn matches(self, run: &RunInfo) -> bool {
        match self {
            Permalink::LastBuild => true,
            Permalink::LastStableBuild => run.result == Some(RunResult::Success),
            Permalink::LastSuccessfulBuild => StatusThreshold::Successful.accepts(run.result),
            Permalink::LastFailedBuild => run.result == Some(RunResult::Failure),
            Permalink::LastUnstableBuild => run.result == Some(RunResult::Unstable),
            Permalink::LastUnsuccessfulBuild => {
                matches!(run.result, Some(r) if r != RunResult::Success)
            }
            Permalink::LastCompletedBuild => run.is_complete(),
        }
    }

    /// First run of a newest-first history this permalink points to.
    pub fn resolve<'a, I>(self, newest_first: I) -> Option<RunInfo>
    where
        I: IntoIterator<Item = &'a RunInfo>,
    {
        newest_first.into_iter().find(|run| self.matches(run)).cloned()
    }
}

/// Policy for choosing the source run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildSelector {
    /// Newest run whose result meets the threshold.
    Status {
        #[serde(default)]
        threshold: StatusThreshold,
    },

    /// Exact build number; macro-expanded before parsing.
    SpecificNumber { number: String },

    /// A permalink exposed by the job, e.g. `lastSuccessfulBuild`.
    Permalink { name: String },

    /// The upstream run that triggered the invoking run, else the newest run
    /// meeting `fallback`.
    Upstream {
        #[serde(default)]
        fallback: StatusThreshold,
    },

    /// Selector named by an environment variable of the invoking run.
    Parameterized {
        parameter: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Box<BuildSelector>>,
    },
}

impl Default for BuildSelector {
    fn default() -> Self {
        BuildSelector::Status {
            threshold: StatusThreshold::Stable,
        }
    }
}

impl BuildSelector {
    /// Parse a parameter value into a concrete selector.
    ///
    /// Accepts shorthand names, `permalink:<name>`, a plain build number, or
    /// a JSON selector. Nested parameterized selectors are refused.
    pub fn from_parameter(value: &str) -> Option<BuildSelector> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        if value.starts_with('{') {
            return match serde_json::from_str::<BuildSelector>(value) {
                Ok(BuildSelector::Parameterized { .. }) | Err(_) => None,
                Ok(selector) => Some(selector),
            };
        }

        if let Some(name) = value.strip_prefix("permalink:") {
            return Permalink::parse(name).map(|link| BuildSelector::Permalink {
                name: link.as_str().to_string(),
            });
        }

        if value.bytes().all(|b| b.is_ascii_digit()) {
            return Some(BuildSelector::SpecificNumber {
                number: value.to_string(),
            });
        }

        let status = |threshold| Some(BuildSelector::Status { threshold });
        match value {
            "lastStable" | "stable" => status(StatusThreshold::Stable),
            "lastSuccessful" | "successful" => status(StatusThreshold::Successful),
            "lastUnstable" | "unstable" => status(StatusThreshold::Unstable),
            "lastCompleted" | "completed" => status(StatusThreshold::Completed),
            "upstream" | "triggered" => Some(BuildSelector::Upstream {
                fallback: StatusThreshold::Stable,
            }),
            other => Permalink::parse(other).map(|link| BuildSelector::Permalink {
                name: link.as_str().to_string(),
            }),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            BuildSelector::Status { threshold } => format!("status({threshold:?})"),
            BuildSelector::SpecificNumber { number } => format!("build #{number}"),
            BuildSelector::Permalink { name } => format!("permalink {name}"),
            BuildSelector::Upstream { fallback } => format!("upstream (else {fallback:?})"),
            BuildSelector::Parameterized { parameter, .. } => format!("parameter ${parameter}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::stable_ok(StatusThreshold::Stable, Some(RunResult::Success), true)]
    #[case::stable_rejects_unstable(StatusThreshold::Stable, Some(RunResult::Unstable), false)]
    #[case::successful_takes_unstable(StatusThreshold::Successful, Some(RunResult::Unstable), true)]
    #[case::successful_rejects_failure(StatusThreshold::Successful, Some(RunResult::Failure), false)]
    #[case::unstable_only(StatusThreshold::Unstable, Some(RunResult::Success), false)]
    #[case::completed_takes_failure(StatusThreshold::Completed, Some(RunResult::Failure), true)]
    #[case::in_progress_never(StatusThreshold::Completed, None, false)]
    fn threshold_accepts(
        #[case] threshold: StatusThreshold,
        #[case] result: Option<RunResult>,
        #[case] expected: bool,
    ) {
        assert_eq!(threshold.accepts(result), expected);
    }

    #[test]
    fn accept_all_and_closure_filters() {
        let run = RunInfo::new("app", 3).with_result(RunResult::Success);
        let env = EnvVars::new();
        assert!(AcceptAll.is_selectable(&run, &env));

        let odd_only = |run: &RunInfo, _: &EnvVars| run.number.get() % 2 == 1;
        assert!(odd_only.is_selectable(&run, &env));
        assert!(!odd_only.is_selectable(&RunInfo::new("app", 4), &env));
    }

    #[test]
    fn default_selector_is_stable_status() {
        assert_eq!(
            BuildSelector::default(),
            BuildSelector::Status {
                threshold: StatusThreshold::Stable
            }
        );
    }

    #[test]
    fn permalink_resolves_newest_match() {
        let history = vec![
            RunInfo::new("app", 5),
            RunInfo::new("app", 4).with_result(RunResult::Failure),
            RunInfo::new("app", 3).with_result(RunResult::Unstable),
            RunInfo::new("app", 2).with_result(RunResult::Success),
        ];
        let pick = |name: &str| {
            Permalink::parse(name)
                .and_then(|p| p.resolve(&history))
                .map(|r| r.number.get())
        };
        assert_eq!(pick("lastBuild"), Some(5));
        assert_eq!(pick("lastCompletedBuild"), Some(4));
        assert_eq!(pick("lastFailedBuild"), Some(4));
        assert_eq!(pick("lastUnsuccessfulBuild"), Some(4));
        assert_eq!(pick("lastSuccessfulBuild"), Some(3));
        assert_eq!(pick("lastUnstableBuild"), Some(3));
        assert_eq!(pick("lastStableBuild"), Some(2));
        assert_eq!(pick("nonsense"), None);
    }

    #[rstest]
    #[case::shorthand("lastSuccessful", Some(BuildSelector::Status { threshold: StatusThreshold::Successful }))]
    #[case::number(" 17 ", Some(BuildSelector::SpecificNumber { number: "17".into() }))]
    #[case::permalink_prefix("permalink:lastStableBuild", Some(BuildSelector::Permalink { name: "lastStableBuild".into() }))]
    #[case::bare_permalink("lastFailedBuild", Some(BuildSelector::Permalink { name: "lastFailedBuild".into() }))]
    #[case::upstream("triggered", Some(BuildSelector::Upstream { fallback: StatusThreshold::Stable }))]
    #[case::json(r#"{"kind":"status","threshold":"completed"}"#, Some(BuildSelector::Status { threshold: StatusThreshold::Completed }))]
    #[case::nested_refused(r#"{"kind":"parameterized","parameter":"X"}"#, None)]
    #[case::broken_json("{not json", None)]
    #[case::unknown("whatever", None)]
    #[case::empty("  ", None)]
    fn parameter_values(#[case] value: &str, #[case] expected: Option<BuildSelector>) {
        assert_eq!(BuildSelector::from_parameter(value), expected);
    }

    #[test]
    fn selector_json_shape() {
        let sel = BuildSelector::Parameterized {
            parameter: "PICK".into(),
            default: Some(Box::new(BuildSelector::Permalink {
                name: "lastBuild".into(),
            })),
        };
        let s = serde_json::to_string(&sel).unwrap();
        let v: serde_json::Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v["kind"], "parameterized");
        assert_eq!(v["default"]["kind"], "permalink");

        let back: BuildSelector = serde_json::from_str(&s).unwrap();
        assert_eq!(back, sel);
    }

    #[test]
    fn status_without_threshold_defaults_to_stable() {
        let sel: BuildSelector = serde_json::from_str(r#"{"kind":"status"}"#).unwrap();
        assert_eq!(sel, BuildSelector::default());
    }
}
