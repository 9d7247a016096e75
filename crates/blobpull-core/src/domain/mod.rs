//! Domain model (runs, selectors, artifacts, filters, outcomes, ...).
//!
//! ここにあるのは純粋な値とポリシーだけ。host や blob store への
//! アクセスは ports 経由で app 層が行う。

pub mod account;
pub mod artifact;
pub mod env;
pub mod errors;
pub mod filter;
pub mod ids;
pub mod outcome;
pub mod run;
pub mod selector;

pub use account::{StorageAccountInfo, canonical_endpoint, is_valid_container_name};
pub use artifact::{ArtifactRecord, BlobRef};
pub use env::EnvVars;
pub use errors::{ErrorKind, PullError, Result};
pub use filter::{FilterSpec, PlannedFile, StripRule};
pub use ids::{BuildNumber, InvocationId};
pub use outcome::{DownloadOutcome, FileResult, FileStatus, StepReport};
pub use run::{RunInfo, RunResult, UpstreamCause};
pub use selector::{AcceptAll, BuildFilter, BuildSelector, Permalink, StatusThreshold};
