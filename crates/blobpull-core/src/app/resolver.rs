//! Artifact resolution: turn the chosen source into concrete blob lists.
//!
//! A composite build yields one set per child run so each child is filtered
//! and counted on its own. Resolution failures never escape: they are logged
//! and the affected source contributes an empty set.

use tracing::{debug, info, warn};

use crate::domain::{BlobRef, BuildNumber, RunInfo, StorageAccountInfo, StripRule};
use crate::ports::{BlobStorage, BuildHost};

/// Where artifacts come from for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// Direct listing of a container, bypassing build linkage.
    Container { container: String, prefix: String },
    /// The selected run (leaf or composite).
    Build(RunInfo),
    /// No build selected and no container configured.
    Nothing,
}

/// Blobs of one source run (or of a container listing).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSet {
    /// Run the blobs belong to; `None` for a container listing.
    pub source: Option<BuildNumber>,
    pub strip: StripRule,
    pub blobs: Vec<BlobRef>,
}

impl ResolvedSet {
    fn empty(source: Option<BuildNumber>, strip: StripRule) -> Self {
        Self {
            source,
            strip,
            blobs: Vec::new(),
        }
    }
}

pub struct ArtifactResolver<'a> {
    host: &'a dyn BuildHost,
    storage: &'a dyn BlobStorage,
}

impl<'a> ArtifactResolver<'a> {
    pub fn new(host: &'a dyn BuildHost, storage: &'a dyn BlobStorage) -> Self {
        Self { host, storage }
    }

    pub async fn resolve(&self, account: &StorageAccountInfo, source: &Source) -> Vec<ResolvedSet> {
        match source {
            Source::Nothing => {
                info!("no source build selected and no container configured");
                Vec::new()
            }
            Source::Container { container, prefix } => {
                vec![self.list(account, container, prefix).await]
            }
            Source::Build(run) => self.from_records(run),
        }
    }

    async fn list(&self, account: &StorageAccountInfo, container: &str, prefix: &str) -> ResolvedSet {
        let strip = StripRule::Prefix(prefix.to_string());
        match self.storage.list_container(account, container, prefix).await {
            Ok(blobs) => {
                debug!(container, prefix, count = blobs.len(), "listed container");
                ResolvedSet {
                    source: None,
                    strip,
                    blobs,
                }
            }
            Err(e) => {
                warn!(container, prefix, error = %e, "container listing failed");
                ResolvedSet::empty(None, strip)
            }
        }
    }

    /// Leaf runs in reporting order; a composite run is replaced by its children.
    fn from_records(&self, run: &RunInfo) -> Vec<ResolvedSet> {
        let mut pending = vec![run];
        let mut leaves = Vec::new();
        while let Some(current) = pending.pop() {
            if current.is_composite() {
                pending.extend(current.children.iter().rev());
            } else {
                leaves.push(current);
            }
        }

        leaves
            .into_iter()
            .map(|leaf| {
                let strip = StripRule::ThroughBuildNumber(leaf.number);
                match self.host.artifact_record(leaf) {
                    Ok(Some(record)) => {
                        debug!(job = %leaf.job, build = %leaf.number, count = record.len(), "read artifact record");
                        ResolvedSet {
                            source: Some(leaf.number),
                            strip,
                            blobs: record.blobs,
                        }
                    }
                    Ok(None) => {
                        warn!(job = %leaf.job, build = %leaf.number, "run has no artifact record");
                        ResolvedSet::empty(Some(leaf.number), strip)
                    }
                    Err(e) => {
                        warn!(job = %leaf.job, build = %leaf.number, error = %e, "artifact record unreadable");
                        ResolvedSet::empty(Some(leaf.number), strip)
                    }
                }
            })
            .collect()
    }
}
