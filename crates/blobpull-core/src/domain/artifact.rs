//! Blob references and the artifact record attached to a published run.

use serde::{Deserialize, Serialize};

/// One stored object, addressed by container + path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobRef {
    pub container: String,
    pub remote_path: String,
    /// Name shown in reports. Empty means "use the last path segment".
    #[serde(default)]
    pub display_name: String,
}

impl BlobRef {
    /// Display name is left empty; [`BlobRef::label`] falls back to the basename.
    pub fn new(container: impl Into<String>, remote_path: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            remote_path: remote_path.into(),
            display_name: String::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn basename(&self) -> &str {
        basename(&self.remote_path)
    }

    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            self.basename()
        } else {
            &self.display_name
        }
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Blobs published by one completed run, in publish order.
///
/// Written by the publish step at the end of a build. Read-only here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub blobs: Vec<BlobRef>,
}

impl ArtifactRecord {
    pub fn new(blobs: Vec<BlobRef>) -> Self {
        Self { blobs }
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}
