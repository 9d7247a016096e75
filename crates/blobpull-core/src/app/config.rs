//! Configuration: the storage-account registry snapshot and the pull step's
//! own settings.
//!
//! The registry is loaded once at startup and handed to each invocation.
//! Saving only happens through the account-management path, never during a
//! pull.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{PullError, Result};
use crate::domain::{BuildSelector, StorageAccountInfo};

/// Configured storage accounts, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRegistry {
    #[serde(default)]
    accounts: Vec<StorageAccountInfo>,
}

impl StorageRegistry {
    pub fn new(accounts: Vec<StorageAccountInfo>) -> Self {
        Self { accounts }
    }

    pub fn accounts(&self) -> &[StorageAccountInfo] {
        &self.accounts
    }

    /// First account with exactly this name, endpoint canonicalized.
    pub fn lookup(&self, name: &str) -> Option<StorageAccountInfo> {
        if name.trim().is_empty() {
            return None;
        }
        self.accounts
            .iter()
            .find(|acc| acc.name == name)
            .map(StorageAccountInfo::canonicalized)
    }

    /// Replace the account with the same name, or append it.
    pub fn upsert(&mut self, account: StorageAccountInfo) {
        match self.accounts.iter_mut().find(|acc| acc.name == account.name) {
            Some(slot) => *slot = account,
            None => self.accounts.push(account),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.accounts.len();
        self.accounts.retain(|acc| acc.name != name);
        self.accounts.len() != before
    }

    /// Read a registry file. A missing file is an empty registry.
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(PullError::io(path, e)),
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| PullError::Config(format!("{}: {e}", path.display())))
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PullError::io(parent, e))?;
        }
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| PullError::Config(format!("{}: {e}", path.display())))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| PullError::io(path, e))
    }
}

/// Settings of one pull step, as the host UI stores them.
///
/// String fields may contain `$VAR` macros; they are expanded against the
/// invoking run's environment at perform time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullStepConfig {
    pub storage_account: String,

    /// Pull straight from this container instead of a selected build.
    #[serde(default)]
    pub container: String,

    /// Listing prefix for container mode; stripped from local paths.
    #[serde(default)]
    pub blob_prefix: String,

    #[serde(default)]
    pub include: String,

    #[serde(default)]
    pub exclude: String,

    #[serde(default)]
    pub download_dir: String,

    #[serde(default)]
    pub flatten_directories: bool,

    #[serde(default)]
    pub include_archive_zips: bool,

    /// Upstream job whose builds are the source.
    #[serde(default)]
    pub project: String,

    #[serde(default)]
    pub selector: BuildSelector,
}

impl PullStepConfig {
    pub fn new(storage_account: impl Into<String>) -> Self {
        Self {
            storage_account: storage_account.into(),
            ..Self::default()
        }
    }

    pub fn from_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn from_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.blob_prefix = prefix.into();
        self
    }

    pub fn with_selector(mut self, selector: BuildSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_patterns(mut self, include: impl Into<String>, exclude: impl Into<String>) -> Self {
        self.include = include.into();
        self.exclude = exclude.into();
        self
    }

    pub fn into_dir(mut self, download_dir: impl Into<String>) -> Self {
        self.download_dir = download_dir.into();
        self
    }

    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten_directories = flatten;
        self
    }

    pub fn with_archive_zips(mut self, include: bool) -> Self {
        self.include_archive_zips = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatusThreshold;
    use crate::domain::account::DEFAULT_BLOB_ENDPOINT;

    fn registry() -> StorageRegistry {
        StorageRegistry::new(vec![
            StorageAccountInfo::new("main", "k1", ""),
            StorageAccountInfo::new("main", "k2", "https://second/"),
            StorageAccountInfo::new("other", "k3", "other.example"),
        ])
    }

    #[test]
    fn lookup_returns_first_match_canonicalized() {
        let acc = registry().lookup("main").unwrap();
        assert_eq!(acc.access_key, "k1");
        assert_eq!(acc.blob_endpoint, DEFAULT_BLOB_ENDPOINT);

        let other = registry().lookup("other").unwrap();
        assert_eq!(other.blob_endpoint, "https://other.example/");
    }

    #[test]
    fn lookup_misses_are_none() {
        assert!(registry().lookup("missing").is_none());
        assert!(registry().lookup("  ").is_none());
        assert!(registry().lookup("Main").is_none());
    }

    #[test]
    fn upsert_replaces_by_name() {
        let mut reg = StorageRegistry::default();
        reg.upsert(StorageAccountInfo::new("a", "k1", ""));
        reg.upsert(StorageAccountInfo::new("b", "k2", ""));
        reg.upsert(StorageAccountInfo::new("a", "k3", ""));
        assert_eq!(reg.accounts().len(), 2);
        assert_eq!(reg.lookup("a").unwrap().access_key, "k3");

        assert!(reg.remove("b"));
        assert!(!reg.remove("b"));
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf/accounts.json");

        let reg = registry();
        reg.save(&path).await.unwrap();
        let loaded = StorageRegistry::load(&path).await.unwrap();
        assert_eq!(loaded, reg);
    }

    #[tokio::test]
    async fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = StorageRegistry::load(&dir.path().join("nope.json")).await.unwrap();
        assert!(loaded.accounts().is_empty());
    }

    #[tokio::test]
    async fn load_garbage_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();
        let err = StorageRegistry::load(&path).await.unwrap_err();
        assert!(matches!(err, PullError::Config(_)));
    }

    #[test]
    fn step_config_defaults() {
        let json = r#"{ "storage_account": "main", "project": "app" }"#;
        let step: PullStepConfig = serde_json::from_str(json).unwrap();
        assert_eq!(step.container, "");
        assert!(!step.flatten_directories);
        assert!(!step.include_archive_zips);
        assert_eq!(
            step.selector,
            BuildSelector::Status {
                threshold: StatusThreshold::Stable
            }
        );
    }
}
