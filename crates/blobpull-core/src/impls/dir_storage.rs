//! LocalDirStorage - ディレクトリを Blob ストアとして扱う実装
//!
//! `root/<container>/<path>` が 1 blob。CLI の dry run やローカル検証用。
//! 一覧はパスの辞書順で返す。

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::{PullError, Result};
use crate::domain::{BlobRef, StorageAccountInfo};
use crate::ports::{BlobReader, BlobStorage};

#[derive(Debug, Clone)]
pub struct LocalDirStorage {
    root: PathBuf,
}

impl LocalDirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn container_dir(&self, container: &str) -> PathBuf {
        self.root.join(container)
    }
}

/// Every file under `base`, as `/`-joined paths relative to it.
async fn walk(base: &Path) -> std::io::Result<Vec<String>> {
    let mut files = Vec::new();
    let mut pending = vec![base.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if let Ok(rel) = path.strip_prefix(base) {
                let joined = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push(joined);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[async_trait]
impl BlobStorage for LocalDirStorage {
    async fn list_container(
        &self,
        _account: &StorageAccountInfo,
        container: &str,
        prefix: &str,
    ) -> Result<Vec<BlobRef>> {
        let base = self.container_dir(container);
        if !tokio::fs::try_exists(&base).await.unwrap_or(false) {
            return Ok(Vec::new());
        }
        let files = walk(&base).await.map_err(|e| PullError::Listing {
            container: container.to_string(),
            reason: e.to_string(),
        })?;
        Ok(files
            .into_iter()
            .filter(|path| path.starts_with(prefix))
            .map(|path| BlobRef::new(container, path))
            .collect())
    }

    async fn open_read(&self, _account: &StorageAccountInfo, blob: &BlobRef) -> Result<BlobReader> {
        if blob.remote_path.split('/').any(|s| s == "..") {
            return Err(PullError::UnsafePath(blob.remote_path.clone()));
        }
        let path = self.container_dir(&blob.container).join(&blob.remote_path);
        let file = tokio::fs::File::open(&path).await.map_err(|e| PullError::Transfer {
            path: blob.remote_path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(file))
    }

    /// A local directory accepts any account whose container root exists.
    async fn validate_account(&self, account: &StorageAccountInfo) -> Result<()> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(PullError::AccountValidation {
                account: account.name.clone(),
                endpoint: account.blob_endpoint.clone(),
                reason: format!("{} is not a directory", self.root.display()),
            }),
            Err(e) => Err(PullError::AccountValidation {
                account: account.name.clone(),
                endpoint: account.blob_endpoint.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
