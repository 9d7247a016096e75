//! InMemoryBlobStorage - 開発・テスト用の Blob ストア
//!
//! 失敗注入（取得失敗、転送途中の切断、一覧失敗、アカウント拒否）ができる。

use std::collections::{BTreeMap, HashSet};
use std::io::Cursor;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, ReadBuf};

use crate::domain::errors::{PullError, Result};
use crate::domain::{BlobRef, StorageAccountInfo};
use crate::ports::{BlobReader, BlobStorage};

/// Yields the first half of a blob, then fails like a dropped connection.
struct BrokenStream {
    head: Cursor<Vec<u8>>,
}

impl AsyncRead for BrokenStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let before = buf.filled().len();
        match Pin::new(&mut self.head).poll_read(cx, buf) {
            Poll::Ready(Ok(())) if buf.filled().len() == before => Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset mid-stream",
            ))),
            other => other,
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBlobStorage {
    /// container -> (path -> bytes), paths kept in insertion order.
    containers: BTreeMap<String, Vec<(String, Vec<u8>)>>,
    failing_paths: HashSet<String>,
    broken_streams: HashSet<String>,
    failing_listings: HashSet<String>,
    rejected_accounts: HashSet<String>,
    fetched: Mutex<Vec<String>>,
}

impl InMemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(mut self, container: &str, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        let entries = self.containers.entry(container.to_string()).or_default();
        let bytes = bytes.into();
        match entries.iter_mut().find(|(p, _)| p == path) {
            Some(slot) => slot.1 = bytes,
            None => entries.push((path.to_string(), bytes)),
        }
        self
    }

    /// Fetching `path` (in any container) fails.
    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing_paths.insert(path.to_string());
        self
    }

    /// Opening `path` succeeds but the stream breaks halfway through.
    pub fn breaking_midway(mut self, path: &str) -> Self {
        self.broken_streams.insert(path.to_string());
        self
    }

    pub fn failing_listing(mut self, container: &str) -> Self {
        self.failing_listings.insert(container.to_string());
        self
    }

    pub fn rejecting_account(mut self, name: &str) -> Self {
        self.rejected_accounts.insert(name.to_string());
        self
    }

    /// Remote paths opened so far, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn list_container(
        &self,
        _account: &StorageAccountInfo,
        container: &str,
        prefix: &str,
    ) -> Result<Vec<BlobRef>> {
        if self.failing_listings.contains(container) {
            return Err(PullError::Listing {
                container: container.to_string(),
                reason: "listing refused".to_string(),
            });
        }
        let blobs = self
            .containers
            .get(container)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(path, _)| path.starts_with(prefix))
                    .map(|(path, _)| BlobRef::new(container, path.as_str()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(blobs)
    }

    async fn open_read(&self, _account: &StorageAccountInfo, blob: &BlobRef) -> Result<BlobReader> {
        if let Ok(mut guard) = self.fetched.lock() {
            guard.push(blob.remote_path.clone());
        }
        if self.failing_paths.contains(&blob.remote_path) {
            return Err(PullError::Transfer {
                path: blob.remote_path.clone(),
                reason: "connection reset".to_string(),
            });
        }
        let mut bytes = self
            .containers
            .get(&blob.container)
            .and_then(|entries| entries.iter().find(|(p, _)| *p == blob.remote_path))
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| PullError::Transfer {
                path: blob.remote_path.clone(),
                reason: "blob not found".to_string(),
            })?;
        if self.broken_streams.contains(&blob.remote_path) {
            bytes.truncate(bytes.len() / 2);
            return Ok(Box::new(BrokenStream { head: Cursor::new(bytes) }));
        }
        Ok(Box::new(Cursor::new(bytes)))
    }

    async fn validate_account(&self, account: &StorageAccountInfo) -> Result<()> {
        if self.rejected_accounts.contains(&account.name) {
            return Err(PullError::AccountValidation {
                account: account.name.clone(),
                endpoint: account.blob_endpoint.clone(),
                reason: "credentials rejected".to_string(),
            });
        }
        Ok(())
    }
}
