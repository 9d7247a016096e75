//! BlobStorage port - Blob ストア（一覧・取得・アカウント検証）
//!
//! 認証や転送レベルのリトライは実装側の責務。core からは
//! 1 回の呼び出しが成功か失敗かだけが見える。

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::domain::errors::Result;
use crate::domain::{BlobRef, StorageAccountInfo};

/// Byte stream of one blob. Read errors surface as `std::io::Error`.
pub type BlobReader = Box<dyn AsyncRead + Send + Unpin>;

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Blobs of `container` whose path starts with `prefix`, in store order.
    async fn list_container(
        &self,
        account: &StorageAccountInfo,
        container: &str,
        prefix: &str,
    ) -> Result<Vec<BlobRef>>;

    /// Open one blob for streaming.
    async fn open_read(&self, account: &StorageAccountInfo, blob: &BlobRef) -> Result<BlobReader>;

    /// Check that the account's credentials are accepted.
    async fn validate_account(&self, account: &StorageAccountInfo) -> Result<()>;
}
