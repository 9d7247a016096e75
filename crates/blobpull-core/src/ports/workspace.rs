//! Workspace port - ダウンロード先への書き込み（file-write sink）

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::Result;
use crate::ports::blob_storage::BlobReader;

#[async_trait]
pub trait Workspace: Send + Sync {
    /// Resolve a configured download directory against the workspace root.
    fn resolve(&self, dir: &str) -> PathBuf;

    /// Create `path` and its parents if missing.
    async fn ensure_directory(&self, path: &Path) -> Result<()>;

    /// Stream `reader` into `path` and return the byte count.
    ///
    /// An existing file at `path` is replaced only once the stream has been
    /// read to the end; on failure it is left untouched.
    async fn write_stream(&self, path: &Path, reader: BlobReader) -> Result<u64>;
}
