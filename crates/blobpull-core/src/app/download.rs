//! Download loop - 1 ファイルずつ取得して結果を記録する
//!
//! 個々の失敗はログに出して `FileResult::failed` として残し、
//! ループは最後まで続ける（best effort）。

use std::path::Path;

use tracing::{debug, warn};

use crate::domain::errors::Result;
use crate::domain::{BlobRef, DownloadOutcome, FileResult, PlannedFile, StorageAccountInfo};
use crate::ports::{BlobStorage, Workspace};

pub struct Downloader<'a> {
    storage: &'a dyn BlobStorage,
    workspace: &'a dyn Workspace,
    account: &'a StorageAccountInfo,
}

impl<'a> Downloader<'a> {
    pub fn new(
        storage: &'a dyn BlobStorage,
        workspace: &'a dyn Workspace,
        account: &'a StorageAccountInfo,
    ) -> Self {
        Self {
            storage,
            workspace,
            account,
        }
    }

    /// Fetch every planned file into `root`, in order.
    pub async fn run(&self, root: &Path, planned: Vec<PlannedFile>) -> DownloadOutcome {
        let mut outcome = DownloadOutcome::new();
        for file in planned {
            let destination = file.destination(root);
            let result = match (file.target, destination) {
                (Ok(_), Some(dest)) => match self.transfer(&file.blob, &dest).await {
                    Ok(bytes) => {
                        debug!(blob = file.blob.label(), dest = %dest.display(), bytes, "downloaded");
                        FileResult::downloaded(file.blob, dest, bytes)
                    }
                    Err(e) => {
                        warn!(blob = %file.blob.remote_path, dest = %dest.display(), error = %e, "download failed");
                        FileResult::failed(file.blob, Some(dest), e.to_string())
                    }
                },
                (Err(e), _) => {
                    warn!(blob = %file.blob.remote_path, error = %e, "skipping blob");
                    FileResult::failed(file.blob, None, e.to_string())
                }
                (Ok(_), None) => FileResult::failed(file.blob, None, "no destination"),
            };
            outcome.push(result);
        }
        outcome
    }

    async fn transfer(&self, blob: &BlobRef, dest: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            self.workspace.ensure_directory(parent).await?;
        }
        let reader = self.storage.open_read(self.account, blob).await?;
        self.workspace.write_stream(dest, reader).await
    }
}
