//! FsWorkspace - ローカルディレクトリに書き込む Workspace 実装
//!
//! 書き込みは隣の `.{name}.part` に流し込んでから rename する。
//! 途中で失敗しても既存ファイルは壊れない。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::domain::errors::{PullError, Result};
use crate::ports::{BlobReader, Workspace};

#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.part"))
}

async fn copy_into(partial: &Path, reader: &mut BlobReader) -> std::io::Result<u64> {
    let mut file = tokio::fs::File::create(partial).await?;
    let written = tokio::io::copy(reader, &mut file).await?;
    file.flush().await?;
    Ok(written)
}

#[async_trait]
impl Workspace for FsWorkspace {
    /// Blank means the workspace root; relative paths are joined to it.
    fn resolve(&self, dir: &str) -> PathBuf {
        let dir = dir.trim();
        if dir.is_empty() {
            self.root.clone()
        } else {
            self.root.join(dir)
        }
    }

    async fn ensure_directory(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| PullError::io(path, e))
    }

    async fn write_stream(&self, path: &Path, mut reader: BlobReader) -> Result<u64> {
        let partial = partial_path(path);
        match copy_into(&partial, &mut reader).await {
            Ok(written) => {
                tokio::fs::rename(&partial, path)
                    .await
                    .map_err(|e| PullError::io(path, e))?;
                Ok(written)
            }
            Err(e) => {
                // 作りかけは残さない
                let _ = tokio::fs::remove_file(&partial).await;
                Err(PullError::io(path, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlobRef, StorageAccountInfo};
    use crate::impls::InMemoryBlobStorage;
    use crate::ports::BlobStorage;

    fn bytes(data: &'static [u8]) -> BlobReader {
        Box::new(data)
    }

    #[test]
    fn resolve_joins_relative_dirs() {
        let ws = FsWorkspace::new("/ws");
        assert_eq!(ws.resolve(""), PathBuf::from("/ws"));
        assert_eq!(ws.resolve("out/libs"), PathBuf::from("/ws/out/libs"));
        assert_eq!(ws.resolve("/abs"), PathBuf::from("/abs"));
    }

    #[test]
    fn partial_file_is_a_hidden_sibling() {
        assert_eq!(partial_path(Path::new("/ws/a/f.txt")), PathBuf::from("/ws/a/.f.txt.part"));
    }

    #[tokio::test]
    async fn writes_into_created_directories() {
        let dir = tempfile::tempdir().unwrap();
        let ws = FsWorkspace::new(dir.path());
        let target = ws.resolve("a/b");
        ws.ensure_directory(&target).await.unwrap();
        assert_eq!(ws.write_stream(&target.join("f.txt"), bytes(b"data")).await.unwrap(), 4);
        ws.write_stream(&target.join("f.txt"), bytes(b"again")).await.unwrap();
        assert_eq!(std::fs::read(target.join("f.txt")).unwrap(), b"again");
        assert!(!target.join(".f.txt.part").exists());
    }

    #[tokio::test]
    async fn write_into_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let ws = FsWorkspace::new(dir.path());
        let err = ws
            .write_stream(&dir.path().join("missing/f.txt"), bytes(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, PullError::Io { .. }));
    }

    #[tokio::test]
    async fn broken_stream_keeps_the_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let ws = FsWorkspace::new(dir.path());
        let target = dir.path().join("f.txt");
        ws.write_stream(&target, bytes(b"previous")).await.unwrap();

        let storage = InMemoryBlobStorage::new()
            .with_blob("c", "f.txt", "replacement bytes")
            .breaking_midway("f.txt");
        let account = StorageAccountInfo::new("main", "key", "");
        let reader = storage.open_read(&account, &BlobRef::new("c", "f.txt")).await.unwrap();

        let err = ws.write_stream(&target, reader).await.unwrap_err();
        assert!(matches!(err, PullError::Io { .. }));
        assert_eq!(std::fs::read(&target).unwrap(), b"previous");
        assert!(!dir.path().join(".f.txt.part").exists());
    }
}
