//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryBuildHost / InMemoryJob**: テスト・dry run 用の host
//! - **InMemoryBlobStorage**: 失敗注入できる Blob ストア
//! - **LocalDirStorage**: ディレクトリを Blob ストアとして扱う
//! - **FsWorkspace**: ローカルディレクトリへの書き込み

pub mod dir_storage;
pub mod fs_workspace;
pub mod memory_host;
pub mod memory_storage;

// 主要な型を再エクスポート
pub use self::dir_storage::LocalDirStorage;
pub use self::fs_workspace::FsWorkspace;
pub use self::memory_host::{HostFixture, InMemoryBuildHost, InMemoryJob};
pub use self::memory_storage::InMemoryBlobStorage;
