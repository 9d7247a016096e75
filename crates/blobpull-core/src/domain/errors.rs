//! Errors - エラー型と分類
//!
//! 「見つからない」系（ビルド未選択・artifact 記録なし・アカウント未登録）は
//! `Option` で表現し、ここには入れない。

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for blobpull operations.
pub type Result<T> = std::result::Result<T, PullError>;

/// ErrorKind は失敗の運用分類
///
/// # 分類
/// - Config: 設定値の不備（パターン、コンテナ名など）
/// - Selection: ビルド選択の途中で起きた失敗
/// - Resolution: artifact 記録の読み出し・一覧取得の失敗
/// - Transfer: 個別ファイルの転送失敗
/// - Account: ストレージアカウントの解決・検証失敗
/// - Io: ワークスペースへの書き込み失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Selection,
    Resolution,
    Transfer,
    Account,
    Io,
}

/// PullError はドメインエラー
#[derive(Debug, Error)]
pub enum PullError {
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("container name '{0}' is invalid")]
    InvalidContainerName(String),

    #[error("storage account '{0}' is not configured")]
    AccountNotFound(String),

    #[error("storage account '{account}' failed validation against {endpoint}: {reason}")]
    AccountValidation {
        account: String,
        endpoint: String,
        reason: String,
    },

    #[error("environment for run #{run} could not be resolved: {reason}")]
    Environment { run: u32, reason: String },

    #[error("listing container '{container}' failed: {reason}")]
    Listing { container: String, reason: String },

    #[error("artifact record for run #{run} could not be read: {reason}")]
    Record { run: u32, reason: String },

    #[error("blob '{path}' could not be downloaded: {reason}")]
    Transfer { path: String, reason: String },

    #[error("local path for blob '{0}' escapes the download directory")]
    UnsafePath(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl PullError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PullError::InvalidPattern { .. }
            | PullError::InvalidContainerName(_)
            | PullError::Config(_) => ErrorKind::Config,
            PullError::AccountNotFound(_) | PullError::AccountValidation { .. } => {
                ErrorKind::Account
            }
            PullError::Environment { .. } => ErrorKind::Selection,
            PullError::Listing { .. } | PullError::Record { .. } => ErrorKind::Resolution,
            PullError::Transfer { .. } | PullError::UnsafePath(_) => ErrorKind::Transfer,
            PullError::Io { .. } => ErrorKind::Io,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PullError::Io {
            path: path.into(),
            source,
        }
    }
}
