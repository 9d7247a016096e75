//! PullerBuilder - Puller の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use crate::app::config::StorageRegistry;
use crate::app::runtime::Puller;
use crate::domain::{AcceptAll, BuildFilter};
use crate::ports::{BlobStorage, BuildHost, IdGenerator, SystemClock, UlidGenerator, Workspace};

/// PullerBuilder は Puller を構築
///
/// # 使用例
/// ```ignore
/// let puller = PullerBuilder::new()
///     .host(host)
///     .storage(storage)
///     .workspace(workspace)
///     .registry(registry)
///     .expect_accounts(&["main"])
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - host / storage / workspace は必須。足りなければ build() でエラー
/// - expect_accounts() で指定したアカウントが registry に無ければエラー
#[derive(Default)]
pub struct PullerBuilder {
    host: Option<Arc<dyn BuildHost>>,
    storage: Option<Arc<dyn BlobStorage>>,
    workspace: Option<Arc<dyn Workspace>>,
    registry: StorageRegistry,
    ids: Option<Arc<dyn IdGenerator>>,
    filter: Option<Arc<dyn BuildFilter>>,
    expected_accounts: Option<Vec<String>>,
}

/// BuildError は Puller 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing ports: {0:?}. These must be set before build().")]
    MissingPorts(Vec<&'static str>),

    #[error("Missing storage accounts: {0:?}. These accounts were expected but not configured.")]
    MissingAccounts(Vec<String>),
}

impl PullerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: Arc<dyn BuildHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn BlobStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn workspace(mut self, workspace: Arc<dyn Workspace>) -> Self {
        self.workspace = Some(workspace);
        self
    }

    /// 起動時に読み込んだ registry のスナップショット
    pub fn registry(mut self, registry: StorageRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// 既定は `UlidGenerator<SystemClock>`
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// 既定は `AcceptAll`
    pub fn build_filter(mut self, filter: Arc<dyn BuildFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// 設定されているべきアカウント名のリスト
    pub fn expect_accounts(mut self, names: &[&str]) -> Self {
        self.expected_accounts = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// # 検証
    /// - 必須 port が全て設定されているか
    /// - expect_accounts() の名前が全て registry で引けるか
    pub fn build(self) -> Result<Puller, BuildError> {
        let mut missing = Vec::new();
        if self.host.is_none() {
            missing.push("host");
        }
        if self.storage.is_none() {
            missing.push("storage");
        }
        if self.workspace.is_none() {
            missing.push("workspace");
        }

        let (Some(host), Some(storage), Some(workspace)) = (self.host, self.storage, self.workspace)
        else {
            return Err(BuildError::MissingPorts(missing));
        };

        if let Some(expected) = &self.expected_accounts {
            let missing_accounts: Vec<String> = expected
                .iter()
                .filter(|name| self.registry.lookup(name).is_none())
                .cloned()
                .collect();
            if !missing_accounts.is_empty() {
                return Err(BuildError::MissingAccounts(missing_accounts));
            }
        }

        Ok(Puller {
            host,
            storage,
            workspace,
            registry: self.registry,
            ids: self
                .ids
                .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock))),
            filter: self.filter.unwrap_or_else(|| Arc::new(AcceptAll)),
        })
    }
}
