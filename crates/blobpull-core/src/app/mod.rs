//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせて pull の各段階を実装します。
//!
//! # 主要コンポーネント
//! - **PullerBuilder**: Puller の構築とワイヤリング
//! - **Puller**: 1 回の pull の入口（perform）
//! - **selection**: BuildSelector の評価
//! - **ArtifactResolver**: 選ばれたソースから blob 一覧を作る
//! - **Downloader**: best effort のダウンロードループ
//! - **config**: StorageRegistry と PullStepConfig

pub mod builder;
pub mod config;
pub mod download;
pub mod resolver;
pub mod runtime;
pub mod selection;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, PullerBuilder};
pub use self::config::{PullStepConfig, StorageRegistry};
pub use self::download::Downloader;
pub use self::resolver::{ArtifactResolver, ResolvedSet, Source};
pub use self::runtime::{Puller, UNKNOWN_ACCOUNT};
