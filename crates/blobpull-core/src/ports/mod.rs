//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（ビルド host、Blob ストア、ワークスペース）への
//! インターフェースを提供し、実装の詳細を隠蔽します。

pub mod blob_storage;
pub mod build_host;
pub mod clock;
pub mod id_generator;
pub mod workspace;

// 主要な trait を再エクスポート
pub use self::blob_storage::{BlobReader, BlobStorage};
pub use self::build_host::{BuildHost, JobHistory};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::workspace::Workspace;
