//! blobpull-core
//!
//! Core building blocks for pulling build artifacts out of a blob store.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, run, selector, artifact, filter, outcome, account, env, errors）
//! - **ports**: 抽象化レイヤー（BuildHost, BlobStorage, Workspace, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（builder, runtime, selection, resolver, download, config）
//! - **impls**: 実装（InMemoryBuildHost, LocalDirStorage, FsWorkspace など）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
