//! # Notiflow インフラ層
//!
//! 通知配信で使う外部システムとの接続・通信を担当する。
//!
//! ## 設計方針
//!
//! ディスパッチャが依存するインターフェース（トレイト）と、その具体実装を提供する。
//! ディスパッチャはトレイトにのみ依存し、テストではインメモリのモックに差し替える。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理とマイグレーション
//! - **リポジトリ**: ディレクトリ参照、通知の読み込み、受信者・配信履歴の保存
//! - **メールトランスポート**: SMTP（lettre）による送信、Noop
//! - **添付ファイル**: S3 からの添付ファイル取得
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリ実装
//! - [`transport`] - メールトランスポート
//! - [`attachment`] - 添付ファイルストア
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use notiflow_infra::{db, repository::PostgresDirectoryRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/notiflow").await?;
//!     let directory = PostgresDirectoryRepository::new(pool.clone());
//!     Ok(())
//! }
//! ```

pub mod attachment;
pub mod db;
pub mod error;
pub mod repository;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::{InfraError, InfraErrorKind};
