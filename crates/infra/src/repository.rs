//! # リポジトリ実装
//!
//! 配信処理が依存するリポジトリトレイトと PostgreSQL 実装を提供する。
//!
//! ## 設計方針
//!
//! - **トレイトで抽象化**: ディスパッチャは `Arc<dyn Trait>` で受け取り、テストではモックに差し替える
//! - **読み取りと書き込みの分離**: ディレクトリ参照は読み取り専用、受信者と配信履歴は書き込み専用
//! - **即時保存**: 受信者の配信結果は 1 件ずつ保存する（バッチにしない）

pub mod delivery_record_repository;
pub mod directory_repository;
pub mod notification_repository;
pub mod recipient_repository;

pub use delivery_record_repository::{DeliveryRecordRepository, PostgresDeliveryRecordRepository};
pub use directory_repository::{DirectoryRepository, PostgresDirectoryRepository};
pub use notification_repository::{NotificationRepository, PostgresNotificationRepository};
pub use recipient_repository::{PostgresRecipientRepository, RecipientRepository};
