//! # ユースケース層
//!
//! 通知 1 件を受信者ごとに配信する処理を実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・トランスポートを `Arc<dyn Trait>` で外部から注入
//! - **逐次処理**: 受信者は通知内の順序どおりに 1 人ずつ処理し、集約エラーの順序を保つ
//!
//! ## モジュール構成
//!
//! - `resolver`: 配信設定の解決（クライアント → 組織 → 送信ユーザー）
//! - `channel`: 受信者ごとの配信と失敗の集約
//! - `recorder`: 受信者の状態と配信履歴の保存

pub mod channel;
pub mod recorder;
pub mod resolver;

pub use channel::{EmailNotificationChannel, NotificationChannel};
pub use recorder::{DeliveryOutcome, OutcomeRecorder};
pub use resolver::DeliveryConfigResolver;
