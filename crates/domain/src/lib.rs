//! # Notiflow ドメイン層
//!
//! 通知キューから取り出した 1 件の通知を受信者ごとに配信するための
//! ドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 配信結果を持つ受信者（[`notification::Recipient`]）
//! - **値オブジェクト**: 送信メッセージ、配信設定、認証情報
//! - **純粋なルール**: メッセージの構造検証、配信結果の不変条件
//!
//! ## 依存関係の方向
//!
//! ```text
//! dispatcher → infra → domain
//!      ↘                 ↑
//!        ────────────────
//! ```
//!
//! ドメイン層は DB・SMTP・S3 などの外部システムに一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`notification`] - 通知と受信者
//! - [`directory`] - クライアント・組織・送信ユーザー・メールアカウント設定
//! - [`message`] - 送信メッセージと送信結果
//! - [`delivery`] - 解決済みの配信設定
//! - [`delivery_record`] - 後方互換の配信履歴
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメインエラー

#[macro_use]
mod macros;

pub mod clock;
pub mod delivery;
pub mod delivery_record;
pub mod directory;
pub mod error;
pub mod message;
pub mod notification;

pub use error::DomainError;
