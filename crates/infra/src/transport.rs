//! # メールトランスポート
//!
//! 構造検証済みの送信メッセージを実際に送信する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailTransport` trait で送信方法を抽象化
//! - **2 つの実装**: SMTP（アカウント設定ごとに接続）、Noop（送信しない）
//! - **送信失敗は値で返す**: 失敗は [`SendStatus::Failed`] として返し、
//!   受信者ごとの失敗として記録できるようにする
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択

mod noop;
mod smtp;

use async_trait::async_trait;
pub use noop::NoopMailTransport;
use notiflow_domain::{
    directory::EmailConfig,
    message::{OutboundMessage, SendStatus},
};
pub use smtp::SmtpMailTransport;

/// メール送信トレイト
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// メッセージを送信する
    ///
    /// `account` が `None`（メールアカウント設定が見つからない）の場合、
    /// 実装は送信せずに [`SendStatus::Failed`] を返す。
    async fn send(&self, account: Option<&EmailConfig>, message: &OutboundMessage) -> SendStatus;
}
