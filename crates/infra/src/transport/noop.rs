//! Noop メールトランスポート
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! 通知を無効化した環境や、配信フローだけを確認したい場合に使用する。

use async_trait::async_trait;
use notiflow_domain::{
    directory::EmailConfig,
    message::{OutboundMessage, SendStatus},
};
use uuid::Uuid;

use super::MailTransport;

/// Noop メールトランスポート（ログ出力のみ）
///
/// 常に送信成功を返す。メッセージ ID は `<uuid@noop>` 形式。
#[derive(Debug, Clone)]
pub struct NoopMailTransport;

#[async_trait]
impl MailTransport for NoopMailTransport {
    async fn send(&self, account: Option<&EmailConfig>, message: &OutboundMessage) -> SendStatus {
        tracing::info!(
            to = %message.to(),
            subject = %message.subject(),
            has_account = account.is_some(),
            attachments = message.attachments().len(),
            "Noop: メール送信をスキップ"
        );
        SendStatus::SentOk {
            message_id: format!("<{}@noop>", Uuid::now_v7()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sendは常に成功を返す() {
        let message = OutboundMessage::new("from@example.com", "to@example.com", "件名", "<p>本文</p>");

        let status = NoopMailTransport.send(None, &message).await;

        assert!(status.is_sent_ok());
        assert!(status.message_id().unwrap().ends_with("@noop>"));
    }
}
