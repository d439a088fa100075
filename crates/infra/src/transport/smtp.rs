//! SMTP メールトランスポート
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 接続先と認証方式は通知ごとに解決されたメールアカウント設定に従うため、
//! トランスポートは送信のたびに組み立てる。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Message,
    Tokio1Executor,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::{Credentials, Mechanism},
};
use notiflow_domain::{
    directory::{AuthMechanism, EmailConfig, SmtpSecurity},
    message::{OutboundMessage, SendStatus},
};
use uuid::Uuid;

use super::MailTransport;

/// SMTP メールトランスポート
#[derive(Debug, Clone, Default)]
pub struct SmtpMailTransport;

impl SmtpMailTransport {
    pub fn new() -> Self {
        Self
    }
}

/// 送信処理の途中で発生した失敗（`SendStatus::Failed` の detail になる）
type SendFailure = String;

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, account: Option<&EmailConfig>, message: &OutboundMessage) -> SendStatus {
        let Some(account) = account else {
            return SendStatus::Failed {
                detail: "メールアカウント設定が見つかりません".to_string(),
            };
        };

        match send_with(account, message).await {
            Ok(message_id) => SendStatus::SentOk { message_id },
            Err(detail) => {
                tracing::warn!(
                    smtp_host = %account.smtp_host,
                    to = %message.to(),
                    error = %detail,
                    "SMTP 送信失敗"
                );
                SendStatus::Failed { detail }
            }
        }
    }
}

async fn send_with(account: &EmailConfig, message: &OutboundMessage) -> Result<String, SendFailure> {
    let from: Mailbox = message
        .from()
        .trim()
        .parse()
        .map_err(|e| format!("送信元アドレス不正: {e}"))?;
    let to: Mailbox = message
        .to()
        .trim()
        .parse()
        .map_err(|e| format!("宛先アドレス不正: {e}"))?;

    let message_id = format!("<{}@{}>", Uuid::now_v7(), from.email.domain());
    let email = build_message(from, to, &message_id, message)?;

    let builder = match account.security {
        // TLS なしで接続（ローカル SMTP 向け）
        SmtpSecurity::None => {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&account.smtp_host)
        }
        SmtpSecurity::StartTls => {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&account.smtp_host)
                .map_err(|e| format!("SMTP 接続設定失敗: {e}"))?
        }
        SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&account.smtp_host)
            .map_err(|e| format!("SMTP 接続設定失敗: {e}"))?,
    }
    .port(account.smtp_port);

    let builder = match message.credentials() {
        Some(credentials) => builder
            .credentials(Credentials::new(
                credentials.user.clone(),
                credentials.password.as_str().to_string(),
            ))
            .authentication(vec![mechanism(credentials.mechanism)]),
        None => builder,
    };

    let response = builder
        .build()
        .send(email)
        .await
        .map_err(|e| format!("SMTP 送信失敗: {e}"))?;

    if !response.is_positive() {
        return Err(format!("SMTP 応答エラー: {}", response.code()));
    }

    Ok(message_id)
}

fn build_message(
    from: Mailbox,
    to: Mailbox,
    message_id: &str,
    message: &OutboundMessage,
) -> Result<Message, SendFailure> {
    let builder = Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject())
        .message_id(Some(message_id.to_string()));

    let html = SinglePart::html(message.html_body().to_string());

    let result = if message.attachments().is_empty() {
        builder.singlepart(html)
    } else {
        let mut mixed = MultiPart::mixed().singlepart(html);
        for attachment in message.attachments() {
            // 不明な Content-Type は text/plain として添付する
            let content_type =
                ContentType::parse(&attachment.content_type).unwrap_or(ContentType::TEXT_PLAIN);
            mixed = mixed.singlepart(
                Attachment::new(attachment.file_name.clone())
                    .body(attachment.content.clone(), content_type),
            );
        }
        builder.multipart(mixed)
    };

    result.map_err(|e| format!("メッセージ構築失敗: {e}"))
}

fn mechanism(mechanism: AuthMechanism) -> Mechanism {
    match mechanism {
        AuthMechanism::Login => Mechanism::Login,
        AuthMechanism::Plain => Mechanism::Plain,
        AuthMechanism::OAuth => Mechanism::Xoauth2,
    }
}
