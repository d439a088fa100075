//! # 通知チャネル
//!
//! 通知 1 件を受信者ごとに配信し、失敗を集約する。
//!
//! ## 処理の流れ（受信者ごと、通知内の順序どおり）
//!
//! 1. 配信設定を解決する
//! 2. 送信元・宛先・件名・HTML 本文からメッセージを組み立てる
//! 3. 厳格検証、だめなら緩和検証。どちらも通らなければ `NOT VALID` として記録し、
//!    認証・添付・送信は行わない
//! 4. 認証情報と添付ファイルを付けて送信する
//! 5. 結果をすぐに保存してから次の受信者に進む
//!
//! 受信者ごとの失敗は記録するだけで処理を続け、最後に 1 つの集約エラーとして返す。

use std::sync::{
    Arc,
    atomic::{AtomicI32, Ordering},
};

use async_trait::async_trait;
use notiflow_domain::{
    delivery::DeliveryConfig,
    message::{OutboundMessage, SendStatus},
    notification::{Notification, NotificationHeader},
};
use notiflow_infra::{attachment::AttachmentStore, transport::MailTransport};
use notiflow_shared::{
    event_log::{error as log_error, event},
    log_business_event,
};

use super::{DeliveryConfigResolver, DeliveryOutcome, OutcomeRecorder};
use crate::error::DispatchError;

/// 疎通確認の応答
pub const CONNECTION_OK: &str = "Ok";

/// 通知キューから呼び出される配信チャネル
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// 通知を全受信者に配信する
    ///
    /// 1 人でも失敗すれば [`DispatchError::Undelivered`] を返す。
    /// 各受信者の結果は戻り値に関係なく受信者の状態として保存済み。
    async fn send_notification(&self, notification: &mut Notification)
    -> Result<(), DispatchError>;

    /// 疎通確認
    fn test_connection(&self) -> String;

    /// 連携用の登録 ID
    fn registration_id(&self) -> i32;

    fn set_registration_id(&self, registration_id: i32);
}

/// メール配信チャネル
pub struct EmailNotificationChannel {
    resolver:        DeliveryConfigResolver,
    recorder:        OutcomeRecorder,
    transport:       Arc<dyn MailTransport>,
    attachments:     Arc<dyn AttachmentStore>,
    registration_id: AtomicI32,
}

impl EmailNotificationChannel {
    pub fn new(
        resolver: DeliveryConfigResolver,
        recorder: OutcomeRecorder,
        transport: Arc<dyn MailTransport>,
        attachments: Arc<dyn AttachmentStore>,
    ) -> Self {
        Self {
            resolver,
            recorder,
            transport,
            attachments,
            registration_id: AtomicI32::new(0),
        }
    }

    /// 認証情報と添付ファイルを付けて送信する
    ///
    /// 添付ファイルの読み込み失敗は、その受信者の送信失敗として扱う。
    async fn transmit(
        &self,
        header: &NotificationHeader,
        config: &DeliveryConfig,
        message: &mut OutboundMessage,
    ) -> SendStatus {
        if let Some(credentials) = &config.credentials {
            message.set_credentials(credentials.clone());
        }

        if let Some(attachment_id) = &header.attachment_id {
            match self.attachments.load(attachment_id).await {
                Ok(files) => {
                    for file in files {
                        message.add_attachment(file);
                    }
                }
                Err(e) => {
                    tracing::error!(
                        error.category = log_error::category::INFRASTRUCTURE,
                        error.kind = log_error::kind::ATTACHMENT,
                        %attachment_id,
                        error = %e,
                        "添付ファイルの読み込みに失敗"
                    );
                    return SendStatus::Failed {
                        detail: format!("添付ファイルの読み込みに失敗: {e}"),
                    };
                }
            }
        }

        self.transport
            .send(config.email_config.as_ref(), message)
            .await
    }
}

#[async_trait]
impl NotificationChannel for EmailNotificationChannel {
    #[tracing::instrument(skip_all, fields(notification_id = %notification.id()))]
    async fn send_notification(
        &self,
        notification: &mut Notification,
    ) -> Result<(), DispatchError> {
        let (header, recipients) = notification.split_mut();
        let mut attempted = 0_usize;
        let mut reasons = Vec::new();

        for recipient in recipients.iter_mut() {
            // 前回の配信で処理済みの受信者には再送しない
            if recipient.is_processed() {
                tracing::debug!(recipient_id = %recipient.id(), "処理済みの受信者をスキップします");
                continue;
            }
            attempted += 1;

            let config = self
                .resolver
                .resolve(
                    &header.client_id,
                    header.organization_id.as_ref(),
                    header.user_id.as_ref(),
                )
                .await
                .map_err(DispatchError::Lookup)?;

            let mut message = OutboundMessage::new(
                &config.from_address,
                recipient.address(),
                &header.description,
                &header.text,
            );

            let outcome = if message.is_deliverable() {
                DeliveryOutcome::Attempted(self.transmit(header, &config, &mut message).await)
            } else {
                DeliveryOutcome::Invalid {
                    reason: format!("NOT VALID - {message}"),
                }
            };

            match &outcome {
                DeliveryOutcome::Attempted(SendStatus::SentOk { message_id }) => {
                    log_business_event!(
                        event.category = event::category::NOTIFICATION,
                        event.action = event::action::NOTIFICATION_SENT,
                        event.entity_type = event::entity_type::RECIPIENT,
                        event.entity_id = %recipient.id(),
                        event.result = event::result::SUCCESS,
                        notification.recipient = %recipient.address(),
                        notification.message_id = %message_id,
                        "通知メール送信成功"
                    );
                }
                DeliveryOutcome::Attempted(SendStatus::Failed { detail }) => {
                    log_business_event!(
                        event.category = event::category::NOTIFICATION,
                        event.action = event::action::NOTIFICATION_FAILED,
                        event.entity_type = event::entity_type::RECIPIENT,
                        event.entity_id = %recipient.id(),
                        event.result = event::result::FAILURE,
                        notification.recipient = %recipient.address(),
                        error = %detail,
                        "通知メール送信失敗"
                    );
                }
                DeliveryOutcome::Invalid { reason } => {
                    log_business_event!(
                        event.category = event::category::NOTIFICATION,
                        event.action = event::action::NOTIFICATION_INVALID,
                        event.entity_type = event::entity_type::RECIPIENT,
                        event.entity_id = %recipient.id(),
                        event.result = event::result::FAILURE,
                        notification.recipient = %recipient.address(),
                        error = %reason,
                        "通知メッセージが不正なため送信しません"
                    );
                }
            }

            self.recorder
                .record(header, recipient, &message, &outcome)
                .await?;

            if let Some(reason) = recipient.error_message() {
                reasons.push(reason.to_string());
            }
        }

        if attempted > 0 {
            let result = if reasons.is_empty() {
                event::result::SUCCESS
            } else {
                event::result::FAILURE
            };
            log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::DISPATCH_COMPLETED,
                event.entity_type = event::entity_type::NOTIFICATION,
                event.entity_id = %header.id,
                event.result = result,
                notification.recipients = attempted,
                notification.failed = reasons.len(),
                "通知の配信が完了しました"
            );
        }

        if reasons.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::Undelivered { reasons })
        }
    }

    fn test_connection(&self) -> String {
        CONNECTION_OK.to_string()
    }

    fn registration_id(&self) -> i32 {
        self.registration_id.load(Ordering::Relaxed)
    }

    fn set_registration_id(&self, registration_id: i32) {
        self.registration_id.store(registration_id, Ordering::Relaxed);
    }
}
