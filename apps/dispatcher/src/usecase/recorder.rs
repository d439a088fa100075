//! # 配信結果の記録
//!
//! 受信者 1 人分の配信結果を、次の受信者に進む前に保存する。
//!
//! - 受信者の処理済みフラグ・エラーメッセージを更新して即時保存する
//! - 受信者が既知のユーザーに紐づく場合は、配信履歴を 1 件追加する
//!   （成功時は送信メッセージ ID、失敗時は失敗内容と未配信フラグ）
//!
//! 保存の失敗は回復せず、致命的なエラーとして配信全体を中断する。

use std::sync::Arc;

use notiflow_domain::{
    clock::Clock,
    delivery_record::DeliveryRecord,
    message::{OutboundMessage, SendStatus},
    notification::{NotificationHeader, Recipient},
};
use notiflow_infra::{
    InfraError,
    repository::{DeliveryRecordRepository, RecipientRepository},
};
use notiflow_shared::event_log::error as log_error;

use crate::error::DispatchError;

/// 受信者 1 人分の配信結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 構造検証に失敗し、送信しなかった
    Invalid { reason: String },
    /// 送信を試行した
    Attempted(SendStatus),
}

impl DeliveryOutcome {
    /// 受信者に記録するエラーメッセージ（成功時は `None`）
    pub fn recipient_error(&self, address: &str) -> Option<String> {
        match self {
            Self::Invalid { reason } => Some(reason.clone()),
            Self::Attempted(SendStatus::SentOk { .. }) => None,
            Self::Attempted(SendStatus::Failed { .. }) => {
                Some(format!("Error: Sending to: {address}"))
            }
        }
    }

    /// 配信履歴に残す送信結果
    fn record_status(&self) -> SendStatus {
        match self {
            Self::Invalid { reason } => SendStatus::Failed {
                detail: reason.clone(),
            },
            Self::Attempted(status) => status.clone(),
        }
    }
}

/// 配信結果レコーダー
pub struct OutcomeRecorder {
    recipients:       Arc<dyn RecipientRepository>,
    delivery_records: Arc<dyn DeliveryRecordRepository>,
    clock:            Arc<dyn Clock>,
}

impl OutcomeRecorder {
    pub fn new(
        recipients: Arc<dyn RecipientRepository>,
        delivery_records: Arc<dyn DeliveryRecordRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            recipients,
            delivery_records,
            clock,
        }
    }

    /// 配信結果を受信者に反映して保存する
    #[tracing::instrument(skip_all, level = "debug", fields(recipient_id = %recipient.id()))]
    pub async fn record(
        &self,
        header: &NotificationHeader,
        recipient: &mut Recipient,
        message: &OutboundMessage,
        outcome: &DeliveryOutcome,
    ) -> Result<(), DispatchError> {
        match outcome.recipient_error(recipient.address()) {
            None => recipient.mark_processed(),
            Some(error) => recipient.mark_failed(error)?,
        }

        self.recipients
            .save_outcome(recipient)
            .await
            .map_err(|e| persistence_failure("受信者の保存に失敗", e))?;

        if let Some(user_id) = recipient.user_id() {
            let record = DeliveryRecord::from_status(
                header.organization_id.clone(),
                user_id.clone(),
                message,
                &outcome.record_status(),
                self.clock.now(),
            );
            self.delivery_records
                .insert(&record)
                .await
                .map_err(|e| persistence_failure("配信履歴の保存に失敗", e))?;
        }

        Ok(())
    }
}

fn persistence_failure(message: &'static str, e: InfraError) -> DispatchError {
    tracing::error!(
        error.category = log_error::category::INFRASTRUCTURE,
        error.kind = log_error::kind::DATABASE,
        error = %e,
        "{message}"
    );
    DispatchError::Persistence(e)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use notiflow_domain::{
        clock::FixedClock,
        directory::{ClientId, OrganizationId, UserId},
        notification::{NotificationId, RecipientId},
    };
    use notiflow_infra::mock::{MockDeliveryRecordRepository, MockRecipientRepository};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    struct Fixture {
        recipients: MockRecipientRepository,
        records:    MockDeliveryRecordRepository,
        recorder:   OutcomeRecorder,
        header:     NotificationHeader,
        message:    OutboundMessage,
    }

    fn fixture() -> Fixture {
        let recipients = MockRecipientRepository::new();
        let records = MockDeliveryRecordRepository::new();
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap());
        let recorder = OutcomeRecorder::new(
            Arc::new(recipients.clone()),
            Arc::new(records.clone()),
            Arc::new(clock),
        );
        let header = NotificationHeader {
            id:              NotificationId::new(),
            client_id:       ClientId::new(),
            organization_id: Some(OrganizationId::new()),
            user_id:         None,
            description:     "請求書のお知らせ".to_string(),
            text:            "<p>1 月分</p>".to_string(),
            attachment_id:   None,
        };
        let message = OutboundMessage::new(
            "billing@example.com",
            "to@example.com",
            &header.description,
            &header.text,
        );

        Fixture {
            recipients,
            records,
            recorder,
            header,
            message,
        }
    }

    fn sent() -> DeliveryOutcome {
        DeliveryOutcome::Attempted(SendStatus::SentOk {
            message_id: "<abc@example.com>".to_string(),
        })
    }

    fn failed() -> DeliveryOutcome {
        DeliveryOutcome::Attempted(SendStatus::Failed {
            detail: "550 mailbox unavailable".to_string(),
        })
    }

    #[rstest]
    #[case::成功(sent(), None)]
    #[case::送信失敗(failed(), Some("Error: Sending to: to@example.com"))]
    #[case::検証失敗(
        DeliveryOutcome::Invalid { reason: "NOT VALID - x".to_string() },
        Some("NOT VALID - x")
    )]
    fn 受信者に記録するエラーメッセージ(
        #[case] outcome: DeliveryOutcome,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            outcome.recipient_error("to@example.com").as_deref(),
            expected
        );
    }

    #[tokio::test]
    async fn 成功時は処理済みとして保存し配信履歴にメッセージidを残す() {
        let f = fixture();
        let mut recipient = Recipient::new(RecipientId::new(), "to@example.com", Some(UserId::new()));

        f.recorder
            .record(&f.header, &mut recipient, &f.message, &sent())
            .await
            .unwrap();

        assert!(recipient.is_processed());
        assert_eq!(recipient.error_message(), None);
        assert_eq!(f.recipients.saved(), vec![recipient.clone()]);

        let records = f.records.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message_id(), "<abc@example.com>");
        assert!(records[0].is_delivered());
        assert_eq!(records[0].user_id(), recipient.user_id().unwrap());
        assert_eq!(records[0].organization_id(), f.header.organization_id.as_ref());
        assert_eq!(records[0].subject(), "請求書のお知らせ");
        assert_eq!(
            records[0].created_at(),
            Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn 送信失敗時は失敗内容を未配信として残す() {
        let f = fixture();
        let mut recipient = Recipient::new(RecipientId::new(), "to@example.com", Some(UserId::new()));

        f.recorder
            .record(&f.header, &mut recipient, &f.message, &failed())
            .await
            .unwrap();

        assert!(!recipient.is_processed());
        assert_eq!(
            recipient.error_message(),
            Some("Error: Sending to: to@example.com")
        );
        let records = f.records.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message_id(), "550 mailbox unavailable");
        assert!(!records[0].is_delivered());
    }

    #[tokio::test]
    async fn ユーザーに紐づかない受信者は配信履歴を作らない() {
        let f = fixture();
        let mut recipient = Recipient::new(RecipientId::new(), "to@example.com", None);

        f.recorder
            .record(&f.header, &mut recipient, &f.message, &sent())
            .await
            .unwrap();

        assert_eq!(f.recipients.saved().len(), 1);
        assert!(f.records.records().is_empty());
    }

    #[tokio::test]
    async fn 受信者の保存失敗は致命的エラーになり配信履歴も作らない() {
        let f = fixture();
        f.recipients.fail_after(0);
        let mut recipient = Recipient::new(RecipientId::new(), "to@example.com", Some(UserId::new()));

        let result = f
            .recorder
            .record(&f.header, &mut recipient, &f.message, &sent())
            .await;

        assert!(matches!(result, Err(DispatchError::Persistence(_))));
        assert!(f.records.records().is_empty());
    }
}
