//! # 配信履歴
//!
//! 既知のユーザーに紐づく受信者について、配信試行ごとに 1 件作成する
//! 後方互換の履歴レコード。追記のみで更新しない。

use chrono::{DateTime, Utc};

use crate::{
    directory::{OrganizationId, UserId},
    message::{OutboundMessage, SendStatus},
};

define_uuid_id! {
    /// 配信履歴 ID
    pub struct DeliveryRecordId;
}

/// 配信履歴
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRecord {
    id:              DeliveryRecordId,
    organization_id: Option<OrganizationId>,
    user_id:         UserId,
    subject:         String,
    mail_text:       String,
    /// 成功時はトランスポートのメッセージ ID、失敗時は失敗内容
    message_id:      String,
    is_delivered:    bool,
    created_at:      DateTime<Utc>,
}

impl DeliveryRecord {
    /// 送信結果から配信履歴を作成する
    pub fn from_status(
        organization_id: Option<OrganizationId>,
        user_id: UserId,
        message: &OutboundMessage,
        status: &SendStatus,
        now: DateTime<Utc>,
    ) -> Self {
        let is_delivered = status.is_sent_ok();
        let message_id = match status {
            SendStatus::SentOk { message_id } => message_id.clone(),
            SendStatus::Failed { detail } => detail.clone(),
        };

        Self {
            id: DeliveryRecordId::new(),
            organization_id,
            user_id,
            subject: message.subject().to_string(),
            mail_text: message.rendered_body(),
            message_id,
            is_delivered,
            created_at: now,
        }
    }

    pub fn id(&self) -> &DeliveryRecordId {
        &self.id
    }

    pub fn organization_id(&self) -> Option<&OrganizationId> {
        self.organization_id.as_ref()
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn mail_text(&self) -> &str {
        &self.mail_text
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn is_delivered(&self) -> bool {
        self.is_delivered
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn message() -> OutboundMessage {
        OutboundMessage::new("from@example.com", "to@example.com", "件名", "<p>本文</p>")
    }

    #[test]
    fn 成功時はメッセージidを保存し配信済みにする() {
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap();
        let user_id = UserId::new();
        let status = SendStatus::SentOk {
            message_id: "<abc@example.com>".to_string(),
        };

        let record = DeliveryRecord::from_status(None, user_id.clone(), &message(), &status, now);

        assert_eq!(record.message_id(), "<abc@example.com>");
        assert!(record.is_delivered());
        assert_eq!(record.user_id(), &user_id);
        assert_eq!(record.subject(), "件名");
        assert_eq!(record.mail_text(), "<p>本文</p>");
        assert_eq!(record.created_at(), now);
    }

    #[test]
    fn 失敗時は失敗内容を保存し未配信にする() {
        let org_id = OrganizationId::new();
        let status = SendStatus::Failed {
            detail: "550 mailbox unavailable".to_string(),
        };

        let record = DeliveryRecord::from_status(
            Some(org_id.clone()),
            UserId::new(),
            &message(),
            &status,
            Utc::now(),
        );

        assert_eq!(record.message_id(), "550 mailbox unavailable");
        assert!(!record.is_delivered());
        assert_eq!(record.organization_id(), Some(&org_id));
    }
}
