//! # NotificationRepository
//!
//! 配信対象の通知を受信者込みで読み込む。
//! 受信者はキュー登録順（`seq_no`）で返す。配信順と集約エラーの順序はこの順に従う。

use async_trait::async_trait;
use notiflow_domain::{
    directory::{ClientId, OrganizationId, UserId},
    notification::{
        AttachmentId,
        Notification,
        NotificationHeader,
        NotificationId,
        Recipient,
        RecipientId,
    },
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 通知リポジトリトレイト
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 通知を受信者込みで取得する
    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id:              Uuid,
    client_id:       Uuid,
    organization_id: Option<Uuid>,
    user_id:         Option<Uuid>,
    description:     String,
    text:            String,
    attachment_id:   Option<Uuid>,
}

#[derive(sqlx::FromRow)]
struct RecipientRow {
    id:            Uuid,
    address:       String,
    user_id:       Option<Uuid>,
    processed:     bool,
    error_message: Option<String>,
}

impl From<NotificationRow> for NotificationHeader {
    fn from(row: NotificationRow) -> Self {
        Self {
            id:              NotificationId::from_uuid(row.id),
            client_id:       ClientId::from_uuid(row.client_id),
            organization_id: row.organization_id.map(OrganizationId::from_uuid),
            user_id:         row.user_id.map(UserId::from_uuid),
            description:     row.description,
            text:            row.text,
            attachment_id:   row.attachment_id.map(AttachmentId::from_uuid),
        }
    }
}

impl From<RecipientRow> for Recipient {
    fn from(row: RecipientRow) -> Self {
        Recipient::from_db(
            RecipientId::from_uuid(row.id),
            row.address,
            row.user_id.map(UserId::from_uuid),
            row.processed,
            row.error_message,
        )
    }
}

/// PostgreSQL 実装の NotificationRepository
#[derive(Debug, Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, InfraError> {
        let Some(header) = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, client_id, organization_id, user_id, description, text, attachment_id
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let recipients = sqlx::query_as::<_, RecipientRow>(
            r#"
            SELECT id, address, user_id, processed, error_message
            FROM notification_recipients
            WHERE notification_id = $1
            ORDER BY seq_no
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Notification::new(
            header.into(),
            recipients.into_iter().map(Recipient::from).collect(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresNotificationRepository>();
    }

    #[test]
    fn nullの列はnoneに変換される() {
        let row = NotificationRow {
            id:              Uuid::now_v7(),
            client_id:       Uuid::now_v7(),
            organization_id: None,
            user_id:         None,
            description:     "件名".to_string(),
            text:            String::new(),
            attachment_id:   None,
        };

        let header = NotificationHeader::from(row);

        assert!(header.organization_id.is_none());
        assert!(header.user_id.is_none());
        assert!(header.attachment_id.is_none());
    }
}
