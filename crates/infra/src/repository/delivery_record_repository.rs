//! # DeliveryRecordRepository
//!
//! 後方互換の配信履歴を追記する。更新・削除は行わない。

use async_trait::async_trait;
use notiflow_domain::delivery_record::DeliveryRecord;
use sqlx::PgPool;

use crate::error::InfraError;

/// 配信履歴リポジトリトレイト
#[async_trait]
pub trait DeliveryRecordRepository: Send + Sync {
    async fn insert(&self, record: &DeliveryRecord) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の DeliveryRecordRepository
#[derive(Debug, Clone)]
pub struct PostgresDeliveryRecordRepository {
    pool: PgPool,
}

impl PostgresDeliveryRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryRecordRepository for PostgresDeliveryRecordRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(record_id = %record.id()))]
    async fn insert(&self, record: &DeliveryRecord) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO delivery_records (
                id, organization_id, user_id,
                subject, mail_text, message_id,
                is_delivered, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(record.organization_id().map(|id| *id.as_uuid()))
        .bind(record.user_id().as_uuid())
        .bind(record.subject())
        .bind(record.mail_text())
        .bind(record.message_id())
        .bind(record.is_delivered())
        .bind(record.created_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
