//! # RecipientRepository
//!
//! 受信者の配信結果（処理済みフラグ・エラーメッセージ）を保存する。
//!
//! 配信途中でプロセスが落ちても処理済みの受信者が正しく残るよう、
//! 配信試行ごとに 1 件ずつ即時に保存する。

use async_trait::async_trait;
use notiflow_domain::notification::Recipient;
use sqlx::PgPool;

use crate::error::InfraError;

/// 受信者リポジトリトレイト
#[async_trait]
pub trait RecipientRepository: Send + Sync {
    /// 配信結果を保存する
    ///
    /// 受信者が存在しない場合もエラーとする。
    async fn save_outcome(&self, recipient: &Recipient) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の RecipientRepository
#[derive(Debug, Clone)]
pub struct PostgresRecipientRepository {
    pool: PgPool,
}

impl PostgresRecipientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientRepository for PostgresRecipientRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(recipient_id = %recipient.id()))]
    async fn save_outcome(&self, recipient: &Recipient) -> Result<(), InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE notification_recipients
            SET processed = $2, error_message = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(recipient.id().as_uuid())
        .bind(recipient.is_processed())
        .bind(recipient.error_message())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::unexpected(format!(
                "受信者が存在しません: {}",
                recipient.id()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresRecipientRepository>();
    }
}
