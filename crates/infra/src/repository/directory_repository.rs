//! # DirectoryRepository
//!
//! 配信設定の解決に使うクライアント・組織情報・送信ユーザー・メールアカウント設定を参照する。
//!
//! すべて読み取り専用。見つからない場合は `Ok(None)` を返し、
//! 「設定なし」として扱うかどうかは呼び出し側が決める。
//! 値が解釈できないメールアカウント設定も見つからない扱いにする。

use std::str::FromStr;

use async_trait::async_trait;
use notiflow_domain::directory::{
    AuthMechanism,
    Client,
    ClientId,
    EmailConfig,
    EmailConfigId,
    OrganizationId,
    OrganizationInfo,
    Secret,
    SenderUser,
    SmtpSecurity,
    UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// ディレクトリ参照トレイト
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn find_client(&self, id: &ClientId) -> Result<Option<Client>, InfraError>;

    async fn find_organization_info(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<OrganizationInfo>, InfraError>;

    async fn find_sender_user(&self, id: &UserId) -> Result<Option<SenderUser>, InfraError>;

    async fn find_email_config(&self, id: &EmailConfigId)
    -> Result<Option<EmailConfig>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct ClientRow {
    id:               Uuid,
    request_email:    String,
    request_password: String,
    email_config_id:  Option<Uuid>,
}

#[derive(sqlx::FromRow)]
struct OrganizationInfoRow {
    organization_id: Uuid,
    email:           Option<String>,
    password:        Option<String>,
    email_config_id: Option<Uuid>,
}

#[derive(sqlx::FromRow)]
struct SenderUserRow {
    id:              Uuid,
    email_config_id: Option<Uuid>,
    email_user:      String,
    email_password:  String,
}

#[derive(sqlx::FromRow)]
struct EmailConfigRow {
    id:                 Uuid,
    smtp_host:          String,
    smtp_port:          i32,
    security:           String,
    requires_smtp_auth: bool,
    auth_mechanism:     String,
}

impl TryFrom<EmailConfigRow> for EmailConfig {
    type Error = InfraError;

    fn try_from(row: EmailConfigRow) -> Result<Self, Self::Error> {
        let smtp_port = u16::try_from(row.smtp_port)
            .map_err(|_| InfraError::invalid_data(format!("smtp_port={}", row.smtp_port)))?;
        let security = SmtpSecurity::from_str(&row.security)
            .map_err(|_| InfraError::invalid_data(format!("security={}", row.security)))?;
        let auth_mechanism = AuthMechanism::from_str(&row.auth_mechanism).map_err(|_| {
            InfraError::invalid_data(format!("auth_mechanism={}", row.auth_mechanism))
        })?;

        Ok(Self {
            id: EmailConfigId::from_uuid(row.id),
            smtp_host: row.smtp_host,
            smtp_port,
            security,
            requires_smtp_auth: row.requires_smtp_auth,
            auth_mechanism,
        })
    }
}

/// PostgreSQL 実装の DirectoryRepository
#[derive(Debug, Clone)]
pub struct PostgresDirectoryRepository {
    pool: PgPool,
}

impl PostgresDirectoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryRepository for PostgresDirectoryRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_client(&self, id: &ClientId) -> Result<Option<Client>, InfraError> {
        let row = sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT id, request_email, request_password, email_config_id
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Client {
            id:               ClientId::from_uuid(r.id),
            request_email:    r.request_email,
            request_password: Secret::new(r.request_password),
            email_config_id:  r.email_config_id.map(EmailConfigId::from_uuid),
        }))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_organization_info(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<OrganizationInfo>, InfraError> {
        let row = sqlx::query_as::<_, OrganizationInfoRow>(
            r#"
            SELECT organization_id, email, password, email_config_id
            FROM organization_infos
            WHERE organization_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| OrganizationInfo {
            organization_id: OrganizationId::from_uuid(r.organization_id),
            email:           r.email,
            password:        r.password.map(Secret::new),
            email_config_id: r.email_config_id.map(EmailConfigId::from_uuid),
        }))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_sender_user(&self, id: &UserId) -> Result<Option<SenderUser>, InfraError> {
        let row = sqlx::query_as::<_, SenderUserRow>(
            r#"
            SELECT id, email_config_id, email_user, email_password
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| SenderUser {
            id:              UserId::from_uuid(r.id),
            email_config_id: r.email_config_id.map(EmailConfigId::from_uuid),
            email_user:      r.email_user,
            email_password:  Secret::new(r.email_password),
        }))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_email_config(
        &self,
        id: &EmailConfigId,
    ) -> Result<Option<EmailConfig>, InfraError> {
        let row = sqlx::query_as::<_, EmailConfigRow>(
            r#"
            SELECT id, smtp_host, smtp_port, security, requires_smtp_auth, auth_mechanism
            FROM email_configs
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(usable_email_config))
    }
}

/// 解釈できない行は警告を出して「設定なし」に落とす
///
/// 1 件の壊れた設定で通知全体を止めず、その受信者の送信失敗として扱わせる。
fn usable_email_config(row: EmailConfigRow) -> Option<EmailConfig> {
    let id = row.id;
    match EmailConfig::try_from(row) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(email_config_id = %id, error = %e, "メールアカウント設定を解釈できません");
            None
        }
    }
}
