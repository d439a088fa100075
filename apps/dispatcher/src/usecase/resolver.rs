//! # 配信設定の解決
//!
//! クライアント・組織・送信ユーザーから、送信元アドレスと
//! 使用するメールアカウント設定、付与する認証情報を決める。
//!
//! ## 優先順位
//!
//! 1. クライアントの既定値（送信元アドレス、パスワード、アカウント設定）
//! 2. 組織情報に 3 項目すべて揃っていれば組織の値で置き換える（一部だけの上書きはしない）
//! 3. 認証は 1〜2 とは独立に決める。送信ユーザーが個人のアカウント設定を持つなら
//!    その設定を使い、SMTP 認証が必要か OAuth の場合にユーザー本人の認証情報を付与する。
//!    そうでなければ 1〜2 のアカウント設定が SMTP 認証を要求する場合だけ、
//!    解決済みのアドレスとパスワードで認証する
//!
//! 参照先のデータが存在しないことはエラーにしない。送信元が空になる、
//! アカウント設定がなくなるといった形で後段の検証・送信で失敗として記録される。

use std::sync::Arc;

use notiflow_domain::{
    delivery::DeliveryConfig,
    directory::{
        ClientId,
        EmailConfig,
        EmailConfigId,
        OrgOverride,
        OrganizationId,
        Secret,
        UserId,
    },
    message::SmtpCredentials,
};
use notiflow_infra::{InfraError, repository::DirectoryRepository};

/// 配信設定リゾルバ
pub struct DeliveryConfigResolver {
    directory: Arc<dyn DirectoryRepository>,
}

impl DeliveryConfigResolver {
    pub fn new(directory: Arc<dyn DirectoryRepository>) -> Self {
        Self { directory }
    }

    /// 配信設定を解決する
    ///
    /// 参照時のインフラエラー（DB 接続断など）だけを返す。
    #[tracing::instrument(skip_all, level = "debug", fields(%client_id))]
    pub async fn resolve(
        &self,
        client_id: &ClientId,
        organization_id: Option<&OrganizationId>,
        sender_user_id: Option<&UserId>,
    ) -> Result<DeliveryConfig, InfraError> {
        let (mut from_address, mut password, mut email_config_id) =
            match self.directory.find_client(client_id).await? {
                Some(client) => (
                    client.request_email,
                    client.request_password,
                    client.email_config_id,
                ),
                None => {
                    tracing::warn!(%client_id, "クライアントが見つかりません");
                    (String::new(), Secret::default(), None)
                }
            };

        let org_override = match organization_id {
            None => OrgOverride::NotRequested,
            Some(organization_id) => {
                match self.directory.find_organization_info(organization_id).await? {
                    None => OrgOverride::NotConfigured,
                    Some(info) => {
                        let status = info.override_status();
                        if let (OrgOverride::Applied, Some(email), Some(pw), Some(config_id)) =
                            (&status, info.email, info.password, info.email_config_id)
                        {
                            from_address = email;
                            password = pw;
                            email_config_id = Some(config_id);
                        }
                        if let OrgOverride::Incomplete { missing } = &status {
                            tracing::warn!(
                                %organization_id,
                                missing = ?missing,
                                "組織の送信設定が不完全なため、クライアントの既定値を使用します"
                            );
                        }
                        status
                    }
                }
            }
        };

        let personal = match sender_user_id {
            Some(user_id) => self
                .directory
                .find_sender_user(user_id)
                .await?
                .and_then(|user| user.email_config_id.clone().map(|id| (user, id))),
            None => None,
        };

        let (email_config, credentials) = match personal {
            Some((user, config_id)) => {
                let config = self.find_email_config(&config_id).await?;
                let credentials = config
                    .as_ref()
                    .filter(|c| c.requires_smtp_auth || c.is_oauth())
                    .map(|c| SmtpCredentials {
                        user:      user.email_user.clone(),
                        password:  user.email_password.clone(),
                        mechanism: c.auth_mechanism,
                    });
                email_config_id = Some(config_id);
                (config, credentials)
            }
            None => {
                let config = match &email_config_id {
                    Some(config_id) => self.find_email_config(config_id).await?,
                    None => None,
                };
                let credentials = config
                    .as_ref()
                    .filter(|c| c.requires_smtp_auth)
                    .map(|c| SmtpCredentials {
                        user:      from_address.clone(),
                        password:  password.clone(),
                        mechanism: c.auth_mechanism,
                    });
                (config, credentials)
            }
        };

        Ok(DeliveryConfig {
            from_address,
            password,
            email_config_id,
            email_config,
            credentials,
            org_override,
        })
    }

    async fn find_email_config(
        &self,
        id: &EmailConfigId,
    ) -> Result<Option<EmailConfig>, InfraError> {
        let config = self.directory.find_email_config(id).await?;
        if config.is_none() {
            tracing::warn!(email_config_id = %id, "メールアカウント設定が見つかりません");
        }
        Ok(config)
    }
}
