//! # 配信設定
//!
//! 受信者 1 人分の送信に使う、解決済みの配信設定。
//! 永続化されず、受信者の処理が終わると破棄される。

use crate::{
    directory::{EmailConfig, EmailConfigId, OrgOverride, Secret},
    message::SmtpCredentials,
};

/// 解決済みの配信設定
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// 送信元アドレス（クライアント既定値、または組織の上書き）
    pub from_address:    String,
    /// 送信元アドレスに対応するパスワード
    pub password:        Secret,
    /// 送信に使うメールアカウント設定の ID
    ///
    /// 送信ユーザーが個人設定を持つ場合はその ID。それ以外はクライアントまたは組織の ID。
    pub email_config_id: Option<EmailConfigId>,
    /// `email_config_id` が指すメールアカウント設定（見つからなければ `None`）
    pub email_config:    Option<EmailConfig>,
    /// 付与する SMTP 認証情報（不要なら `None`）
    pub credentials:     Option<SmtpCredentials>,
    /// 組織による上書きの判定結果（診断用）
    pub org_override:    OrgOverride,
}

impl DeliveryConfig {
    /// 認証を行うか
    pub fn authenticates(&self) -> bool {
        self.credentials.is_some()
    }
}
