//! # ディレクトリ（送信元情報）
//!
//! 配信設定の解決に使う読み取り専用のレコード群を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`Client`] | クライアント | 既定の送信元アドレス・パスワード・メールアカウント設定 |
//! | [`OrganizationInfo`] | 組織情報 | クライアント既定値の上書き（3 項目すべて揃った場合のみ） |
//! | [`SenderUser`] | 送信ユーザー | 個人のメールアカウント設定と認証情報 |
//! | [`EmailConfig`] | メールアカウント設定 | SMTP サーバーと認証方式 |
//!
//! 旧システムでは ID の `0` が「未設定」を意味したが、ここでは `Option` で表す。

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

define_uuid_id! {
    /// クライアント ID
    pub struct ClientId;
}

define_uuid_id! {
    /// 組織 ID
    pub struct OrganizationId;
}

define_uuid_id! {
    /// ユーザー ID
    ///
    /// 受信者の「既知のユーザー」と、通知の送信ユーザーの両方に使う。
    pub struct UserId;
}

define_uuid_id! {
    /// メールアカウント設定 ID
    pub struct EmailConfigId;
}

/// 秘密情報（SMTP パスワード等）
///
/// Debug 出力では値をマスクする。Display は実装しない。
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Secret").field(&"[REDACTED]").finish()
    }
}

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// SMTP 認証方式
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuthMechanism {
    #[default]
    Login,
    Plain,
    /// OAuth（XOAUTH2）。SMTP 認証フラグに関係なく認証情報を付与する
    #[serde(rename = "oauth")]
    #[strum(to_string = "oauth")]
    OAuth,
}

/// SMTP 接続のセキュリティ
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SmtpSecurity {
    /// 平文（ローカル SMTP 向け）
    None,
    #[default]
    StartTls,
    Tls,
}

/// クライアント
#[derive(Debug, Clone)]
pub struct Client {
    pub id:               ClientId,
    /// 既定の送信元アドレス
    pub request_email:    String,
    pub request_password: Secret,
    pub email_config_id:  Option<EmailConfigId>,
}

/// 組織情報
///
/// 各項目は未設定のことがある。上書きの可否は
/// [`OrganizationInfo::override_status`] で判定する。
#[derive(Debug, Clone)]
pub struct OrganizationInfo {
    pub organization_id: OrganizationId,
    pub email:           Option<String>,
    pub password:        Option<Secret>,
    pub email_config_id: Option<EmailConfigId>,
}

/// 組織による上書きの判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgOverride {
    /// 通知に組織が指定されていない
    NotRequested,
    /// 組織が指定されたが、上書き項目が 1 つも設定されていない
    NotConfigured,
    /// 一部の項目だけ設定されている（クライアント既定値を使う）
    Incomplete { missing: Vec<&'static str> },
    /// 3 項目すべて揃っており、上書きを適用した
    Applied,
}

impl OrganizationInfo {
    /// 上書き項目（e-mail、パスワード、アカウント設定）の充足状況を判定する
    ///
    /// 空文字列は未設定とみなす。
    pub fn override_status(&self) -> OrgOverride {
        let mut missing = Vec::new();
        if self.email.as_deref().is_none_or(|e| e.trim().is_empty()) {
            missing.push("email");
        }
        if self.password.as_ref().is_none_or(Secret::is_empty) {
            missing.push("password");
        }
        if self.email_config_id.is_none() {
            missing.push("email_config_id");
        }

        match missing.len() {
            0 => OrgOverride::Applied,
            3 => OrgOverride::NotConfigured,
            _ => OrgOverride::Incomplete { missing },
        }
    }
}

/// 送信ユーザー
#[derive(Debug, Clone)]
pub struct SenderUser {
    pub id:              UserId,
    /// 個人のメールアカウント設定
    pub email_config_id: Option<EmailConfigId>,
    pub email_user:      String,
    pub email_password:  Secret,
}

/// メールアカウント設定
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub id:                 EmailConfigId,
    pub smtp_host:          String,
    pub smtp_port:          u16,
    pub security:           SmtpSecurity,
    pub requires_smtp_auth: bool,
    pub auth_mechanism:     AuthMechanism,
}

impl EmailConfig {
    pub fn is_oauth(&self) -> bool {
        self.auth_mechanism == AuthMechanism::OAuth
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn org_info(
        email: Option<&str>,
        password: Option<&str>,
        config: Option<EmailConfigId>,
    ) -> OrganizationInfo {
        OrganizationInfo {
            organization_id: OrganizationId::new(),
            email:           email.map(str::to_string),
            password:        password.map(Secret::new),
            email_config_id: config,
        }
    }

    #[test]
    fn 三項目すべて揃うと上書きを適用する() {
        let info = org_info(Some("org@example.com"), Some("pw"), Some(EmailConfigId::new()));
        assert_eq!(info.override_status(), OrgOverride::Applied);
    }

    #[test]
    fn 三項目すべて未設定なら未構成() {
        let info = org_info(None, None, None);
        assert_eq!(info.override_status(), OrgOverride::NotConfigured);
    }

    #[rstest]
    #[case(Some("org@example.com"), None, true, vec!["password"])]
    #[case(Some("org@example.com"), Some("pw"), false, vec!["email_config_id"])]
    #[case(None, Some("pw"), true, vec!["email"])]
    #[case(Some("   "), Some(""), true, vec!["email", "password"])]
    fn 一部だけ設定されていると不完全と判定する(
        #[case] email: Option<&str>,
        #[case] password: Option<&str>,
        #[case] has_config: bool,
        #[case] expected_missing: Vec<&'static str>,
    ) {
        let config = has_config.then(EmailConfigId::new);
        let info = org_info(email, password, config);

        assert_eq!(
            info.override_status(),
            OrgOverride::Incomplete {
                missing: expected_missing,
            }
        );
    }

    #[test]
    fn secretのdebug出力はマスクされる() {
        let secret = Secret::new("p@ssw0rd");
        let debug = format!("{secret:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("p@ssw0rd"));
    }

    #[test]
    fn auth_mechanismの文字列変換() {
        assert_eq!(AuthMechanism::OAuth.to_string(), "oauth");
        assert_eq!(AuthMechanism::from_str("login").unwrap(), AuthMechanism::Login);
        assert_eq!(AuthMechanism::from_str("oauth").unwrap(), AuthMechanism::OAuth);
        assert_eq!(SmtpSecurity::from_str("start_tls").unwrap(), SmtpSecurity::StartTls);
    }

    #[test]
    fn auth_mechanismのjson表現はstrumと一致する() {
        let json = serde_json::to_string(&AuthMechanism::OAuth).unwrap();
        assert_eq!(json, r#""oauth""#);

        let parsed: SmtpSecurity = serde_json::from_str(r#""start_tls""#).unwrap();
        assert_eq!(parsed, SmtpSecurity::StartTls);
    }
}
