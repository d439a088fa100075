//! # Dispatcher 設定
//!
//! 環境変数から Dispatcher の設定を読み込む。
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `NOTIFICATION_BACKEND` | No | `smtp` / `noop`（デフォルト: `smtp`） |
//! | `S3_ENDPOINT_URL` | No | MinIO 使用時に設定（未設定で AWS S3 デフォルト） |
//! | `S3_BUCKET_NAME` | **Yes** | 添付ファイルのバケット名 |
//! | `NOTIFICATION_REGISTRATION_ID` | No | 連携用の登録 ID（デフォルト: `0`） |

use std::{env, str::FromStr};

use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// メール送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MailBackend {
    /// 各メールアカウント設定の SMTP サーバー経由で送信
    #[default]
    Smtp,
    /// 送信しない（ログ出力のみ）
    Noop,
}

/// Dispatcher の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub database_url:    String,
    pub backend:         MailBackend,
    pub s3_endpoint_url: Option<String>,
    pub s3_bucket_name:  String,
    pub registration_id: i32,
}

impl DispatcherConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        Ok(Self {
            database_url:    required("DATABASE_URL")?,
            backend:         parse_or_default(&lookup, "NOTIFICATION_BACKEND")?,
            s3_endpoint_url: lookup("S3_ENDPOINT_URL").filter(|v| !v.trim().is_empty()),
            s3_bucket_name:  required("S3_BUCKET_NAME")?,
            registration_id: parse_or_default(&lookup, "NOTIFICATION_REGISTRATION_ID")?,
        })
    }
}

fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<T, ConfigError>
where
    T: FromStr + Default,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        _ => Ok(T::default()),
    }
}
