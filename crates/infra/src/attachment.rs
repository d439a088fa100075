//! # 添付ファイルストア
//!
//! 通知に紐づく添付ファイルを S3 / MinIO から取得する。
//!
//! ## 設計方針
//!
//! - **キー規約**: 添付ファイル ID ごとに `attachments/{attachment_id}/{file_name}` に配置
//! - **ローカル開発**: MinIO を使用（`S3_ENDPOINT_URL` で接続先を指定）
//! - **本番環境**: IAM ロールによる認証で Amazon S3 に接続（`S3_ENDPOINT_URL` 未設定）
//!
//! 取得失敗はディスパッチャ側で受信者単位の送信失敗として扱われる。

use async_trait::async_trait;
use aws_sdk_s3::Client;
use notiflow_domain::{message::MailAttachment, notification::AttachmentId};

use crate::InfraError;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 添付ファイルストアのインターフェース
///
/// テスト時はモックに差し替え可能。
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// 添付ファイル ID に紐づくファイルをすべて読み込む
    ///
    /// ファイルはキーの辞書順で返す。該当ファイルがなければ空の Vec を返す。
    async fn load(&self, attachment_id: &AttachmentId) -> Result<Vec<MailAttachment>, InfraError>;
}

/// S3 添付ファイルストア
///
/// `aws-sdk-s3` を使用した [`AttachmentStore`] の実装。MinIO とも互換動作する。
pub struct S3AttachmentStore {
    client:      Client,
    bucket_name: String,
}

impl S3AttachmentStore {
    pub fn new(client: Client, bucket_name: String) -> Self {
        Self {
            client,
            bucket_name,
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, InfraError> {
        let mut keys = Vec::new();
        let mut continuation_token = None;

        loop {
            let mut list = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .prefix(prefix);

            if let Some(token) = continuation_token {
                list = list.continuation_token(token);
            }

            let output = list
                .send()
                .await
                .map_err(|e| InfraError::s3(format!("List Objects の実行に失敗: {e}")))?;

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter(|key| !key.ends_with('/'))
                    .map(str::to_string),
            );

            // ページネーション
            if output.is_truncated() != Some(true) {
                break;
            }
            continuation_token = output.next_continuation_token().map(String::from);
        }

        keys.sort();
        Ok(keys)
    }

    async fn get(&self, key: &str, prefix: &str) -> Result<MailAttachment, InfraError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| InfraError::s3(format!("Get Object の実行に失敗 ({key}): {e}")))?;

        let content_type = output
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let content = output
            .body
            .collect()
            .await
            .map_err(|e| InfraError::s3(format!("オブジェクト本体の読み込みに失敗 ({key}): {e}")))?
            .into_bytes()
            .to_vec();

        Ok(MailAttachment {
            file_name: file_name_of(key, prefix).to_string(),
            content_type,
            content,
        })
    }
}

#[async_trait]
impl AttachmentStore for S3AttachmentStore {
    #[tracing::instrument(skip_all, level = "debug", fields(%attachment_id))]
    async fn load(&self, attachment_id: &AttachmentId) -> Result<Vec<MailAttachment>, InfraError> {
        let prefix = key_prefix(attachment_id);
        let keys = self.list_keys(&prefix).await?;

        let mut attachments = Vec::with_capacity(keys.len());
        for key in &keys {
            attachments.push(self.get(key, &prefix).await?);
        }

        tracing::debug!(count = attachments.len(), "添付ファイルを読み込みました");
        Ok(attachments)
    }
}

fn key_prefix(attachment_id: &AttachmentId) -> String {
    format!("attachments/{attachment_id}/")
}

fn file_name_of<'a>(key: &'a str, prefix: &str) -> &'a str {
    key.strip_prefix(prefix).unwrap_or(key)
}

/// S3 クライアントを作成する
///
/// `endpoint` が `Some` の場合は MinIO 等のカスタムエンドポイントに接続する。
/// `None` の場合は AWS S3 のデフォルトエンドポイントを使用する。
///
/// 認証情報は SDK のデフォルト認証チェーンで解決する:
/// - ローカル: 環境変数 `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`
/// - 本番: IAM ロール
pub async fn create_client(endpoint: Option<&str>) -> Client {
    let mut config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new("ap-northeast-1"));

    if let Some(endpoint_url) = endpoint {
        config_builder = config_builder.endpoint_url(endpoint_url);
    }

    let config = config_builder.load().await;

    // MinIO はパススタイルが必要
    let s3_config_builder = aws_sdk_s3::config::Builder::from(&config);
    let s3_config = if endpoint.is_some() {
        s3_config_builder.force_path_style(true).build()
    } else {
        s3_config_builder.build()
    };

    Client::from_conf(s3_config)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<S3AttachmentStore>();
    }

    #[test]
    fn キープレフィックスは添付ファイルidごとのディレクトリになる() {
        let id = AttachmentId::from_uuid(Uuid::nil());
        assert_eq!(
            key_prefix(&id),
            "attachments/00000000-0000-0000-0000-000000000000/"
        );
    }

    #[test]
    fn キーからファイル名を取り出す() {
        assert_eq!(
            file_name_of("attachments/abc/請求書.pdf", "attachments/abc/"),
            "請求書.pdf"
        );
        assert_eq!(file_name_of("other/file.txt", "attachments/abc/"), "other/file.txt");
    }
}
