//! # テスト用モック
//!
//! ディスパッチャのテストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! notiflow-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use notiflow_domain::{
    delivery_record::DeliveryRecord,
    directory::{
        Client,
        ClientId,
        EmailConfig,
        EmailConfigId,
        OrganizationId,
        OrganizationInfo,
        SenderUser,
        UserId,
    },
    message::{MailAttachment, OutboundMessage, SendStatus},
    notification::{AttachmentId, Notification, NotificationId, Recipient},
};

use crate::{
    attachment::AttachmentStore,
    error::InfraError,
    repository::{
        DeliveryRecordRepository,
        DirectoryRepository,
        NotificationRepository,
        RecipientRepository,
    },
    transport::MailTransport,
};

// ===== MockDirectoryRepository =====

#[derive(Clone, Default)]
pub struct MockDirectoryRepository {
    clients:       Arc<Mutex<HashMap<ClientId, Client>>>,
    organizations: Arc<Mutex<HashMap<OrganizationId, OrganizationInfo>>>,
    users:         Arc<Mutex<HashMap<UserId, SenderUser>>>,
    email_configs: Arc<Mutex<HashMap<EmailConfigId, EmailConfig>>>,
    fail_lookups:  Arc<AtomicBool>,
}

impl MockDirectoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_client(&self, client: Client) {
        self.clients.lock().unwrap().insert(client.id.clone(), client);
    }

    pub fn add_organization_info(&self, info: OrganizationInfo) {
        self.organizations
            .lock()
            .unwrap()
            .insert(info.organization_id.clone(), info);
    }

    pub fn add_sender_user(&self, user: SenderUser) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }

    pub fn add_email_config(&self, config: EmailConfig) {
        self.email_configs
            .lock()
            .unwrap()
            .insert(config.id.clone(), config);
    }

    /// 以降のすべての参照をインフラエラーにする
    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), InfraError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(InfraError::unexpected("mock: ディレクトリ参照失敗"));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryRepository for MockDirectoryRepository {
    async fn find_client(&self, id: &ClientId) -> Result<Option<Client>, InfraError> {
        self.check()?;
        Ok(self.clients.lock().unwrap().get(id).cloned())
    }

    async fn find_organization_info(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<OrganizationInfo>, InfraError> {
        self.check()?;
        Ok(self.organizations.lock().unwrap().get(id).cloned())
    }

    async fn find_sender_user(&self, id: &UserId) -> Result<Option<SenderUser>, InfraError> {
        self.check()?;
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn find_email_config(
        &self,
        id: &EmailConfigId,
    ) -> Result<Option<EmailConfig>, InfraError> {
        self.check()?;
        Ok(self.email_configs.lock().unwrap().get(id).cloned())
    }
}

// ===== MockNotificationRepository =====

#[derive(Clone, Default)]
pub struct MockNotificationRepository {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl MockNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_notification(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

#[async_trait]
impl NotificationRepository for MockNotificationRepository {
    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, InfraError> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id() == id)
            .cloned())
    }
}

// ===== MockRecipientRepository =====

#[derive(Clone, Default)]
pub struct MockRecipientRepository {
    saved:      Arc<Mutex<Vec<Recipient>>>,
    fail_after: Arc<Mutex<Option<usize>>>,
}

impl MockRecipientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` 件保存した後の保存をすべて失敗させる
    pub fn fail_after(&self, count: usize) {
        *self.fail_after.lock().unwrap() = Some(count);
    }

    /// 保存された受信者（保存順）
    pub fn saved(&self) -> Vec<Recipient> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecipientRepository for MockRecipientRepository {
    async fn save_outcome(&self, recipient: &Recipient) -> Result<(), InfraError> {
        let mut saved = self.saved.lock().unwrap();
        let limit = *self.fail_after.lock().unwrap();
        if limit.is_some_and(|limit| saved.len() >= limit) {
            return Err(InfraError::unexpected("mock: 受信者の保存失敗"));
        }
        saved.push(recipient.clone());
        Ok(())
    }
}

// ===== MockDeliveryRecordRepository =====

#[derive(Clone, Default)]
pub struct MockDeliveryRecordRepository {
    records: Arc<Mutex<Vec<DeliveryRecord>>>,
}

impl MockDeliveryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DeliveryRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryRecordRepository for MockDeliveryRecordRepository {
    async fn insert(&self, record: &DeliveryRecord) -> Result<(), InfraError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// ===== MockMailTransport =====

/// 送信されたメッセージと、送信時に渡されたアカウント設定
#[derive(Debug, Clone)]
pub struct SentMail {
    pub message: OutboundMessage,
    pub account: Option<EmailConfig>,
}

/// 宛先ごとに送信結果を指定できるモックトランスポート
///
/// 指定のない宛先は `<n@mock>` 形式のメッセージ ID で成功する。
/// 実際の SMTP と同じく、アカウント設定が `None` の場合は失敗を返す。
#[derive(Clone, Default)]
pub struct MockMailTransport {
    sent:     Arc<Mutex<Vec<SentMail>>>,
    statuses: Arc<Mutex<HashMap<String, SendStatus>>>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 宛先 `to` への送信結果を指定する
    pub fn respond_to(&self, to: impl Into<String>, status: SendStatus) {
        self.statuses.lock().unwrap().insert(to.into(), status);
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, account: Option<&EmailConfig>, message: &OutboundMessage) -> SendStatus {
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentMail {
            message: message.clone(),
            account: account.cloned(),
        });

        if account.is_none() {
            return SendStatus::Failed {
                detail: "メールアカウント設定が見つかりません".to_string(),
            };
        }

        self.statuses
            .lock()
            .unwrap()
            .get(message.to())
            .cloned()
            .unwrap_or_else(|| SendStatus::SentOk {
                message_id: format!("<{}@mock>", sent.len()),
            })
    }
}

// ===== MockAttachmentStore =====

#[derive(Clone, Default)]
pub struct MockAttachmentStore {
    files: Arc<Mutex<HashMap<AttachmentId, Vec<MailAttachment>>>>,
    fail:  Arc<AtomicBool>,
    loads: Arc<Mutex<Vec<AttachmentId>>>,
}

impl MockAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_files(&self, attachment_id: AttachmentId, files: Vec<MailAttachment>) {
        self.files.lock().unwrap().insert(attachment_id, files);
    }

    /// 以降の読み込みを S3 エラーにする
    pub fn fail_loads(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// 読み込みが要求された添付ファイル ID（要求順）
    pub fn loads(&self) -> Vec<AttachmentId> {
        self.loads.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttachmentStore for MockAttachmentStore {
    async fn load(&self, attachment_id: &AttachmentId) -> Result<Vec<MailAttachment>, InfraError> {
        self.loads.lock().unwrap().push(attachment_id.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(InfraError::s3("mock: 添付ファイルの読み込み失敗"));
        }
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(attachment_id)
            .cloned()
            .unwrap_or_default())
    }
}
