//! # 通知
//!
//! 通知キューから取り出された 1 件の通知と、その受信者を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`Notification`] | 通知 | 複数の受信者宛ての送信単位 |
//! | [`NotificationHeader`] | 通知ヘッダ | 送信元・件名・本文・添付（受信者以外の読み取り専用部分） |
//! | [`Recipient`] | 受信者 | 個別の配信結果を持つ宛先 |
//!
//! ## 不変条件
//!
//! 配信後の受信者は「処理済み」か「エラーメッセージあり」のどちらか一方だけを満たす。
//! 状態の変更は [`Recipient::mark_processed`] / [`Recipient::mark_failed`] に限定する。

use crate::{
    DomainError,
    directory::{ClientId, OrganizationId, UserId},
};

define_uuid_id! {
    /// 通知 ID
    pub struct NotificationId;
}

define_uuid_id! {
    /// 受信者 ID
    pub struct RecipientId;
}

define_uuid_id! {
    /// 添付ファイル群 ID
    pub struct AttachmentId;
}

/// 通知ヘッダ
///
/// 通知のうち受信者以外の部分。配信中は読み取り専用。
#[derive(Debug, Clone)]
pub struct NotificationHeader {
    pub id:              NotificationId,
    pub client_id:       ClientId,
    pub organization_id: Option<OrganizationId>,
    /// 送信ユーザー
    pub user_id:         Option<UserId>,
    /// 件名として使う説明
    pub description:     String,
    /// HTML 本文
    pub text:            String,
    pub attachment_id:   Option<AttachmentId>,
}

/// 通知
#[derive(Debug, Clone)]
pub struct Notification {
    header:     NotificationHeader,
    recipients: Vec<Recipient>,
}

impl Notification {
    pub fn new(header: NotificationHeader, recipients: Vec<Recipient>) -> Self {
        Self { header, recipients }
    }

    pub fn header(&self) -> &NotificationHeader {
        &self.header
    }

    pub fn id(&self) -> &NotificationId {
        &self.header.id
    }

    /// 受信者（キューに登録された順）
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// ヘッダを参照しながら受信者を更新するために分割する
    pub fn split_mut(&mut self) -> (&NotificationHeader, &mut [Recipient]) {
        (&self.header, &mut self.recipients)
    }
}

/// 受信者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    id:            RecipientId,
    address:       String,
    user_id:       Option<UserId>,
    processed:     bool,
    error_message: Option<String>,
}

impl Recipient {
    /// 新しい受信者を作成する（未処理・エラーなし）
    pub fn new(id: RecipientId, address: impl Into<String>, user_id: Option<UserId>) -> Self {
        Self {
            id,
            address: address.into(),
            user_id,
            processed: false,
            error_message: None,
        }
    }

    /// 既存のデータから受信者を復元する（データベースから取得時）
    pub fn from_db(
        id: RecipientId,
        address: String,
        user_id: Option<UserId>,
        processed: bool,
        error_message: Option<String>,
    ) -> Self {
        Self {
            id,
            address,
            user_id,
            processed,
            error_message: error_message.filter(|m| !m.is_empty()),
        }
    }

    pub fn id(&self) -> &RecipientId {
        &self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// 既知のユーザー
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// 配信成功として記録する
    ///
    /// 以前の配信試行のエラーメッセージはクリアする。
    pub fn mark_processed(&mut self) {
        self.processed = true;
        self.error_message = None;
    }

    /// 配信失敗として記録する
    ///
    /// # エラー
    ///
    /// `message` が空の場合は `DomainError::Validation` を返す。
    pub fn mark_failed(&mut self, message: impl Into<String>) -> Result<(), DomainError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(DomainError::Validation(
                "エラーメッセージは必須です".to_string(),
            ));
        }

        self.processed = false;
        self.error_message = Some(message);
        Ok(())
    }
}
