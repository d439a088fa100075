//! # 送信メッセージ
//!
//! 受信者 1 人分の送信メッセージと、その送信結果を定義する。
//!
//! ## 設計方針
//!
//! - **送信前の構造検証**: アドレスと件名を [`Strictness::Strict`] で検証し、
//!   通らなければ [`Strictness::Relaxed`] で再検証する。両方通らなければ送信しない
//! - **送信結果は値**: 送信失敗はエラーではなく [`SendStatus::Failed`] として返す

use std::fmt;

use crate::directory::{AuthMechanism, Secret};

/// RFC 5321 のパス長上限
const MAX_ADDRESS_LENGTH: usize = 254;
const MAX_LOCAL_PART_LENGTH: usize = 64;

/// 検証の厳しさ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// 裸の addr-spec（`user@example.com`）のみ許可
    Strict,
    /// 前後の空白と表示名（`Name <user@example.com>`）を許可
    Relaxed,
}

/// SMTP 認証情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpCredentials {
    pub user:      String,
    pub password:  Secret,
    pub mechanism: AuthMechanism,
}

/// 添付ファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAttachment {
    pub file_name:    String,
    pub content_type: String,
    pub content:      Vec<u8>,
}

/// 送信メッセージ
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    from:        String,
    to:          String,
    subject:     String,
    html_body:   String,
    credentials: Option<SmtpCredentials>,
    attachments: Vec<MailAttachment>,
}

impl OutboundMessage {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
    ) -> Self {
        Self {
            from:        from.into(),
            to:          to.into(),
            subject:     subject.into(),
            html_body:   html_body.into(),
            credentials: None,
            attachments: Vec::new(),
        }
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn html_body(&self) -> &str {
        &self.html_body
    }

    /// 改行を CRLF に正規化した本文（配信履歴に保存する形式）
    pub fn rendered_body(&self) -> String {
        self.html_body.lines().collect::<Vec<_>>().join("\r\n")
    }

    pub fn credentials(&self) -> Option<&SmtpCredentials> {
        self.credentials.as_ref()
    }

    pub fn attachments(&self) -> &[MailAttachment] {
        &self.attachments
    }

    pub fn set_credentials(&mut self, credentials: SmtpCredentials) {
        self.credentials = Some(credentials);
    }

    pub fn add_attachment(&mut self, attachment: MailAttachment) {
        self.attachments.push(attachment);
    }

    /// 指定した厳しさで構造を検証する
    pub fn is_valid(&self, strictness: Strictness) -> bool {
        let address_ok = |address: &str| match strictness {
            Strictness::Strict => is_addr_spec(address),
            Strictness::Relaxed => is_addr_spec(strip_display_name(address)),
        };

        address_ok(&self.from) && address_ok(&self.to) && !self.subject.trim().is_empty()
    }

    /// 厳格検証、だめなら緩和検証のどちらかを通れば送信可能
    pub fn is_deliverable(&self) -> bool {
        self.is_valid(Strictness::Strict) || self.is_valid(Strictness::Relaxed)
    }
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OutboundMessage[from={}, to={}, subject={}]",
            self.from, self.to, self.subject
        )
    }
}

/// `Name <addr>` 形式なら `<>` の中身を、それ以外は前後の空白を除いた値を返す
fn strip_display_name(address: &str) -> &str {
    let trimmed = address.trim();
    match (trimmed.rfind('<'), trimmed.strip_suffix('>')) {
        (Some(start), Some(without_close)) => without_close[start + 1..].trim(),
        _ => trimmed,
    }
}

/// `local@domain` の構造を満たすか
fn is_addr_spec(address: &str) -> bool {
    if address.is_empty() || address.len() > MAX_ADDRESS_LENGTH {
        return false;
    }
    if address
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | ',' | ';'))
    {
        return false;
    }

    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && local.len() <= MAX_LOCAL_PART_LENGTH
        && !domain.is_empty()
        && !domain.contains('@')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// 送信結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendStatus {
    /// 送信成功
    SentOk { message_id: String },
    /// 送信失敗（SMTP 応答や接続エラーの内容）
    Failed { detail: String },
}

impl SendStatus {
    pub fn is_sent_ok(&self) -> bool {
        matches!(self, Self::SentOk { .. })
    }

    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::SentOk { message_id } => Some(message_id),
            Self::Failed { .. } => None,
        }
    }

    pub fn failure_detail(&self) -> Option<&str> {
        match self {
            Self::SentOk { .. } => None,
            Self::Failed { detail } => Some(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn message(from: &str, to: &str, subject: &str) -> OutboundMessage {
        OutboundMessage::new(from, to, subject, "<p>本文</p>")
    }

    #[test]
    fn 正しい形式のメッセージは厳格検証を通る() {
        let m = message("from@example.com", "to@example.com", "件名");
        assert!(m.is_valid(Strictness::Strict));
        assert!(m.is_deliverable());
    }

    #[rstest]
    #[case(" to@example.com ", "前後の空白")]
    #[case("山田 <to@example.com>", "表示名付き")]
    fn 緩和検証だけを通るアドレス(#[case] to: &str, #[case] _reason: &str) {
        let m = message("from@example.com", to, "件名");
        assert!(!m.is_valid(Strictness::Strict));
        assert!(m.is_valid(Strictness::Relaxed));
        assert!(m.is_deliverable());
    }

    #[rstest]
    #[case("", "空文字列")]
    #[case("no-at-sign", "@記号なし")]
    #[case("@example.com", "ローカル部分が空")]
    #[case("user@", "ドメイン部分が空")]
    #[case("a@b@example.com", "@が複数")]
    #[case("user@.example.com", "ドメインが.で始まる")]
    #[case("user@example..com", "連続した.")]
    #[case("a, b@example.com", "区切り文字を含む")]
    fn 不正なアドレスはどちらの検証も通らない(#[case] to: &str, #[case] _reason: &str) {
        let m = message("from@example.com", to, "件名");
        assert!(!m.is_deliverable());
    }

    #[test]
    fn 送信元が空なら送信できない() {
        let m = message("", "to@example.com", "件名");
        assert!(!m.is_deliverable());
    }

    #[test]
    fn 件名が空なら送信できない() {
        let m = message("from@example.com", "to@example.com", "  ");
        assert!(!m.is_deliverable());
    }

    #[test]
    fn 長すぎるローカル部は拒否する() {
        let to = format!("{}@example.com", "a".repeat(65));
        assert!(!message("from@example.com", &to, "件名").is_deliverable());
    }

    #[test]
    fn displayは送信元と宛先と件名を含む() {
        let m = message("from@example.com", "bad", "件名");
        assert_eq!(
            m.to_string(),
            "OutboundMessage[from=from@example.com, to=bad, subject=件名]"
        );
    }

    #[test]
    fn rendered_bodyは改行をcrlfに正規化する() {
        let m = OutboundMessage::new("a@x.com", "b@x.com", "s", "<p>1</p>\n<p>2</p>\r\n<p>3</p>");
        assert_eq!(m.rendered_body(), "<p>1</p>\r\n<p>2</p>\r\n<p>3</p>");
    }

    #[test]
    fn send_statusのアクセサ() {
        let ok = SendStatus::SentOk {
            message_id: "<id@example.com>".to_string(),
        };
        let failed = SendStatus::Failed {
            detail: "550 mailbox unavailable".to_string(),
        };

        assert!(ok.is_sent_ok());
        assert_eq!(ok.message_id(), Some("<id@example.com>"));
        assert_eq!(ok.failure_detail(), None);
        assert!(!failed.is_sent_ok());
        assert_eq!(failed.failure_detail(), Some("550 mailbox unavailable"));
    }
}
