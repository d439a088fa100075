//! # ディスパッチャのエラー定義
//!
//! 受信者ごとの失敗（検証失敗・送信失敗）は受信者の状態として記録され、
//! ここには現れない。呼び出し元に伝わるのは集約エラーと、
//! 配信を続行できない致命的なエラーだけ。

use notiflow_domain::DomainError;
use notiflow_infra::InfraError;
use thiserror::Error;

/// 通知配信で発生するエラー
#[derive(Debug, Error)]
pub enum DispatchError {
    /// 1 人以上の受信者に配信できなかった
    ///
    /// 失敗理由を受信者の順に改行で連結したものがメッセージになる。
    /// 成功した受信者の記録は取り消さない。
    #[error("{}", reasons.join("\n"))]
    Undelivered { reasons: Vec<String> },

    /// 受信者・配信履歴の保存に失敗した（残りの受信者は処理しない）
    #[error("配信結果の保存に失敗しました: {0}")]
    Persistence(#[source] InfraError),

    /// 配信設定の参照でインフラエラーが発生した
    #[error("配信設定の参照に失敗しました: {0}")]
    Lookup(#[source] InfraError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl DispatchError {
    /// 集約エラーの場合、失敗理由を返す
    pub fn reasons(&self) -> Option<&[String]> {
        match self {
            Self::Undelivered { reasons } => Some(reasons),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn 集約エラーは理由を改行で連結して表示する() {
        let err = DispatchError::Undelivered {
            reasons: vec![
                "NOT VALID - OutboundMessage[from=, to=b@example.com, subject=件名]".to_string(),
                "Error: Sending to: c@example.com".to_string(),
            ],
        };

        assert_eq!(
            err.to_string(),
            "NOT VALID - OutboundMessage[from=, to=b@example.com, subject=件名]\nError: Sending to: c@example.com"
        );
        assert_eq!(err.reasons().map(<[String]>::len), Some(2));
    }

    #[test]
    fn 保存失敗は理由を持たない() {
        let err = DispatchError::Persistence(InfraError::unexpected("接続断"));

        assert!(err.reasons().is_none());
        assert!(err.to_string().contains("接続断"));
    }
}
