//! # ドメイン層エラー定義
//!
//! ドメインルール違反を表現するエラー型。
//!
//! 受信者ごとの配信失敗（検証エラー、送信エラー）はエラーとして扱わず、
//! 受信者の状態として記録する。ここで定義するのはドメインモデルを
//! 不正な状態にしようとした場合のエラーのみ。

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 例: 空のエラーメッセージで受信者を失敗状態にしようとした
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}
