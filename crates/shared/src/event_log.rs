//! # ビジネスイベントログ
//!
//! `jq` で絞り込みやすいよう、ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! [`log_business_event!`] は `event.kind = "business_event"` を自動付与するので、
//! `jq 'select(.["event.kind"] == "business_event")'` で配信イベントだけを抽出できる。
//!
//! フィールド名はドット記法（`event.category`、`notification.recipient`）を使う。
//! JSON 出力ではフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` を付与し、`tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: [`event::category`] の定数
/// - `event.action`: [`event::action`] の定数
/// - `event.result`: [`event::result`] の定数
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const NOTIFICATION: &str = "notification";
    }

    /// イベントアクション
    pub mod action {
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";
        pub const NOTIFICATION_INVALID: &str = "notification.invalid";
        pub const DISPATCH_COMPLETED: &str = "dispatch.completed";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const NOTIFICATION: &str = "notification";
        pub const RECIPIENT: &str = "recipient";
        pub const DELIVERY_RECORD: &str = "delivery_record";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
///
/// `tracing::error!` に `error.category` と `error.kind` を付けて使う。
pub mod error {
    pub mod category {
        /// DB・S3 などのインフラ
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// SMTP サーバーなどの外部サービス
        pub const EXTERNAL_SERVICE: &str = "external_service";
    }

    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const ATTACHMENT: &str = "attachment";
        pub const CONFIGURATION: &str = "configuration";
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn マクロがinfoレベルで展開される() {
        // subscriber 未設定でもパニックしないこと
        log_business_event!(
            event.category = super::event::category::NOTIFICATION,
            event.action = super::event::action::NOTIFICATION_SENT,
            event.result = super::event::result::SUCCESS,
            "テスト"
        );
    }
}
