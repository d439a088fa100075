//! # Notiflow 共有ユーティリティ
//!
//! ドメイン・インフラ・ディスパッチャのすべてから使う共通ユーティリティ。
//! ビジネスロジックは含めない。

pub mod event_log;
pub mod observability;
