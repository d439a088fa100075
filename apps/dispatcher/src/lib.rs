//! # Notiflow Dispatcher ライブラリ
//!
//! 1 件の通知を受信者ごとに配信し、結果を記録するユースケースを公開する。
//! バイナリ（`main.rs`）と統合テストの両方から利用する。
//!
//! ## モジュール構成
//!
//! - [`usecase`] - 配信設定の解決、配信、結果記録
//! - [`config`] - 環境変数からの設定読み込み
//! - [`command`] - コマンドライン引数の解釈
//! - [`error`] - ディスパッチャのエラー定義

pub mod command;
pub mod config;
pub mod error;
pub mod usecase;

pub use error::DispatchError;
