//! # Observability 基盤
//!
//! ディスパッチャのトレーシング初期化。
//!
//! - `LOG_FORMAT`: `json`（集約基盤向け）/ `pretty`（端末向け、デフォルト）
//! - `RUST_LOG`: ログレベル。未設定なら [`DEFAULT_FILTER`]
//!
//! `ErrorLayer` を必ず登録する。登録しないとインフラ層エラーの `SpanTrace` が空になる。

use std::str::FromStr;

/// `RUST_LOG` 未設定時のフィルタ
pub const DEFAULT_FILTER: &str = "info,notiflow=debug";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown LOG_FORMAT={other:?}")),
        }
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// 起動ログに出すサービス名
    pub service_name:   String,
    pub log_format:     LogFormat,
    /// `RUST_LOG` 未設定時に使うフィルタ
    pub default_filter: String,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    /// 環境変数 `LOG_FORMAT` から読み取る
    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::from_lookup(service_name, |name| std::env::var(name).ok())
    }

    /// 不正な `LOG_FORMAT` は pretty にフォールバックする
    ///
    /// subscriber 初期化前なので警告は stderr に出す。
    fn from_lookup(
        service_name: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let log_format = match lookup("LOG_FORMAT").map(|v| v.parse::<LogFormat>()) {
            Some(Ok(format)) => format,
            Some(Err(e)) => {
                eprintln!("WARNING: {e}, falling back to pretty");
                LogFormat::Pretty
            }
            None => LogFormat::default(),
        };
        Self::new(service_name, log_format)
    }
}

/// グローバル subscriber を登録する
///
/// プロセスで 1 回だけ呼ぶこと（2 回目はパニックする）。
#[cfg(feature = "observability")]
pub fn init_tracing(config: &TracingConfig) {
    use tracing_subscriber::{EnvFilter, Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .init();

    tracing::debug!(
        service = %config.service_name,
        log_format = ?config.log_format,
        "トレーシングを初期化しました"
    );
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn log_formatは前後の空白を無視してパースする() {
        assert_eq!(" json ".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("JSON".parse::<LogFormat>().is_err());
    }

    #[test]
    fn log_format未設定ならprettyでデフォルトフィルタを使う() {
        let config = TracingConfig::from_lookup("notiflow-dispatcher", |_| None);

        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.default_filter, DEFAULT_FILTER);
        assert_eq!(config.service_name, "notiflow-dispatcher");
    }

    #[test]
    fn 不正なlog_formatはprettyにフォールバックする() {
        let config = TracingConfig::from_lookup("notiflow-dispatcher", |_| Some("xml".to_string()));

        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn log_format_jsonを読み込みフィルタを差し替えられる() {
        let config = TracingConfig::from_lookup("notiflow-dispatcher", |name| {
            (name == "LOG_FORMAT").then(|| "json".to_string())
        })
        .with_default_filter("warn");

        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.default_filter, "warn");
    }
}
