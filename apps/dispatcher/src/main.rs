//! # Notiflow Dispatcher
//!
//! キューに積まれた通知 1 件を受信者ごとに配信する。
//!
//! ## 役割
//!
//! - **配信設定の解決**: クライアント・組織・送信ユーザーから送信元と認証を決める
//! - **配信**: 受信者ごとに検証・送信し、失敗しても残りの受信者の処理を続ける
//! - **記録**: 受信者の状態と配信履歴を即時に保存する
//!
//! キューのポーリングやリトライ間隔は扱わない。呼び出し側が通知 ID を指定して起動する。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `NOTIFICATION_BACKEND` | No | `smtp` / `noop`（デフォルト: `smtp`） |
//! | `S3_ENDPOINT_URL` | No | MinIO 使用時に設定 |
//! | `S3_BUCKET_NAME` | **Yes** | 添付ファイルのバケット名 |
//! | `NOTIFICATION_REGISTRATION_ID` | No | 連携用の登録 ID |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |
//!
//! ## 起動方法
//!
//! ```bash
//! cargo run -p notiflow-dispatcher -- send 01890a5d-ac96-774b-bcce-b302099a8057
//! cargo run -p notiflow-dispatcher -- test-connection
//! ```

use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;
use notiflow_dispatcher::{
    command::{Cli, Command},
    config::{DispatcherConfig, MailBackend},
    usecase::{
        DeliveryConfigResolver,
        EmailNotificationChannel,
        NotificationChannel,
        OutcomeRecorder,
    },
};
use notiflow_domain::{clock::SystemClock, notification::NotificationId};
use notiflow_infra::{
    attachment::{self, S3AttachmentStore},
    db,
    repository::{
        NotificationRepository,
        PostgresDeliveryRecordRepository,
        PostgresDirectoryRepository,
        PostgresNotificationRepository,
        PostgresRecipientRepository,
    },
    transport::{MailTransport, NoopMailTransport, SmtpMailTransport},
};
use notiflow_shared::observability::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(&TracingConfig::from_env("notiflow-dispatcher"));

    let cli = Cli::parse();
    let config = DispatcherConfig::from_env().context("設定の読み込みに失敗しました")?;

    let pool = db::create_pool(&config.database_url)
        .await
        .context("データベース接続に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの適用に失敗しました")?;
    tracing::info!("データベースに接続しました");

    let transport: Arc<dyn MailTransport> = match config.backend {
        MailBackend::Smtp => Arc::new(SmtpMailTransport::new()),
        MailBackend::Noop => Arc::new(NoopMailTransport),
    };
    tracing::info!(backend = %config.backend, "メール送信バックエンドを初期化しました");

    let s3_client = attachment::create_client(config.s3_endpoint_url.as_deref()).await;
    let attachments = Arc::new(S3AttachmentStore::new(
        s3_client,
        config.s3_bucket_name.clone(),
    ));

    let channel = EmailNotificationChannel::new(
        DeliveryConfigResolver::new(Arc::new(PostgresDirectoryRepository::new(pool.clone()))),
        OutcomeRecorder::new(
            Arc::new(PostgresRecipientRepository::new(pool.clone())),
            Arc::new(PostgresDeliveryRecordRepository::new(pool.clone())),
            Arc::new(SystemClock),
        ),
        transport,
        attachments,
    );
    channel.set_registration_id(config.registration_id);

    match cli.command {
        Command::TestConnection => {
            println!("{}", channel.test_connection());
        }
        Command::Send { notification_id } => {
            let notification_id = NotificationId::from_uuid(notification_id);
            let notifications = PostgresNotificationRepository::new(pool.clone());
            let mut notification = notifications
                .find_by_id(&notification_id)
                .await
                .context("通知の読み込みに失敗しました")?
                .with_context(|| format!("通知が見つかりません: {notification_id}"))?;

            tracing::info!(
                %notification_id,
                recipients = notification.recipients().len(),
                registration_id = channel.registration_id(),
                "通知の配信を開始します"
            );
            channel.send_notification(&mut notification).await?;
            tracing::info!(%notification_id, "すべての受信者に配信しました");
        }
    }

    Ok(())
}
