//! # コマンドライン引数
//!
//! ```bash
//! notiflow-dispatcher send <notification-id>
//! notiflow-dispatcher test-connection
//! ```

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "notiflow-dispatcher", version, about = "通知を受信者ごとに配信する")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// 実行するコマンド
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// 指定した通知を配信する
    Send {
        /// 配信する通知の ID
        notification_id: Uuid,
    },
    /// 疎通確認
    TestConnection,
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const BIN: &str = "notiflow-dispatcher";

    #[test]
    fn sendは通知idを受け取る() {
        let cli =
            Cli::try_parse_from([BIN, "send", "01890a5d-ac96-774b-bcce-b302099a8057"]).unwrap();

        let expected = Uuid::parse_str("01890a5d-ac96-774b-bcce-b302099a8057").unwrap();
        assert_eq!(cli.command, Command::Send {
            notification_id: expected
        });
    }

    #[test]
    fn test_connectionを解釈する() {
        let cli = Cli::try_parse_from([BIN, "test-connection"]).unwrap();

        assert_eq!(cli.command, Command::TestConnection);
    }

    #[test]
    fn サブコマンドなしはエラー() {
        assert!(Cli::try_parse_from([BIN]).is_err());
    }

    #[rstest]
    #[case(&[BIN, "send"], ErrorKind::MissingRequiredArgument)]
    #[case(&[BIN, "send", "42"], ErrorKind::ValueValidation)]
    #[case(&[BIN, "poll"], ErrorKind::InvalidSubcommand)]
    fn 不正な引数はエラー(#[case] args: &[&str], #[case] expected: ErrorKind) {
        let err = Cli::try_parse_from(args).unwrap_err();

        assert_eq!(err.kind(), expected);
    }
}
