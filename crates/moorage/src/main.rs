mod commands;
mod docker;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "moor")]
#[command(about = "ステートフルなサービスを、静かな港に係留する。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// サービスを起動してヘルスチェックの成功を待つ
    Up {
        /// 起動後すぐに戻る（ログ追跡・常駐監視をしない）
        #[arg(short, long)]
        detach: bool,
    },
    /// サービスを停止してコンテナを削除
    Down {
        /// 名前付きボリュームも削除する
        #[arg(short, long)]
        volumes: bool,
    },
    /// コンテナの一覧を表示
    Ps {
        /// 停止中のコンテナも表示
        #[arg(short, long)]
        all: bool,
    },
    /// コンテナのログを表示
    Logs {
        /// サービス名（指定しない場合は全サービス）
        service: Option<String>,
        /// ログの行数を指定
        #[arg(short = 'l', long, default_value = "100")]
        lines: usize,
        /// ログをリアルタイムで追跡
        #[arg(short, long)]
        follow: bool,
    },
    /// サービスを再起動
    Restart {
        /// サービス名
        service: String,
    },
    /// サービスを停止（コンテナは残す）
    Stop {
        /// サービス名
        service: String,
        /// 停止までの猶予秒数
        #[arg(short = 't', long, default_value = "10")]
        grace: u64,
    },
    /// サービスを起動
    Start {
        /// サービス名
        service: String,
    },
    /// データベースをバックアップ（pg_dump）
    Backup {
        /// サービス名
        service: String,
        /// 出力先ファイル
        outfile: PathBuf,
        /// タイムアウト秒数
        #[arg(short = 't', long, default_value = "600")]
        timeout: u64,
    },
    /// バックアップからリストア（psql）
    Restore {
        /// サービス名
        service: String,
        /// 入力ファイル
        infile: PathBuf,
        /// 稼働したままメンテナンスモードでリストアする
        #[arg(long)]
        maintenance: bool,
        /// タイムアウト秒数
        #[arg(short = 't', long, default_value = "600")]
        timeout: u64,
    },
    /// 設定を検証
    Validate,
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("moorage {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(e) = run(cli).await {
        eprintln!();
        eprintln!("{} {}", "✗".red().bold(), e);
        std::process::exit(utils::exit_code_for(&e));
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // 設定ファイルの発見とロード
    let config_path = moorage_config::find_config_file()?;
    tracing::debug!(path = %config_path.display(), "設定ファイルをロード");
    let config = moorage_core::load_config_file(&config_path)?;

    // コマンドディスパッチ
    match cli.command {
        Commands::Up { detach } => {
            commands::up::handle(&config, detach).await?;
        }
        Commands::Down { volumes } => {
            commands::down::handle(&config, volumes).await?;
        }
        Commands::Ps { all } => {
            commands::ps::handle(&config, all).await?;
        }
        Commands::Logs {
            service,
            lines,
            follow,
        } => {
            commands::logs::handle(&config, service, lines, follow).await?;
        }
        Commands::Restart { service } => {
            commands::restart::handle(&config, service).await?;
        }
        Commands::Stop { service, grace } => {
            commands::stop::handle(&config, service, grace).await?;
        }
        Commands::Start { service } => {
            commands::start::handle(&config, service).await?;
        }
        Commands::Backup {
            service,
            outfile,
            timeout,
        } => {
            commands::backup::handle(&config, service, &outfile, timeout).await?;
        }
        Commands::Restore {
            service,
            infile,
            maintenance,
            timeout,
        } => {
            commands::restore::handle(&config, service, &infile, maintenance, timeout).await?;
        }
        Commands::Validate => {
            commands::validate::handle(&config, &config_path);
        }
        Commands::Version => {
            unreachable!("Version is handled before config loading");
        }
    }

    Ok(())
}
