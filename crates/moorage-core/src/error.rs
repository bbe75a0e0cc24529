use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("YAMLパースエラー: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("サービスが定義されていません\nヒント:\n  • moorage.yaml に services ブロックを追加してください")]
    NoServices,

    #[error("サービスが見つかりません: {0}")]
    ServiceNotFound(String),

    #[error("サービス '{0}' に image が指定されていません")]
    MissingImage(String),

    #[error("ポート指定が不正です: '{value}'\n理由: {message}")]
    InvalidPort { value: String, message: String },

    #[error(
        "ホストポート {port} が重複しています（サービス '{service}'）\nヒント:\n  • 別のポート番号を使用してください"
    )]
    DuplicateHostPort { port: u16, service: String },

    #[error("ボリューム指定が不正です: '{0}'\nヒント:\n  • \"ソース:コンテナパス\" または \"ソース:コンテナパス:ro\" の形式で指定してください")]
    InvalidVolume(String),

    #[error(
        "ヘルスチェック設定が不正です（サービス '{service}'）: timeout {timeout:?} は interval {interval:?} より短くしてください"
    )]
    HealthCheckTiming {
        service: String,
        interval: Duration,
        timeout: Duration,
    },

    #[error("ヘルスチェックの test コマンドが空です（サービス '{0}'）")]
    EmptyHealthCommand(String),

    #[error("時間指定が不正です: '{0}'\nヒント:\n  • \"30s\"、\"1m30s\"、または秒数で指定してください")]
    InvalidDuration(String),

    #[error("メモリ制限が不正です: '{0}'\nヒント:\n  • \"512m\" や \"2g\" の形式で指定してください")]
    InvalidMemory(String),

    #[error("CPU制限が不正です: {0}（正の数を指定してください）")]
    InvalidCpus(f64),

    #[error(
        "サービス '{0}' に POSTGRES_PASSWORD が設定されていません\nヒント:\n  • デフォルトパスワードは許可されていません\n  • environment に POSTGRES_PASSWORD を設定してください"
    )]
    MissingPassword(String),

    #[error("再起動ポリシーが不正です: '{0}'（no, always, on-failure, unless-stopped のいずれか）")]
    InvalidRestartPolicy(String),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
