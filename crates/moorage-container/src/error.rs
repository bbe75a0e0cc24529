use moorage_core::ServiceState;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(
        "Dockerに接続できません: {0}\n\nヒント:\n  • Dockerが起動しているか確認してください\n  • docker ps コマンドが正常に動作するか確認してください"
    )]
    ConnectionFailed(String),

    #[error("コンテナ '{container}' が見つかりません")]
    ContainerNotFound { container: String },

    #[error("サービス '{service}' は既に起動しています（状態: {state}）")]
    AlreadyRunning { service: String, state: ServiceState },

    #[error(
        "サービス '{service}' は healthy ではありません（状態: {state}）\nヒント:\n  • moor ps で状態を確認してください\n  • ヘルスチェックが成功するまで待ってから再実行してください"
    )]
    NotHealthy { service: String, state: ServiceState },

    #[error(
        "サービス '{service}' が稼働中のため restore できません（状態: {state}）\nヒント:\n  • moor stop {service} で停止するか、--maintenance を指定してください"
    )]
    UnsafeRestore { service: String, state: ServiceState },

    #[error("サービス '{service}' のバックアップ／リストアが既に実行中です")]
    BackupInProgress { service: String },

    #[error("{tool} が終了コード {exit_code} で失敗しました\nstderr:\n{stderr}")]
    ExternalTool {
        tool: String,
        exit_code: i64,
        stderr: String,
    },

    #[error("{operation} が {timeout:?} 以内に完了しませんでした（中断済み）")]
    Timeout { operation: String, timeout: Duration },

    #[error(
        "サービス '{service}' の起動リトライ上限（{max_retries}回）に達しました\nヒント:\n  • Dockerデーモンの状態を確認してください"
    )]
    LaunchRetriesExhausted { service: String, max_retries: u32 },

    #[error("不正な状態遷移です: {from} → {to}")]
    InvalidTransition { from: ServiceState, to: ServiceState },

    #[error("ファイル操作エラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("Docker APIエラー: {0}")]
    Api(String),
}

impl ContainerError {
    /// リトライで回復しうる一時的なエラーか
    ///
    /// デーモンへの接続失敗のみを一時的とみなす。それ以外は即座に
    /// 呼び出し側へ伝播する。
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_))
    }
}

impl From<bollard::errors::Error> for ContainerError {
    fn from(err: bollard::errors::Error) -> Self {
        match &err {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            } => {
                // 404は呼び出し側がコンテナ名を知っているので文脈付きで包み直す
                ContainerError::Api(err.to_string())
            }
            bollard::errors::Error::DockerResponseServerError {
                status_code: 409, ..
            } => ContainerError::Api(err.to_string()),
            _ => {
                let err_str = err.to_string();
                if err_str.contains("Connection refused")
                    || err_str.contains("No such file or directory")
                {
                    ContainerError::ConnectionFailed(err_str)
                } else {
                    ContainerError::Api(err_str)
                }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ContainerError>;
