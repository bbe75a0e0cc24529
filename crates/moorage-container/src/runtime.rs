//! コンテナランタイムのトレイト

use crate::error::Result;
use futures_util::stream::BoxStream;
use moorage_core::ServiceSpec;
use std::time::Duration;

/// コンテナランタイムのトレイト
///
/// コア側はランタイムを実装せず、この狭い能力インターフェースだけを
/// 呼び出します。テストではフェイク実装に差し替えます。
#[allow(async_fn_in_trait)]
pub trait ContainerRuntime {
    /// コンテナを作成してIDを返す。既存の同名コンテナは再利用する
    async fn create(&self, spec: &ServiceSpec) -> Result<String>;

    async fn start(&self, container: &str) -> Result<()>;

    /// 停止。graceを過ぎたら強制終了。停止済みなら成功扱い
    async fn stop(&self, container: &str, grace: Duration) -> Result<()>;

    async fn remove(&self, container: &str) -> Result<()>;

    async fn inspect(&self, container: &str) -> Result<ContainerStatus>;

    /// コンテナ内でコマンドを実行し、出力と終了コードを返す
    async fn exec(
        &self,
        container: &str,
        cmd: &[String],
        stdin: Option<Vec<u8>>,
    ) -> Result<ExecOutput>;

    /// コンテナのログをストリームで取得
    async fn logs(
        &self,
        container: &str,
        follow: bool,
        tail: usize,
    ) -> Result<BoxStream<'static, Result<LogChunk>>>;
}

/// コンテナのステータス
#[derive(Debug, Clone)]
pub struct ContainerStatus {
    pub name: String,
    pub running: bool,
    pub image: String,
}

/// exec の実行結果
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub exit_code: i64,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// ログの1チャンク
#[derive(Debug, Clone)]
pub enum LogChunk {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
}
