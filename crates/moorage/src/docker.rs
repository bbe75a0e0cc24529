use colored::Colorize;
use moorage_container::DockerRuntime;

/// Docker接続を初期化（エラーハンドリング付き）
pub async fn connect_runtime(project: &str) -> anyhow::Result<DockerRuntime> {
    match DockerRuntime::connect(project).await {
        Ok(runtime) => Ok(runtime),
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ Docker接続エラー".red().bold());
            eprintln!();
            eprintln!("{}", "原因:".yellow());
            eprintln!("  {}", e);
            eprintln!();
            eprintln!("{}", "解決方法:".yellow());
            eprintln!("  • Dockerが起動しているか確認してください");
            eprintln!("  • docker ps コマンドが正常に動作するか確認してください");
            Err(anyhow::anyhow!("Docker接続に失敗しました"))
        }
    }
}
