use crate::docker;
use crate::utils;
use colored::Colorize;
use moorage_container::{BackupCoordinator, LifecycleController, RetryPolicy, wait_for_healthy};
use moorage_core::Mooring;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn handle(
    config: &Mooring,
    service: String,
    outfile: &Path,
    timeout_secs: u64,
) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("サービス '{}' をバックアップ中...", service).green()
    );

    let spec = utils::find_service(config, &service)?;

    // Docker接続
    let runtime = docker::connect_runtime(&config.name).await?;

    let controller = Arc::new(LifecycleController::attach(spec.clone(), runtime).await?);

    // 稼働中なら、まずヘルスチェックで healthy を確立する
    if controller.spec().healthcheck.is_some() && controller.current_state().await.is_active() {
        println!("{}", "⏳ ヘルスチェックを確認中...".blue());
        wait_for_healthy(controller.as_ref(), &RetryPolicy::default()).await?;
    }

    let coordinator = BackupCoordinator::new(Arc::clone(&controller));
    let job = coordinator
        .backup(outfile, Duration::from_secs(timeout_secs))
        .await?;

    println!();
    println!("{}", "✓ バックアップ完了".green().bold());
    println!("  ジョブID: {}", job.id.cyan());
    if let Some(output) = &job.output {
        println!("  出力先: {}", output.display().to_string().cyan());
    }

    Ok(())
}
