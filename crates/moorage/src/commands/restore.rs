use crate::docker;
use crate::utils;
use colored::Colorize;
use moorage_container::{BackupCoordinator, LifecycleController};
use moorage_core::Mooring;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn handle(
    config: &Mooring,
    service: String,
    infile: &Path,
    maintenance: bool,
    timeout_secs: u64,
) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("サービス '{}' をリストア中...", service).yellow()
    );

    let spec = utils::find_service(config, &service)?;

    if !infile.exists() {
        return Err(anyhow::anyhow!(
            "入力ファイルが見つかりません: {}",
            infile.display()
        ));
    }

    // Docker接続
    let runtime = docker::connect_runtime(&config.name).await?;

    let controller = Arc::new(LifecycleController::attach(spec.clone(), runtime).await?);

    // --maintenance 指定時は稼働したままトラフィックから外す宣言をして実行。
    // 指定が無く稼働中の場合は UnsafeRestore で失敗する
    if maintenance {
        controller.enter_maintenance();
    }

    let coordinator = BackupCoordinator::new(Arc::clone(&controller));
    let result = coordinator
        .restore(infile, Duration::from_secs(timeout_secs))
        .await;

    if maintenance {
        controller.exit_maintenance();
    }

    result?;

    println!();
    println!("{}", "✓ リストア完了".green().bold());
    println!("  入力元: {}", infile.display().to_string().cyan());

    Ok(())
}
