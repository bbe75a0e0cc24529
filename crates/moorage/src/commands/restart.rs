use crate::docker;
use crate::utils;
use colored::Colorize;
use moorage_container::LifecycleController;
use moorage_core::Mooring;

pub async fn handle(config: &Mooring, service: String) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("サービス '{}' を再起動中...", service).yellow()
    );

    let spec = utils::find_service(config, &service)?;

    // Docker接続
    let runtime = docker::connect_runtime(&config.name).await?;

    let controller = LifecycleController::attach(spec.clone(), runtime).await?;
    controller.restart().await?;

    println!();
    println!(
        "{}",
        format!("✓ '{}' を再起動しました", service).green().bold()
    );

    Ok(())
}
