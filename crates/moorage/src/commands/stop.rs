use crate::docker;
use crate::utils;
use colored::Colorize;
use moorage_container::LifecycleController;
use moorage_core::{Mooring, ServiceState};
use std::time::Duration;

pub async fn handle(config: &Mooring, service: String, grace: u64) -> anyhow::Result<()> {
    println!("{}", format!("サービス '{}' を停止中...", service).yellow());

    let spec = utils::find_service(config, &service)?;

    // Docker接続
    let runtime = docker::connect_runtime(&config.name).await?;

    let controller = LifecycleController::attach(spec.clone(), runtime).await?;

    if controller.current_state().await == ServiceState::Stopped {
        println!();
        println!(
            "{}",
            format!("ℹ '{}' は既に停止しています", service).dimmed()
        );
        // 冪等: 停止済みに対する stop も成功
        return Ok(());
    }

    controller.stop(Duration::from_secs(grace)).await?;

    println!();
    println!(
        "{}",
        format!("✓ '{}' を停止しました", service).green().bold()
    );

    Ok(())
}
