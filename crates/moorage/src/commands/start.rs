use crate::docker;
use crate::utils;
use colored::Colorize;
use moorage_container::{ContainerError, LifecycleController};
use moorage_core::Mooring;

pub async fn handle(config: &Mooring, service: String) -> anyhow::Result<()> {
    println!("{}", format!("サービス '{}' を起動中...", service).green());

    let spec = utils::find_service(config, &service)?;

    // Docker接続
    let runtime = docker::connect_runtime(&config.name).await?;

    let controller = LifecycleController::attach(spec.clone(), runtime).await?;

    match controller.start().await {
        Ok(()) => {
            println!();
            println!(
                "{}",
                format!("✓ '{}' を起動しました", service).green().bold()
            );
            Ok(())
        }
        Err(ContainerError::AlreadyRunning { .. }) => {
            println!();
            println!(
                "{}",
                format!("ℹ '{}' は既に起動しています", service).dimmed()
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
