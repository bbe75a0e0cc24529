use crate::commands::logs::stream_service_logs;
use crate::docker;
use colored::Colorize;
use moorage_container::{
    ContainerError, HealthMonitor, LifecycleController, RetryPolicy, wait_for_healthy,
};
use moorage_core::Mooring;
use std::sync::Arc;

pub async fn handle(config: &Mooring, detach: bool) -> anyhow::Result<()> {
    println!("プロジェクト: {}", config.name.cyan());
    println!();
    println!(
        "{}",
        format!("サービス一覧 ({} 個):", config.services.len()).bold()
    );
    for service_name in config.services.keys() {
        println!("  • {}", service_name.cyan());
    }

    // Docker接続
    println!();
    println!("{}", "Dockerに接続中...".blue());
    let runtime = docker::connect_runtime(&config.name).await?;

    // ネットワーク作成
    for network in config.all_networks() {
        println!();
        println!("{}", format!("🌐 ネットワーク: {}", network).blue());

        let network_config = bollard::models::NetworkCreateRequest {
            name: network.clone(),
            driver: Some("bridge".to_string()),
            ..Default::default()
        };

        match runtime.docker().create_network(network_config).await {
            Ok(_) => {
                println!("  ✓ ネットワーク作成完了");
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 409, ..
            }) => {
                println!("  ℹ ネットワークは既に存在します");
            }
            Err(e) => {
                eprintln!("  ⚠ ネットワーク作成エラー: {}", e);
            }
        }
    }

    // 各サービスを起動
    let mut controllers = Vec::new();
    for (service_name, spec) in &config.services {
        println!();
        println!(
            "{}",
            format!("▶ {} を起動中...", service_name).green().bold()
        );

        let controller =
            Arc::new(LifecycleController::attach(spec.clone(), runtime.clone()).await?);

        match controller.start().await {
            Ok(()) => println!("  ✓ 起動完了"),
            Err(ContainerError::AlreadyRunning { .. }) => {
                println!("  ℹ 既に起動しています");
            }
            Err(e) => return Err(e.into()),
        }

        controllers.push((service_name.clone(), controller));
    }

    // ヘルスチェックの成功を待つ
    let policy = RetryPolicy::default();
    for (service_name, controller) in &controllers {
        if controller.spec().healthcheck.is_some() {
            println!();
            println!(
                "{}",
                format!("⏳ {} の準備完了を待機中...", service_name).blue()
            );
            wait_for_healthy(controller.as_ref(), &policy).await?;
            println!("  ✓ healthy");
        }
    }

    println!();
    println!("{}", "✓ すべてのサービスが起動しました！".green().bold());

    if detach {
        return Ok(());
    }

    // 常駐監視とログ追跡（Ctrl+Cで終了、コンテナは起動したまま）
    for (_, controller) in &controllers {
        let monitor = HealthMonitor::new(Arc::clone(controller));
        tokio::spawn(monitor.run());
    }

    let colors = [
        colored::Color::Cyan,
        colored::Color::Green,
        colored::Color::Yellow,
        colored::Color::Magenta,
        colored::Color::Blue,
    ];

    for (idx, (service_name, controller)) in controllers.iter().enumerate() {
        let runtime = runtime.clone();
        let service_name = service_name.clone();
        let container_name = controller.spec().container_name.clone();
        let color = colors[idx % colors.len()];
        tokio::spawn(async move {
            if let Err(e) =
                stream_service_logs(&runtime, &service_name, &container_name, 0, true, color).await
            {
                eprintln!("  ⚠ ログ取得エラー ({}): {}", service_name, e);
            }
        });
    }

    println!();
    println!("{}", "Ctrl+C で終了（コンテナは起動したままです）".dimmed());
    tokio::signal::ctrl_c().await?;

    Ok(())
}
