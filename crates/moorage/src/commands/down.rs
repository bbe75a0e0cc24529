use crate::docker;
use colored::Colorize;
use moorage_container::{DEFAULT_STOP_GRACE, LifecycleController};
use moorage_core::Mooring;

pub async fn handle(config: &Mooring, volumes: bool) -> anyhow::Result<()> {
    println!("{}", "サービスを停止中...".yellow());
    println!("プロジェクト: {}", config.name.cyan());

    // Docker接続
    println!();
    println!("{}", "Dockerに接続中...".blue());
    let runtime = docker::connect_runtime(&config.name).await?;

    // 各サービスを停止・削除
    for (service_name, spec) in &config.services {
        println!();
        println!(
            "{}",
            format!("■ {} を停止中...", service_name).yellow().bold()
        );

        let controller = LifecycleController::attach(spec.clone(), runtime.clone()).await?;

        match controller.stop(DEFAULT_STOP_GRACE).await {
            Ok(()) => println!("  ✓ 停止完了"),
            Err(e) => {
                println!("  ⚠ 停止エラー: {}", e);
                continue;
            }
        }

        match controller.remove().await {
            Ok(()) => println!("  ✓ 削除完了"),
            Err(e) => println!("  ⚠ 削除エラー: {}", e),
        }
    }

    // ネットワーク削除
    for network in config.all_networks() {
        println!();
        println!("{}", format!("🌐 ネットワーク削除: {}", network).yellow());

        match runtime.docker().remove_network(&network).await {
            Ok(_) => {
                println!("  ✓ ネットワーク削除完了");
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                println!("  ℹ ネットワークは既に存在しません");
            }
            Err(e) => {
                // 他のプロジェクトのコンテナが接続されている可能性
                println!("  ⚠ ネットワーク削除エラー: {}", e);
            }
        }
    }

    // --volumes フラグが指定されている場合は名前付きボリュームも削除
    if volumes {
        for volume in &config.volumes {
            println!();
            println!("{}", format!("🗑 ボリューム削除: {}", volume).yellow());

            match runtime
                .docker()
                .remove_volume(volume, None::<bollard::query_parameters::RemoveVolumeOptions>)
                .await
            {
                Ok(_) => {
                    println!("  ✓ ボリューム削除完了");
                }
                Err(bollard::errors::Error::DockerResponseServerError {
                    status_code: 404, ..
                }) => {
                    println!("  ℹ ボリュームは既に存在しません");
                }
                Err(e) => {
                    println!("  ⚠ ボリューム削除エラー: {}", e);
                }
            }
        }
    }

    println!();
    if volumes {
        println!(
            "{}",
            "✓ すべてのサービスが停止・削除されました！".green().bold()
        );
    } else {
        println!("{}", "✓ すべてのサービスが停止しました！".green().bold());
        println!(
            "{}",
            "  データボリュームを削除するには --volumes フラグを使用してください".dimmed()
        );
    }

    Ok(())
}
