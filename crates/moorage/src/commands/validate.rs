use colored::Colorize;
use moorage_core::Mooring;
use std::path::Path;

/// 検証済み設定の概要を表示
///
/// 設定のロード・検証自体は main 側で完了している。ここに到達した
/// 時点で設定は有効。
pub fn handle(config: &Mooring, config_path: &Path) {
    println!("{}", "✓ 設定は有効です".green().bold());
    println!("  ファイル: {}", config_path.display().to_string().cyan());
    println!("  プロジェクト: {}", config.name.cyan());
    println!();

    for (service_name, spec) in &config.services {
        println!("{}", format!("サービス: {}", service_name).bold());
        println!("  イメージ: {}", spec.image.cyan());
        println!("  コンテナ名: {}", spec.container_name);

        if !spec.ports.is_empty() {
            let ports: Vec<String> = spec.ports.iter().map(|p| p.to_compose_string()).collect();
            println!("  ポート: {}", ports.join(", "));
        }

        if !spec.volumes.is_empty() {
            let volumes: Vec<String> =
                spec.volumes.iter().map(|v| v.to_compose_string()).collect();
            println!("  ボリューム: {}", volumes.join(", "));
        }

        if let Some(limits) = &spec.resources {
            if let Some(memory) = limits.memory_bytes {
                println!("  メモリ上限: {} bytes", memory);
            }
            if let Some(cpus) = limits.cpus {
                println!("  CPU上限: {}", cpus);
            }
        }

        match &spec.healthcheck {
            Some(hc) => {
                println!(
                    "  ヘルスチェック: interval={:?} timeout={:?} retries={} start_period={:?}",
                    hc.interval, hc.timeout, hc.retries, hc.start_period
                );
            }
            None => {
                println!("  ヘルスチェック: {}", "なし".dimmed());
            }
        }

        println!();
    }
}
