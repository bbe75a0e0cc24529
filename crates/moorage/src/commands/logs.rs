use crate::docker;
use crate::utils;
use colored::Colorize;
use futures_util::stream::StreamExt;
use moorage_container::{ContainerRuntime, DockerRuntime, LogChunk};
use moorage_core::Mooring;

pub async fn handle(
    config: &Mooring,
    service: Option<String>,
    lines: usize,
    follow: bool,
) -> anyhow::Result<()> {
    println!("{}", "ログを取得中...".blue());

    // Docker接続
    let runtime = docker::connect_runtime(&config.name).await?;

    // 対象サービスの決定
    let target_services: Vec<String> = match service {
        Some(name) => {
            utils::find_service(config, &name)?;
            vec![name]
        }
        None => config.services.keys().cloned().collect(),
    };

    println!();

    // 複数サービスの場合は色を割り当て
    let colors = [
        colored::Color::Cyan,
        colored::Color::Green,
        colored::Color::Yellow,
        colored::Color::Magenta,
        colored::Color::Blue,
    ];

    for (idx, service_name) in target_services.iter().enumerate() {
        let spec = utils::find_service(config, service_name)?;
        let service_color = colors[idx % colors.len()];

        if !follow {
            println!(
                "{}",
                format!("=== {} のログ ===", service_name)
                    .bold()
                    .color(service_color)
            );
        }

        stream_service_logs(
            &runtime,
            service_name,
            &spec.container_name,
            lines,
            follow,
            service_color,
        )
        .await?;

        if !follow {
            println!();
        }
    }

    if follow {
        println!();
        println!("{}", "Ctrl+C でログ追跡を終了".dimmed());
    }

    Ok(())
}

/// 1サービス分のログをストリームして表示
pub async fn stream_service_logs(
    runtime: &DockerRuntime,
    service_name: &str,
    container_name: &str,
    lines: usize,
    follow: bool,
    color: colored::Color,
) -> anyhow::Result<()> {
    let mut stream = runtime.logs(container_name, follow, lines).await?;
    let prefix = format!("[{}]", service_name).color(color);

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(LogChunk::Stdout(message)) => {
                let msg = String::from_utf8_lossy(&message);
                for line in msg.lines() {
                    if !line.is_empty() {
                        println!("{} {}", prefix, line);
                    }
                }
            }
            Ok(LogChunk::Stderr(message)) => {
                let msg = String::from_utf8_lossy(&message);
                for line in msg.lines() {
                    if !line.is_empty() {
                        println!("{} {} {}", prefix, "stderr:".red(), line);
                    }
                }
            }
            Err(e) => {
                return Err(e.into());
            }
        }
    }

    Ok(())
}
