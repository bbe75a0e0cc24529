use crate::docker;
use colored::Colorize;
use moorage_core::Mooring;

pub async fn handle(config: &Mooring, all: bool) -> anyhow::Result<()> {
    println!("{}", "コンテナ一覧を取得中...".blue());

    // Docker接続
    let runtime = docker::connect_runtime(&config.name).await?;

    // moorage.project ラベルでフィルタ
    let mut filter_map = std::collections::HashMap::new();
    filter_map.insert(
        "label".to_string(),
        vec![format!("moorage.project={}", config.name)],
    );

    #[allow(deprecated)]
    let options = bollard::container::ListContainersOptions {
        all,
        filters: filter_map,
        ..Default::default()
    };

    #[allow(deprecated)]
    let containers = runtime.docker().list_containers(Some(options)).await?;

    println!();
    if containers.is_empty() {
        println!("{}", "実行中のコンテナはありません".dimmed());
    } else {
        println!(
            "{}",
            format!(
                "{:<24} {:<20} {:<24} {:<40}",
                "NAME", "STATUS", "IMAGE", "PORTS"
            )
            .bold()
        );
        println!("{}", "─".repeat(108).dimmed());

        for container in containers {
            let name = container
                .names
                .as_ref()
                .and_then(|n| n.first())
                .map(|n| n.trim_start_matches('/'))
                .unwrap_or("N/A");

            let status = container.status.as_deref().unwrap_or("N/A");
            let status_colored = if status.contains("Up") {
                status.green()
            } else {
                status.red()
            };

            let image = container.image.as_deref().unwrap_or("N/A");

            let ports = container
                .ports
                .as_ref()
                .map(|ports| {
                    ports
                        .iter()
                        .filter_map(|p| {
                            p.public_port
                                .map(|pub_port| format!("{}:{}", pub_port, p.private_port))
                        })
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();

            println!(
                "{:<24} {:<20} {:<24} {:<40}",
                name.cyan(),
                status_colored,
                image,
                ports.dimmed()
            );
        }
    }

    Ok(())
}
