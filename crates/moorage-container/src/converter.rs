//! ServiceSpec から Docker API パラメータへの変換

use bollard::container::{Config, CreateContainerOptions, NetworkingConfig};
use bollard::models::{EndpointSettings, HostConfig, PortBinding, RestartPolicy, RestartPolicyNameEnum};
use moorage_core::{Protocol, ServiceSpec};
use std::collections::HashMap;

/// ServiceSpecをDockerのコンテナ設定に変換
pub fn spec_to_container_config(
    project_name: &str,
    spec: &ServiceSpec,
) -> (Config<String>, CreateContainerOptions<String>) {
    // 環境変数の設定
    let env: Vec<String> = spec
        .environment
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();

    // ポートバインディングの設定
    let mut port_bindings = HashMap::new();
    let mut exposed_ports = HashMap::new();

    for port in &spec.ports {
        let container_port = format!("{}/{}", port.container, port.protocol.as_str());

        // ポート公開設定
        exposed_ports.insert(container_port.clone(), HashMap::new());

        // ホストポートバインディング
        let host_ip = port.host_ip.as_deref().unwrap_or("0.0.0.0");
        port_bindings.insert(
            container_port,
            Some(vec![PortBinding {
                host_ip: Some(host_ip.to_string()),
                host_port: Some(port.host.to_string()),
            }]),
        );
    }

    // ボリュームバインディング
    let binds: Vec<String> = spec
        .volumes
        .iter()
        .map(|v| {
            let mode = if v.read_only { "ro" } else { "rw" };
            // 名前付きボリュームはそのまま、相対ホストパスは絶対パスに変換
            let source = if v.is_named() {
                v.source.clone()
            } else {
                let path = std::path::PathBuf::from(&v.source);
                if path.is_relative() {
                    std::env::current_dir()
                        .map(|cwd| cwd.join(&path))
                        .unwrap_or(path)
                        .display()
                        .to_string()
                } else {
                    v.source.clone()
                }
            };
            format!("{}:{}:{}", source, v.container.display(), mode)
        })
        .collect();

    // リソース制限
    let (memory, nano_cpus) = match &spec.resources {
        Some(limits) => (
            limits.memory_bytes.map(|b| b as i64),
            limits.nano_cpus(),
        ),
        None => (None, None),
    };

    // 再起動ポリシー
    let restart_policy = spec.restart.map(|policy| RestartPolicy {
        name: Some(match policy {
            moorage_core::RestartPolicy::No => RestartPolicyNameEnum::NO,
            moorage_core::RestartPolicy::Always => RestartPolicyNameEnum::ALWAYS,
            moorage_core::RestartPolicy::OnFailure => RestartPolicyNameEnum::ON_FAILURE,
            moorage_core::RestartPolicy::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
        }),
        maximum_retry_count: None,
    });

    // HostConfig設定
    let host_config = Some(HostConfig {
        port_bindings: Some(port_bindings),
        binds: Some(binds),
        memory,
        nano_cpus,
        restart_policy,
        network_mode: spec.networks.first().cloned(),
        ..Default::default()
    });

    // ラベル設定（composeツール互換のグループ化）
    let mut labels = HashMap::new();
    labels.insert(
        "com.docker.compose.project".to_string(),
        project_name.to_string(),
    );
    labels.insert(
        "com.docker.compose.service".to_string(),
        spec.name.clone(),
    );
    labels.insert("moorage.project".to_string(), project_name.to_string());
    labels.insert("moorage.service".to_string(), spec.name.clone());

    // ネットワーク設定（サービス名でエイリアス）
    let networking_config = spec.networks.first().map(|network| {
        let mut endpoints = HashMap::new();
        endpoints.insert(
            network.clone(),
            EndpointSettings {
                aliases: Some(vec![spec.name.clone()]),
                ..Default::default()
            },
        );
        NetworkingConfig {
            endpoints_config: endpoints,
        }
    });

    // コンテナ設定
    let config = Config {
        image: Some(spec.image.clone()),
        env: Some(env),
        exposed_ports: Some(exposed_ports),
        host_config,
        labels: Some(labels),
        networking_config,
        ..Default::default()
    };

    let options = CreateContainerOptions {
        name: spec.container_name.clone(),
        platform: None,
    };

    (config, options)
}
