//! サービス定義

use super::port::PortMapping;
use super::volume::VolumeMount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// 検証済みのサービス定義
///
/// `validate_service` を通過した時点で不変。環境変数のデフォルト適用や
/// ポート・ボリューム文字列の展開はすべて検証時に完了しています。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// サービス名（設定ファイル上のキー）
    pub name: String,
    pub image: String,
    /// コンテナ名。未指定時は {project}-{service}
    pub container_name: String,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub ports: Vec<PortMapping>,
    #[serde(default)]
    pub volumes: Vec<VolumeMount>,
    #[serde(default)]
    pub networks: Vec<String>,
    pub resources: Option<ResourceLimits>,
    pub healthcheck: Option<HealthCheckSpec>,
    /// 再起動ポリシー (no, always, on-failure, unless-stopped)
    pub restart: Option<RestartPolicy>,
    /// POSTGRES_MULTIPLE_DATABASES へ畳み込まれる透過設定。
    /// 解釈はコンテナ側のentrypointに委ねます。
    #[serde(default)]
    pub databases: Vec<String>,
}

impl ServiceSpec {
    /// POSTGRES_USER（デフォルト postgres）
    pub fn postgres_user(&self) -> &str {
        self.environment
            .get("POSTGRES_USER")
            .map(String::as_str)
            .unwrap_or("postgres")
    }

    /// POSTGRES_DB（未指定時はユーザー名）
    pub fn postgres_db(&self) -> &str {
        self.environment
            .get("POSTGRES_DB")
            .map(String::as_str)
            .unwrap_or_else(|| self.postgres_user())
    }
}

/// ヘルスチェック設定
///
/// 不変条件: timeout < interval（検証時に強制）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    /// テストコマンド (CMD-SHELL形式またはCMD形式)
    pub test: Vec<String>,
    /// チェック間隔
    pub interval: Duration,
    /// 1回のチェックのタイムアウト
    pub timeout: Duration,
    /// Unhealthy 判定までの連続失敗回数
    pub retries: u32,
    /// 起動直後の猶予期間（この間は失敗をカウントしない）
    pub start_period: Duration,
}

impl HealthCheckSpec {
    /// CMD / CMD-SHELL 形式を実際の実行コマンドへ展開
    pub fn command(&self) -> Vec<String> {
        match self.test.first().map(String::as_str) {
            Some("CMD-SHELL") => vec![
                "/bin/sh".to_string(),
                "-c".to_string(),
                self.test[1..].join(" "),
            ],
            Some("CMD") => self.test[1..].to_vec(),
            _ => self.test.clone(),
        }
    }
}

/// リソース制限
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// メモリ上限（バイト）
    pub memory_bytes: Option<u64>,
    /// CPU上限（コア数、小数可）
    pub cpus: Option<f64>,
}

impl ResourceLimits {
    /// Docker APIの NanoCpus 表現
    pub fn nano_cpus(&self) -> Option<i64> {
        self.cpus.map(|c| (c * 1_000_000_000.0) as i64)
    }
}

/// 再起動ポリシー
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// 再起動しない（デフォルト）
    #[default]
    No,
    /// 常に再起動
    Always,
    /// 異常終了時のみ再起動
    OnFailure,
    /// 明示的に停止しない限り再起動
    UnlessStopped,
}

impl RestartPolicy {
    /// 文字列からパース
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "no" => Some(Self::No),
            "always" => Some(Self::Always),
            "on-failure" | "on_failure" => Some(Self::OnFailure),
            "unless-stopped" | "unless_stopped" => Some(Self::UnlessStopped),
            _ => None,
        }
    }

    /// Docker APIで使用する文字列に変換
    pub fn as_docker_str(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Always => "always",
            Self::OnFailure => "on-failure",
            Self::UnlessStopped => "unless-stopped",
        }
    }
}
