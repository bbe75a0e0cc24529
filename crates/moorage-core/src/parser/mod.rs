//! 設定パーサー
//!
//! compose互換のYAML設定をパースし、検証済みモデルへ変換します。
//! 生の形（Raw*）はファイル上の表現、検証済みの形（ServiceSpec / Mooring）は
//! コントローラが扱う不変の表現です。

mod port;
mod service;
mod timing;
mod volume;


pub use port::parse_port;
pub use service::{canonical_raw, validate_service};
pub use timing::{format_duration, parse_duration, parse_memory};
pub use volume::parse_volume;

use crate::error::{Result, ValidationError};
use crate::model::{Mooring, ServiceSpec};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// YAML設定ファイル全体の生の形
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    /// プロジェクト名。未指定時はディレクトリ名
    pub name: Option<String>,
    #[serde(default)]
    pub services: BTreeMap<String, RawService>,
    #[serde(default)]
    pub networks: Vec<String>,
    /// 名前付きボリュームの宣言（down -v の削除対象）
    #[serde(default)]
    pub volumes: Vec<String>,
}

/// サービス1つ分の生の形
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawService {
    pub image: Option<String>,
    pub container_name: Option<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, RawScalar>,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub networks: Vec<String>,
    pub deploy: Option<RawDeploy>,
    pub healthcheck: Option<RawHealthCheck>,
    pub restart: Option<String>,
    /// コンテナのentrypointが解釈する複数データベース指定（透過）
    #[serde(default)]
    pub databases: Vec<String>,
}

/// YAMLスカラー（環境変数の値は文字列・数値・真偽値を受け付ける）
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl RawScalar {
    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDeploy {
    pub resources: Option<RawResources>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResources {
    pub limits: Option<RawLimits>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLimits {
    /// "512m" / "2g" またはバイト数
    pub memory: Option<RawScalar>,
    /// "0.5" または数値
    pub cpus: Option<RawScalar>,
}

/// ヘルスチェックブロックの生の形
#[derive(Debug, Clone, Deserialize)]
pub struct RawHealthCheck {
    pub test: RawHealthTest,
    pub interval: Option<RawScalar>,
    pub timeout: Option<RawScalar>,
    pub retries: Option<u32>,
    pub start_period: Option<RawScalar>,
}

/// test はリスト形式（["CMD-SHELL", ...]）と文字列形式の両方を受け付ける
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawHealthTest {
    Command(Vec<String>),
    Shell(String),
}

/// YAMLファイルをパースして Mooring を生成
pub fn load_config_file<P: AsRef<Path>>(path: P) -> Result<Mooring> {
    let content = fs::read_to_string(path.as_ref())?;
    let default_name = path
        .as_ref()
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("moorage")
        .to_string();
    parse_config_str(&content, default_name)
}

/// YAML文字列をパース
pub fn parse_config_str(content: &str, default_name: String) -> Result<Mooring> {
    let raw: RawConfig = serde_yaml::from_str(content)?;
    validate_config(raw, default_name)
}

/// 生の設定を検証済みの Mooring へ変換
///
/// サービス単位の検証に加えて、サービスをまたいだホストポートの重複を
/// ここで拒否します。
pub fn validate_config(raw: RawConfig, default_name: String) -> Result<Mooring> {
    if raw.services.is_empty() {
        return Err(ValidationError::NoServices);
    }

    let name = raw.name.unwrap_or(default_name);

    let mut services: BTreeMap<String, ServiceSpec> = BTreeMap::new();
    let mut host_ports: HashMap<u16, String> = HashMap::new();

    for (service_name, raw_service) in raw.services {
        let spec = validate_service(&name, &service_name, raw_service)?;

        // ホストポートは全サービスを通して一意
        for mapping in &spec.ports {
            if host_ports.insert(mapping.host, service_name.clone()).is_some() {
                return Err(ValidationError::DuplicateHostPort {
                    port: mapping.host,
                    service: service_name,
                });
            }
        }

        services.insert(service_name, spec);
    }

    Ok(Mooring {
        name,
        services,
        networks: raw.networks,
        volumes: raw.volumes,
    })
}
