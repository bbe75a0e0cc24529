//! プロジェクト定義

use super::service::ServiceSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 検証済みのプロジェクト全体
///
/// 1サービス = 1コンテナ = 1 LifecycleController。サービス同士は
/// 可変状態を共有しません。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mooring {
    pub name: String,
    pub services: BTreeMap<String, ServiceSpec>,
    #[serde(default)]
    pub networks: Vec<String>,
    /// 名前付きボリュームの宣言
    #[serde(default)]
    pub volumes: Vec<String>,
}

impl Mooring {
    /// サービス定義を取得
    pub fn service(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.get(name)
    }

    /// プロジェクトが使う全ネットワーク名（トップレベル + サービス単位）
    pub fn all_networks(&self) -> Vec<String> {
        let mut names = self.networks.clone();
        for spec in self.services.values() {
            for net in &spec.networks {
                if !names.contains(net) {
                    names.push(net.clone());
                }
            }
        }
        names
    }
}
