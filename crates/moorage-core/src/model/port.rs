//! ポートマッピング定義

use serde::{Deserialize, Serialize};

/// ホストとコンテナのポートマッピング
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    /// バインド先ホストIP（未指定は 0.0.0.0）
    pub host_ip: Option<String>,
    pub host: u16,
    pub container: u16,
    #[serde(default)]
    pub protocol: Protocol,
}

/// プロトコル
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl PortMapping {
    /// compose互換の文字列形式に変換（正規形）
    pub fn to_compose_string(&self) -> String {
        let mut s = String::new();
        if let Some(ip) = &self.host_ip {
            s.push_str(ip);
            s.push(':');
        }
        s.push_str(&format!("{}:{}", self.host, self.container));
        if self.protocol == Protocol::Udp {
            s.push_str("/udp");
        }
        s
    }
}
