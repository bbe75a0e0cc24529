//! ポート文字列のパース

use crate::error::{Result, ValidationError};
use crate::model::{PortMapping, Protocol};

/// compose形式のポート文字列をパース
///
/// 受け付ける形式:
/// - "8080:80"
/// - "127.0.0.1:5432:5432"
/// - 末尾の "/udp" または "/tcp"
pub fn parse_port(value: &str) -> Result<PortMapping> {
    let invalid = |message: &str| ValidationError::InvalidPort {
        value: value.to_string(),
        message: message.to_string(),
    };

    let (spec, protocol) = match value.rsplit_once('/') {
        Some((spec, "tcp")) => (spec, Protocol::Tcp),
        Some((spec, "udp")) => (spec, Protocol::Udp),
        Some((_, other)) => {
            return Err(invalid(&format!("未知のプロトコル '{}'", other)));
        }
        None => (value, Protocol::Tcp),
    };

    let parts: Vec<&str> = spec.split(':').collect();
    let (host_ip, host_str, container_str) = match parts.as_slice() {
        [host, container] => (None, *host, *container),
        [ip, host, container] => (Some((*ip).to_string()), *host, *container),
        _ => return Err(invalid("\"[IP:]ホスト:コンテナ\" の形式で指定してください")),
    };

    let host: u16 = host_str
        .parse()
        .map_err(|_| invalid(&format!("ホストポート '{}' が数値ではありません", host_str)))?;
    let container: u16 = container_str.parse().map_err(|_| {
        invalid(&format!(
            "コンテナポート '{}' が数値ではありません",
            container_str
        ))
    })?;

    Ok(PortMapping {
        host_ip,
        host,
        container,
        protocol,
    })
}
