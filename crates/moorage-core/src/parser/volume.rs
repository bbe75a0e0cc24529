//! ボリューム文字列のパース

use crate::error::{Result, ValidationError};
use crate::model::VolumeMount;
use std::path::PathBuf;

/// compose形式のボリューム文字列をパース
///
/// 受け付ける形式: "ソース:コンテナパス" / "ソース:コンテナパス:ro"
/// ソースは名前付きボリュームまたはホストパス。コンテナパスは絶対パス。
pub fn parse_volume(value: &str) -> Result<VolumeMount> {
    let parts: Vec<&str> = value.split(':').collect();

    let (source, container, mode) = match parts.as_slice() {
        [source, container] => (*source, *container, None),
        [source, container, mode] => (*source, *container, Some(*mode)),
        _ => return Err(ValidationError::InvalidVolume(value.to_string())),
    };

    if source.is_empty() || !container.starts_with('/') {
        return Err(ValidationError::InvalidVolume(value.to_string()));
    }

    let read_only = match mode {
        None | Some("rw") => false,
        Some("ro") => true,
        Some(_) => return Err(ValidationError::InvalidVolume(value.to_string())),
    };

    Ok(VolumeMount {
        source: source.to_string(),
        container: PathBuf::from(container),
        read_only,
    })
}
