//! ボリュームマウント定義

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ボリュームマウント
///
/// ソースは名前付きボリュームまたはホストパス。先頭が `/`、`./`、`../`、`~`
/// のいずれかで始まる場合はホストパスとして扱います。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    pub source: String,
    pub container: PathBuf,
    #[serde(default)]
    pub read_only: bool,
}

impl VolumeMount {
    /// 名前付きボリュームかどうか
    pub fn is_named(&self) -> bool {
        !(self.source.starts_with('/')
            || self.source.starts_with("./")
            || self.source.starts_with("../")
            || self.source.starts_with('~'))
    }

    /// compose互換の文字列形式に変換（正規形）
    pub fn to_compose_string(&self) -> String {
        let mode = if self.read_only { ":ro" } else { "" };
        format!("{}:{}{}", self.source, self.container.display(), mode)
    }
}
