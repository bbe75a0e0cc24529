//! ライフサイクル状態とバックアップジョブ

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// 管理対象サービスのライフサイクル状態
///
/// 状態の所有者は LifecycleController のみ。遷移は `can_transition` の
/// 遷移表を通してのみ行われます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceState {
    /// コンテナが存在しない、または停止済み
    Stopped,
    /// 起動処理中（create + start）
    Starting,
    /// 起動確認済み。ヘルスチェック未確定（または未設定）
    Running,
    /// ヘルスチェック成功が確認された稼働状態
    Healthy,
    /// 連続失敗が retries に達した稼働状態
    Unhealthy,
    /// 停止処理中
    Stopping,
    /// 回復不能なエラー。明示的な reset が必要
    Failed,
}

impl ServiceState {
    /// start を受け付ける状態か
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }

    /// コンテナが稼働している（はずの）状態か
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Starting | Self::Running | Self::Healthy | Self::Unhealthy
        )
    }

    /// ヘルスチェック監視の対象となる状態か
    pub fn is_monitorable(&self) -> bool {
        self.is_active()
    }

    /// 遷移表。許可された遷移のみ true を返す
    pub fn can_transition(self, next: ServiceState) -> bool {
        use ServiceState::*;
        matches!(
            (self, next),
            (Stopped, Starting)
                | (Failed, Starting)
                | (Failed, Stopped)
                | (Starting, Running)
                | (Starting, Stopping)
                | (Starting, Failed)
                | (Running, Healthy)
                | (Running, Unhealthy)
                | (Running, Stopping)
                | (Running, Failed)
                | (Healthy, Unhealthy)
                | (Healthy, Stopping)
                | (Healthy, Failed)
                | (Unhealthy, Healthy)
                | (Unhealthy, Stopping)
                | (Unhealthy, Failed)
                | (Stopping, Stopped)
                | (Stopping, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
            Self::Stopping => "stopping",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// バックアップジョブ
///
/// 完了後は status 以外不変。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupJob {
    pub id: String,
    pub service: String,
    pub started_at: DateTime<Utc>,
    pub status: BackupStatus,
    /// 成功時のみ設定される出力先
    pub output: Option<PathBuf>,
}

impl BackupJob {
    pub fn new(service: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        let service = service.into();
        let id = format!("{}-{}", service, started_at.format("%Y%m%d%H%M%S"));
        Self {
            id,
            service,
            started_at,
            status: BackupStatus::Pending,
            output: None,
        }
    }
}

/// バックアップジョブの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}
