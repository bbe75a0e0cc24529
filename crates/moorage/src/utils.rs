use moorage_container::ContainerError;
use moorage_core::{Mooring, ServiceSpec, ValidationError};

/// エラー種別ごとの安定した終了コード
///
/// 0: 成功 / 1: その他 / 2: 設定・検証エラー / 3: 前提条件違反 /
/// 4: バックアップ競合 / 5: タイムアウト / 6: 外部ツール失敗
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.downcast_ref::<ValidationError>().is_some() {
            return 2;
        }
        if cause.downcast_ref::<moorage_config::ConfigError>().is_some() {
            return 2;
        }
        if let Some(e) = cause.downcast_ref::<ContainerError>() {
            return match e {
                ContainerError::AlreadyRunning { .. }
                | ContainerError::NotHealthy { .. }
                | ContainerError::UnsafeRestore { .. } => 3,
                ContainerError::BackupInProgress { .. } => 4,
                ContainerError::Timeout { .. } => 5,
                ContainerError::ExternalTool { .. } => 6,
                _ => 1,
            };
        }
    }
    1
}

/// サービス定義を取得（無ければエラー）
pub fn find_service<'a>(config: &'a Mooring, service: &str) -> anyhow::Result<&'a ServiceSpec> {
    config.service(service).ok_or_else(|| {
        anyhow::anyhow!(
            "サービス '{}' が見つかりません\n利用可能なサービス: {}",
            service,
            config
                .services
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}
