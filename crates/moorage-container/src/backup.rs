//! バックアップ／リストアの調停
//!
//! 同一サービスに対する backup / restore は専用トークンで直列化します。
//! トークンが取れない呼び出しはキューイングせず即座に
//! BackupInProgress で失敗します。

use crate::controller::LifecycleController;
use crate::error::{ContainerError, Result};
use crate::runtime::ContainerRuntime;
use chrono::Utc;
use moorage_core::{BackupJob, BackupStatus};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;

/// 単一サービスのバックアップ調停役
pub struct BackupCoordinator<R> {
    controller: Arc<LifecycleController<R>>,
    /// 同時実行を1つに制限するトークン
    token: Mutex<()>,
}

impl<R: ContainerRuntime> BackupCoordinator<R> {
    pub fn new(controller: Arc<LifecycleController<R>>) -> Self {
        Self {
            controller,
            token: Mutex::new(()),
        }
    }

    /// pg_dump によるバックアップを実行
    ///
    /// 前提: コントローラが healthy を報告していること。
    /// 同時に1つしか実行できず、2つ目の呼び出しは BackupInProgress。
    /// timeout 超過時は exec を中断して Timeout を返します。
    pub async fn backup(&self, outfile: &Path, time_limit: Duration) -> Result<BackupJob> {
        let service = self.controller.spec().name.clone();

        if !self.controller.is_backup_safe().await {
            return Err(ContainerError::NotHealthy {
                service,
                state: self.controller.current_state().await,
            });
        }

        let _guard = self
            .token
            .try_lock()
            .map_err(|_| ContainerError::BackupInProgress {
                service: service.clone(),
            })?;

        let mut job = BackupJob::new(service.clone(), Utc::now());
        tracing::info!(job = %job.id, service = %service, "バックアップ開始");

        job.status = BackupStatus::Running;

        let container = self.controller.spec().container_name.clone();
        let cmd = self.dump_command();

        let output = match timeout(
            time_limit,
            self.controller.runtime().exec(&container, &cmd, None),
        )
        .await
        {
            Err(_) => {
                // タイムアウト: exec の future は drop 済み（接続も閉じる）
                job.status = BackupStatus::Failed;
                tracing::error!(job = %job.id, "pg_dump がタイムアウト");
                return Err(ContainerError::Timeout {
                    operation: "pg_dump".to_string(),
                    timeout: time_limit,
                });
            }
            Ok(Err(e)) => {
                job.status = BackupStatus::Failed;
                return Err(e);
            }
            Ok(Ok(output)) => output,
        };

        if !output.success() {
            job.status = BackupStatus::Failed;
            return Err(ContainerError::ExternalTool {
                tool: "pg_dump".to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        tokio::fs::write(outfile, &output.stdout).await?;

        job.status = BackupStatus::Succeeded;
        job.output = Some(outfile.to_path_buf());
        tracing::info!(job = %job.id, outfile = %outfile.display(), "バックアップ完了");

        Ok(job)
    }

    /// psql によるリストアを実行
    ///
    /// 前提: サービスが停止済みか、メンテナンスモードであること。
    /// 稼働中のサービスに対しては何も実行せず UnsafeRestore で失敗します。
    pub async fn restore(&self, infile: &Path, time_limit: Duration) -> Result<()> {
        let service = self.controller.spec().name.clone();

        if !self.controller.is_restore_safe().await {
            return Err(ContainerError::UnsafeRestore {
                service,
                state: self.controller.current_state().await,
            });
        }

        let _guard = self
            .token
            .try_lock()
            .map_err(|_| ContainerError::BackupInProgress {
                service: service.clone(),
            })?;

        tracing::info!(service = %service, infile = %infile.display(), "リストア開始");

        let dump = tokio::fs::read(infile).await?;
        let container = self.controller.spec().container_name.clone();
        let cmd = self.restore_command();

        let output = match timeout(
            time_limit,
            self.controller.runtime().exec(&container, &cmd, Some(dump)),
        )
        .await
        {
            Err(_) => {
                tracing::error!(service = %service, "psql がタイムアウト");
                return Err(ContainerError::Timeout {
                    operation: "psql".to_string(),
                    timeout: time_limit,
                });
            }
            Ok(result) => result?,
        };

        if !output.success() {
            return Err(ContainerError::ExternalTool {
                tool: "psql".to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        tracing::info!(service = %service, "リストア完了");
        Ok(())
    }

    fn dump_command(&self) -> Vec<String> {
        let spec = self.controller.spec();
        vec![
            "pg_dump".to_string(),
            "-U".to_string(),
            spec.postgres_user().to_string(),
            "-d".to_string(),
            spec.postgres_db().to_string(),
            "--clean".to_string(),
            "--if-exists".to_string(),
        ]
    }

    fn restore_command(&self) -> Vec<String> {
        let spec = self.controller.spec();
        vec![
            "psql".to_string(),
            "-U".to_string(),
            spec.postgres_user().to_string(),
            "-d".to_string(),
            spec.postgres_db().to_string(),
            "-v".to_string(),
            "ON_ERROR_STOP=1".to_string(),
        ]
    }
}
