//! ライフサイクルコントローラ
//!
//! 1サービス = 1コントローラ。状態の書き込みはコントローラのメソッドに
//! 限定し、HealthMonitor や BackupCoordinator は読み取りと報告だけを
//! 行います。

use crate::error::{ContainerError, Result};
use crate::runtime::ContainerRuntime;
use moorage_core::{ServiceSpec, ServiceState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;

/// 停止時のデフォルト猶予時間
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(10);

/// 一時的なランタイムエラーのリトライ設定（Exponential Backoff）
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大リトライ回数
    pub max_retries: u32,
    /// 初期待機時間（ミリ秒）
    pub initial_delay_ms: u64,
    /// 最大待機時間（ミリ秒）
    pub max_delay_ms: u64,
    /// Exponential倍率
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// 指定回数目の待機時間を計算（ミリ秒）
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        (delay as u64).min(self.max_delay_ms)
    }
}

/// 単一サービスのライフサイクルを駆動するコントローラ
pub struct LifecycleController<R> {
    spec: ServiceSpec,
    runtime: R,
    state: RwLock<ServiceState>,
    /// restore用のメンテナンスモードフラグ
    maintenance: AtomicBool,
    retry: RetryPolicy,
}

impl<R: ContainerRuntime> LifecycleController<R> {
    /// 初期状態 Stopped でコントローラを生成
    pub fn new(spec: ServiceSpec, runtime: R) -> Self {
        Self {
            spec,
            runtime,
            state: RwLock::new(ServiceState::Stopped),
            maintenance: AtomicBool::new(false),
            retry: RetryPolicy::default(),
        }
    }

    /// ランタイムの実状態と同期した初期状態でコントローラを生成
    ///
    /// CLIのように毎回プロセスが立ち上がる利用では、既存コンテナの
    /// 稼働状態をここで取り込みます。
    pub async fn attach(spec: ServiceSpec, runtime: R) -> Result<Self> {
        let controller = Self::new(spec, runtime);

        let state = match controller.runtime.inspect(&controller.spec.container_name).await {
            Ok(status) if status.running => ServiceState::Running,
            Ok(_) => ServiceState::Stopped,
            Err(ContainerError::ContainerNotFound { .. }) => ServiceState::Stopped,
            Err(e) => return Err(e),
        };

        *controller.state.write().await = state;
        Ok(controller)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn spec(&self) -> &ServiceSpec {
        &self.spec
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub async fn current_state(&self) -> ServiceState {
        *self.state.read().await
    }

    /// 遷移表を通した状態遷移。不正な遷移はエラー
    async fn transition(&self, to: ServiceState) -> Result<()> {
        let mut state = self.state.write().await;
        let from = *state;
        if !from.can_transition(to) {
            return Err(ContainerError::InvalidTransition { from, to });
        }
        tracing::info!(service = %self.spec.name, from = %from, to = %to, "状態遷移");
        *state = to;
        Ok(())
    }

    /// サービスを起動
    ///
    /// Stopped / Failed 以外からの呼び出しは AlreadyRunning。
    /// 一時的なランタイムエラーはリトライし、尽きたら Failed へ遷移して
    /// エラーを返します。
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            let from = *state;
            if !from.can_start() {
                return Err(ContainerError::AlreadyRunning {
                    service: self.spec.name.clone(),
                    state: from,
                });
            }
            tracing::info!(service = %self.spec.name, from = %from, to = %ServiceState::Starting, "状態遷移");
            *state = ServiceState::Starting;
        }

        match self.launch_with_retry().await {
            Ok(()) => self.transition(ServiceState::Running).await,
            Err(e) => {
                // 失敗は握りつぶさず、Failed へ落としてから伝播する
                let _ = self.transition(ServiceState::Failed).await;
                Err(e)
            }
        }
    }

    async fn launch_with_retry(&self) -> Result<()> {
        let mut attempt: u32 = 0;
        loop {
            match self.try_launch().await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() => {
                    if attempt + 1 >= self.retry.max_retries {
                        tracing::error!(
                            service = %self.spec.name,
                            error = %e,
                            "起動リトライ上限に到達"
                        );
                        return Err(ContainerError::LaunchRetriesExhausted {
                            service: self.spec.name.clone(),
                            max_retries: self.retry.max_retries,
                        });
                    }
                    let delay_ms = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        service = %self.spec.name,
                        attempt,
                        delay_ms,
                        error = %e,
                        "一時的なエラー、リトライします"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_launch(&self) -> Result<()> {
        self.runtime.create(&self.spec).await?;
        self.runtime.start(&self.spec.container_name).await
    }

    /// サービスを停止
    ///
    /// 冪等: Stopped / Failed / Stopping に対する呼び出しは成功の no-op。
    pub async fn stop(&self, grace: Duration) -> Result<()> {
        {
            let state = self.state.read().await;
            if matches!(
                *state,
                ServiceState::Stopped | ServiceState::Failed | ServiceState::Stopping
            ) {
                return Ok(());
            }
        }

        self.transition(ServiceState::Stopping).await?;

        match self.runtime.stop(&self.spec.container_name, grace).await {
            Ok(()) => {
                self.maintenance.store(false, Ordering::SeqCst);
                self.transition(ServiceState::Stopped).await
            }
            Err(e) => {
                let _ = self.transition(ServiceState::Failed).await;
                Err(e)
            }
        }
    }

    /// 再起動（stop + start）
    pub async fn restart(&self) -> Result<()> {
        self.stop(DEFAULT_STOP_GRACE).await?;
        self.start().await
    }

    /// Failed 状態からの明示的なリセット
    pub async fn reset(&self) -> Result<()> {
        self.transition(ServiceState::Stopped).await
    }

    /// コンテナを削除（Stopped のときのみ）
    pub async fn remove(&self) -> Result<()> {
        let state = self.current_state().await;
        if state.is_active() {
            return Err(ContainerError::AlreadyRunning {
                service: self.spec.name.clone(),
                state,
            });
        }
        self.runtime.remove(&self.spec.container_name).await
    }

    /// ヘルスチェック成功の報告。遷移が起きたら true
    pub async fn report_healthy(&self) -> bool {
        let mut state = self.state.write().await;
        let from = *state;
        match from {
            ServiceState::Running | ServiceState::Unhealthy => {
                tracing::info!(service = %self.spec.name, from = %from, to = %ServiceState::Healthy, "状態遷移");
                *state = ServiceState::Healthy;
                true
            }
            _ => false,
        }
    }

    /// ヘルスチェック失敗（retries超過）の報告。遷移が起きたら true
    pub async fn report_unhealthy(&self) -> bool {
        let mut state = self.state.write().await;
        let from = *state;
        match from {
            ServiceState::Running | ServiceState::Healthy => {
                tracing::warn!(service = %self.spec.name, from = %from, to = %ServiceState::Unhealthy, "状態遷移");
                *state = ServiceState::Unhealthy;
                true
            }
            _ => false,
        }
    }

    /// バックアップを安全に実行できる状態か
    ///
    /// ヘルスチェック設定がある場合は Healthy のみ。無い場合は
    /// Healthy に到達しないため Running を許容します。
    pub async fn is_backup_safe(&self) -> bool {
        match self.current_state().await {
            ServiceState::Healthy => true,
            ServiceState::Running => self.spec.healthcheck.is_none(),
            _ => false,
        }
    }

    /// restoreを安全に実行できる状態か（停止済みまたはメンテナンスモード）
    pub async fn is_restore_safe(&self) -> bool {
        self.current_state().await == ServiceState::Stopped
            || self.maintenance.load(Ordering::SeqCst)
    }

    /// メンテナンスモードに入る（稼働したままトラフィックから外す宣言）
    pub fn enter_maintenance(&self) {
        tracing::info!(service = %self.spec.name, "メンテナンスモード開始");
        self.maintenance.store(true, Ordering::SeqCst);
    }

    /// メンテナンスモードを抜ける
    pub fn exit_maintenance(&self) {
        tracing::info!(service = %self.spec.name, "メンテナンスモード終了");
        self.maintenance.store(false, Ordering::SeqCst);
    }

    pub fn in_maintenance(&self) -> bool {
        self.maintenance.load(Ordering::SeqCst)
    }
}
