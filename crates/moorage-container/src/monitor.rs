//! ヘルスチェック監視
//!
//! HealthMonitor は対象サービスごとに1つのバックグラウンドタスクとして
//! 動きます。ループは直列なので、同一対象に対して同時に実行される
//! チェックは常に高々1つです。スローチェック中に発火した tick は
//! MissedTickBehavior::Skip により捨てられます（キューイングしない）。

use crate::controller::{LifecycleController, RetryPolicy};
use crate::error::{ContainerError, Result};
use crate::runtime::ContainerRuntime;
use moorage_core::HealthCheckSpec;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};

/// ヘルスチェック監視タスク
pub struct HealthMonitor<R> {
    controller: Arc<LifecycleController<R>>,
}

impl<R: ContainerRuntime> HealthMonitor<R> {
    pub fn new(controller: Arc<LifecycleController<R>>) -> Self {
        Self { controller }
    }

    /// 監視ループ
    ///
    /// start_period 経過後、interval ごとにチェックを実行。
    /// retries 回連続で失敗したら Unhealthy を一度だけ報告し、
    /// 1回の成功でカウンタをリセットして Healthy を報告します。
    /// 対象が稼働状態を離れたらループを抜けます。
    pub async fn run(self) {
        let Some(hc) = self.controller.spec().healthcheck.clone() else {
            return;
        };
        let service = self.controller.spec().name.clone();

        sleep(hc.start_period).await;

        let mut ticker = interval(hc.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut failures: u32 = 0;

        loop {
            ticker.tick().await;

            let state = self.controller.current_state().await;
            if !state.is_monitorable() {
                tracing::debug!(service = %service, state = %state, "監視を終了");
                break;
            }

            if self.run_check(&hc).await {
                failures = 0;
                if self.controller.report_healthy().await {
                    tracing::info!(service = %service, "ヘルスチェック成功");
                }
            } else {
                failures += 1;
                tracing::debug!(
                    service = %service,
                    failures,
                    retries = hc.retries,
                    "ヘルスチェック失敗"
                );
                // retries 連続失敗のちょうどその回で一度だけ報告する
                if failures == hc.retries.max(1) {
                    self.controller.report_unhealthy().await;
                }
            }
        }
    }

    /// 1回分のチェック。タイムアウト超過は失敗として数える
    async fn run_check(&self, hc: &HealthCheckSpec) -> bool {
        let container = &self.controller.spec().container_name;
        let cmd = hc.command();

        match timeout(hc.timeout, self.controller.runtime().exec(container, &cmd, None)).await {
            Ok(Ok(output)) => output.success(),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "ヘルスチェックの実行に失敗");
                false
            }
            Err(_) => {
                tracing::debug!(timeout = ?hc.timeout, "ヘルスチェックがタイムアウト");
                false
            }
        }
    }
}

/// サービスの準備完了を待機（Exponential Backoff）
///
/// CLIのようにデーモンとして常駐しない呼び出し側のための、
/// 上限付きのワンショット版。成功したらコントローラへ Healthy を
/// 報告して戻ります。
pub async fn wait_for_healthy<R: ContainerRuntime>(
    controller: &LifecycleController<R>,
    policy: &RetryPolicy,
) -> Result<()> {
    let Some(hc) = controller.spec().healthcheck.clone() else {
        // ヘルスチェック未設定なら稼働していれば準備完了とみなす
        return Ok(());
    };
    let container = controller.spec().container_name.clone();
    let cmd = hc.command();

    for attempt in 0..policy.max_retries {
        let passed = match timeout(hc.timeout, controller.runtime().exec(&container, &cmd, None))
            .await
        {
            Ok(Ok(output)) => output.success(),
            Ok(Err(_)) | Err(_) => false,
        };

        if passed {
            controller.report_healthy().await;
            return Ok(());
        }

        // 最後の試行でなければ待機
        if attempt + 1 < policy.max_retries {
            let delay_ms = policy.delay_for_attempt(attempt);
            sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    Err(ContainerError::Timeout {
        operation: format!("サービス '{}' の準備完了待機", controller.spec().name),
        timeout: Duration::from_millis(
            (0..policy.max_retries)
                .map(|a| policy.delay_for_attempt(a))
                .sum(),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spec_with_healthcheck_timing, FakeRuntime};
    use moorage_core::ServiceState;

    fn monitored_controller(
        runtime: FakeRuntime,
        interval: Duration,
        check_timeout: Duration,
        retries: u32,
        start_period: Duration,
    ) -> Arc<LifecycleController<FakeRuntime>> {
        let spec = spec_with_healthcheck_timing(interval, check_timeout, retries, start_period);
        Arc::new(LifecycleController::new(spec, runtime))
    }

    #[tokio::test(start_paused = true)]
    async fn test_checks_never_overlap() {
        let runtime = FakeRuntime::new();
        // チェック1回に5秒かかる一方で tick は1秒ごとに発火する
        runtime.set_exec_delay(Duration::from_secs(5));
        runtime.set_exec_exit_codes(vec![0; 100]);

        let controller = monitored_controller(
            runtime.clone(),
            Duration::from_secs(1),
            Duration::from_secs(10),
            3,
            Duration::ZERO,
        );
        controller.start().await.unwrap();

        let monitor = HealthMonitor::new(Arc::clone(&controller));
        let handle = tokio::spawn(monitor.run());

        tokio::time::sleep(Duration::from_secs(30)).await;

        controller.stop(Duration::from_secs(1)).await.unwrap();
        handle.await.unwrap();

        // 同時実行は常に高々1
        assert_eq!(runtime.max_in_flight_execs(), 1);
        // スローチェック中の tick はスキップされる（毎秒実行なら30回になる）
        assert!(runtime.exec_calls() <= 8);
        assert!(runtime.exec_calls() >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unhealthy_after_consecutive_failures() {
        let runtime = FakeRuntime::new();
        runtime.set_exec_exit_codes(vec![1; 100]);

        // interval=30s, timeout=10s, retries=3 の典型的なpostgres設定
        let controller = monitored_controller(
            runtime.clone(),
            Duration::from_secs(30),
            Duration::from_secs(10),
            3,
            Duration::ZERO,
        );
        controller.start().await.unwrap();
        assert_eq!(controller.current_state().await, ServiceState::Running);

        let monitor = HealthMonitor::new(Arc::clone(&controller));
        let handle = tokio::spawn(monitor.run());

        // 最初のtickは即時発火するため、失敗は t=0, 30, 60 で数えられる。
        // 2回目の失敗まではまだ Running
        tokio::time::sleep(Duration::from_secs(45)).await;
        assert_eq!(controller.current_state().await, ServiceState::Running);

        // 3回目の連続失敗で Unhealthy
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(controller.current_state().await, ServiceState::Unhealthy);

        controller.stop(Duration::from_secs(1)).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_success_resets_failures_and_reports_healthy() {
        let runtime = FakeRuntime::new();
        // 2回失敗 → 成功 → 以降失敗: retries=3 には届かない
        let mut codes = vec![1, 1, 0];
        codes.extend(vec![1, 1, 0].repeat(20));
        runtime.set_exec_exit_codes(codes);

        let controller = monitored_controller(
            runtime.clone(),
            Duration::from_secs(10),
            Duration::from_secs(2),
            3,
            Duration::ZERO,
        );
        controller.start().await.unwrap();

        let monitor = HealthMonitor::new(Arc::clone(&controller));
        let handle = tokio::spawn(monitor.run());

        tokio::time::sleep(Duration::from_secs(300)).await;

        // 成功のたびにリセットされるので Unhealthy には落ちない
        assert_eq!(controller.current_state().await, ServiceState::Healthy);

        controller.stop(Duration::from_secs(1)).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let runtime = FakeRuntime::new();
        runtime.set_exec_exit_codes(vec![0; 100]);
        // 成功を返すはずのチェックが timeout より遅い
        runtime.set_exec_delay(Duration::from_secs(20));

        let controller = monitored_controller(
            runtime.clone(),
            Duration::from_secs(30),
            Duration::from_secs(10),
            2,
            Duration::ZERO,
        );
        controller.start().await.unwrap();

        let monitor = HealthMonitor::new(Arc::clone(&controller));
        let handle = tokio::spawn(monitor.run());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(controller.current_state().await, ServiceState::Unhealthy);

        controller.stop(Duration::from_secs(1)).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_respects_start_period() {
        let runtime = FakeRuntime::new();
        runtime.set_exec_exit_codes(vec![1; 100]);

        let controller = monitored_controller(
            runtime.clone(),
            Duration::from_secs(5),
            Duration::from_secs(1),
            1,
            Duration::from_secs(60),
        );
        controller.start().await.unwrap();

        let monitor = HealthMonitor::new(Arc::clone(&controller));
        let handle = tokio::spawn(monitor.run());

        // start_period 中はチェック自体が走らない
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runtime.exec_calls(), 0);
        assert_eq!(controller.current_state().await, ServiceState::Running);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(controller.current_state().await, ServiceState::Unhealthy);

        controller.stop(Duration::from_secs(1)).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_stops_when_target_leaves_active_states() {
        let runtime = FakeRuntime::new();
        runtime.set_exec_exit_codes(vec![0; 100]);

        let controller = monitored_controller(
            runtime.clone(),
            Duration::from_secs(5),
            Duration::from_secs(1),
            3,
            Duration::ZERO,
        );
        controller.start().await.unwrap();

        let monitor = HealthMonitor::new(Arc::clone(&controller));
        let handle = tokio::spawn(monitor.run());

        tokio::time::sleep(Duration::from_secs(20)).await;
        controller.stop(Duration::from_secs(1)).await.unwrap();

        // 停止後、監視ループは次のtickで抜ける
        tokio::time::timeout(Duration::from_secs(30), handle)
            .await
            .expect("監視ループが終了しない")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_healthy_retries_until_success() {
        let runtime = FakeRuntime::new();
        runtime.set_exec_exit_codes(vec![1, 1, 0]);

        let spec = spec_with_healthcheck_timing(
            Duration::from_secs(30),
            Duration::from_secs(10),
            3,
            Duration::ZERO,
        );
        let controller = LifecycleController::new(spec, runtime);
        controller.start().await.unwrap();

        let policy = RetryPolicy {
            max_retries: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 5000,
            multiplier: 2.0,
        };
        wait_for_healthy(&controller, &policy).await.unwrap();

        assert_eq!(controller.current_state().await, ServiceState::Healthy);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_healthy_gives_up() {
        let runtime = FakeRuntime::new();
        runtime.set_exec_exit_codes(vec![1; 100]);

        let spec = spec_with_healthcheck_timing(
            Duration::from_secs(30),
            Duration::from_secs(10),
            3,
            Duration::ZERO,
        );
        let controller = LifecycleController::new(spec, runtime);
        controller.start().await.unwrap();

        let policy = RetryPolicy {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 1000,
            multiplier: 2.0,
        };
        let err = wait_for_healthy(&controller, &policy).await.unwrap_err();
        assert!(matches!(err, ContainerError::Timeout { .. }));
    }
}
