//! テスト用のフェイクランタイム
//!
//! 実Dockerの代わりに、呼び出し記録と振る舞いの注入ができる実装。
//! exec の同時実行数を追跡するため、途中で drop された exec も
//! ガードの Drop で正しく減算される。

use crate::error::{ContainerError, Result};
use crate::runtime::{ContainerRuntime, ContainerStatus, ExecOutput, LogChunk};
use futures_util::stream::{self, BoxStream, StreamExt};
use moorage_core::{HealthCheckSpec, ServiceSpec};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub struct FakeRuntime {
    inner: Arc<Inner>,
}

struct Inner {
    running: AtomicBool,
    create_calls: AtomicUsize,
    fail_create: AtomicUsize,
    exec_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    exec_delay: Mutex<Duration>,
    exec_exit_codes: Mutex<VecDeque<i64>>,
    exec_stdout: Mutex<Vec<u8>>,
    exec_stderr: Mutex<String>,
    last_exec_cmd: Mutex<Vec<String>>,
    last_exec_stdin: Mutex<Option<Vec<u8>>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                running: AtomicBool::new(false),
                create_calls: AtomicUsize::new(0),
                fail_create: AtomicUsize::new(0),
                exec_calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                exec_delay: Mutex::new(Duration::ZERO),
                exec_exit_codes: Mutex::new(VecDeque::new()),
                exec_stdout: Mutex::new(Vec::new()),
                exec_stderr: Mutex::new(String::new()),
                last_exec_cmd: Mutex::new(Vec::new()),
                last_exec_stdin: Mutex::new(None),
            }),
        }
    }

    /// 次の n 回の create を一時的エラーで失敗させる
    pub fn fail_create_times(&self, n: usize) {
        self.inner.fail_create.store(n, Ordering::SeqCst);
    }

    pub fn set_exec_delay(&self, delay: Duration) {
        *self.inner.exec_delay.lock().unwrap() = delay;
    }

    /// exec が順に返す終了コード（使い切ったら 0）
    pub fn set_exec_exit_codes(&self, codes: Vec<i64>) {
        *self.inner.exec_exit_codes.lock().unwrap() = codes.into();
    }

    pub fn set_exec_stdout(&self, stdout: Vec<u8>) {
        *self.inner.exec_stdout.lock().unwrap() = stdout;
    }

    pub fn set_exec_stderr(&self, stderr: String) {
        *self.inner.exec_stderr.lock().unwrap() = stderr;
    }

    pub fn set_container_running(&self, running: bool) {
        self.inner.running.store(running, Ordering::SeqCst);
    }

    pub fn container_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.inner.create_calls.load(Ordering::SeqCst)
    }

    pub fn exec_calls(&self) -> usize {
        self.inner.exec_calls.load(Ordering::SeqCst)
    }

    pub fn in_flight_execs(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight_execs(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_exec_cmd(&self) -> Vec<String> {
        self.inner.last_exec_cmd.lock().unwrap().clone()
    }

    pub fn last_exec_stdin(&self) -> Option<Vec<u8>> {
        self.inner.last_exec_stdin.lock().unwrap().clone()
    }
}

/// exec 同時実行数のガード。drop（キャンセル含む）で必ず減算される
struct InFlightGuard {
    inner: Arc<Inner>,
}

impl InFlightGuard {
    fn enter(inner: Arc<Inner>) -> Self {
        let current = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_in_flight.fetch_max(current, Ordering::SeqCst);
        Self { inner }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ContainerRuntime for FakeRuntime {
    async fn create(&self, _spec: &ServiceSpec) -> Result<String> {
        self.inner.create_calls.fetch_add(1, Ordering::SeqCst);

        if self.inner.fail_create.load(Ordering::SeqCst) > 0 {
            self.inner.fail_create.fetch_sub(1, Ordering::SeqCst);
            return Err(ContainerError::ConnectionFailed(
                "fake daemon unavailable".to_string(),
            ));
        }

        Ok("fake-container-id".to_string())
    }

    async fn start(&self, _container: &str) -> Result<()> {
        self.inner.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self, _container: &str, _grace: Duration) -> Result<()> {
        self.inner.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, _container: &str) -> Result<()> {
        Ok(())
    }

    async fn inspect(&self, container: &str) -> Result<ContainerStatus> {
        Ok(ContainerStatus {
            name: container.to_string(),
            running: self.container_running(),
            image: "postgres:16-alpine".to_string(),
        })
    }

    async fn exec(
        &self,
        _container: &str,
        cmd: &[String],
        stdin: Option<Vec<u8>>,
    ) -> Result<ExecOutput> {
        self.inner.exec_calls.fetch_add(1, Ordering::SeqCst);
        *self.inner.last_exec_cmd.lock().unwrap() = cmd.to_vec();
        *self.inner.last_exec_stdin.lock().unwrap() = stdin;

        let _guard = InFlightGuard::enter(Arc::clone(&self.inner));

        let delay = *self.inner.exec_delay.lock().unwrap();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        let exit_code = self
            .inner
            .exec_exit_codes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(0);

        Ok(ExecOutput {
            stdout: self.inner.exec_stdout.lock().unwrap().clone(),
            stderr: self.inner.exec_stderr.lock().unwrap().clone(),
            exit_code,
        })
    }

    async fn logs(
        &self,
        _container: &str,
        _follow: bool,
        _tail: usize,
    ) -> Result<BoxStream<'static, Result<LogChunk>>> {
        Ok(stream::iter(vec![Ok(LogChunk::Stdout(b"fake log\n".to_vec()))]).boxed())
    }
}

fn base_environment() -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert("POSTGRES_USER".to_string(), "app".to_string());
    env.insert("POSTGRES_DB".to_string(), "app".to_string());
    env.insert("POSTGRES_PASSWORD".to_string(), "secret".to_string());
    env
}

pub fn spec_without_healthcheck() -> ServiceSpec {
    ServiceSpec {
        name: "postgres".to_string(),
        image: "postgres:16-alpine".to_string(),
        container_name: "harbor-postgres".to_string(),
        environment: base_environment(),
        ports: vec![],
        volumes: vec![],
        networks: vec![],
        resources: None,
        healthcheck: None,
        restart: None,
        databases: vec![],
    }
}

pub fn spec_with_healthcheck() -> ServiceSpec {
    spec_with_healthcheck_timing(
        Duration::from_secs(30),
        Duration::from_secs(10),
        3,
        Duration::ZERO,
    )
}

pub fn spec_with_healthcheck_timing(
    interval: Duration,
    timeout: Duration,
    retries: u32,
    start_period: Duration,
) -> ServiceSpec {
    let mut spec = spec_without_healthcheck();
    spec.healthcheck = Some(HealthCheckSpec {
        test: vec![
            "CMD-SHELL".to_string(),
            "pg_isready -U app".to_string(),
        ],
        interval,
        timeout,
        retries,
        start_period,
    });
    spec
}
