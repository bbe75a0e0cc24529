//! bollardによるコンテナランタイム実装

// Bollard 0.19系の非推奨APIを一時的に使用
#![allow(deprecated)]

use crate::converter::spec_to_container_config;
use crate::error::{ContainerError, Result};
use crate::runtime::{ContainerRuntime, ContainerStatus, ExecOutput, LogChunk};
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use futures_util::stream::{BoxStream, StreamExt};
use moorage_core::ServiceSpec;
use std::time::Duration;

/// Docker Engine APIを叩くランタイム
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
    project: String,
}

impl DockerRuntime {
    /// Docker接続を初期化
    pub async fn connect(project: impl Into<String>) -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| ContainerError::ConnectionFailed(e.to_string()))?;

        // 接続テスト
        docker
            .ping()
            .await
            .map_err(|e| ContainerError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            docker,
            project: project.into(),
        })
    }

    /// 生のDocker接続（ネットワーク・ボリューム操作などCLI側で使用）
    pub fn docker(&self) -> &Docker {
        &self.docker
    }

    /// イメージをpull
    pub async fn pull_image(&self, image: &str) -> Result<()> {
        let (image_name, tag) = match image.split_once(':') {
            Some((name, tag)) => (name, tag),
            None => (image, "latest"),
        };

        tracing::info!(image, "イメージをpull中");

        let options = bollard::image::CreateImageOptions {
            from_image: image_name,
            tag,
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(info) = stream.next().await {
            if let Err(e) = info {
                return Err(ContainerError::Api(format!(
                    "イメージのpullに失敗しました: {}",
                    e
                )));
            }
        }

        Ok(())
    }
}

impl ContainerRuntime for DockerRuntime {
    async fn create(&self, spec: &ServiceSpec) -> Result<String> {
        let (config, options) = spec_to_container_config(&self.project, spec);

        match self
            .docker
            .create_container(Some(options.clone()), config.clone())
            .await
        {
            Ok(response) => Ok(response.id),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 409, ..
            }) => {
                // 同名コンテナが既に存在する場合は再利用
                tracing::debug!(container = %spec.container_name, "既存コンテナを再利用");
                Ok(spec.container_name.clone())
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                // イメージが見つからない場合はpullして再試行
                self.pull_image(&spec.image).await?;
                let response = self
                    .docker
                    .create_container(Some(options), config)
                    .await
                    .map_err(ContainerError::from)?;
                Ok(response.id)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn start(&self, container: &str) -> Result<()> {
        match self
            .docker
            .start_container(
                container,
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => {
                // 既に起動中
                Ok(())
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Err(ContainerError::ContainerNotFound {
                container: container.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn stop(&self, container: &str, grace: Duration) -> Result<()> {
        let options = bollard::container::StopContainerOptions {
            t: grace.as_secs() as i64,
        };

        match self.docker.stop_container(container, Some(options)).await {
            Ok(_) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => {
                // 既に停止済み
                Ok(())
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                // 存在しないコンテナの停止は成功扱い（冪等）
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, container: &str) -> Result<()> {
        match self
            .docker
            .remove_container(
                container,
                None::<bollard::query_parameters::RemoveContainerOptions>,
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn inspect(&self, container: &str) -> Result<ContainerStatus> {
        let response = match self
            .docker
            .inspect_container(
                container,
                None::<bollard::query_parameters::InspectContainerOptions>,
            )
            .await
        {
            Ok(response) => response,
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                return Err(ContainerError::ContainerNotFound {
                    container: container.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let running = response
            .state
            .as_ref()
            .and_then(|s| s.running)
            .unwrap_or(false);

        Ok(ContainerStatus {
            name: container.to_string(),
            running,
            image: response.config.and_then(|c| c.image).unwrap_or_default(),
        })
    }

    async fn exec(
        &self,
        container: &str,
        cmd: &[String],
        stdin: Option<Vec<u8>>,
    ) -> Result<ExecOutput> {
        let exec_config = CreateExecOptions {
            cmd: Some(cmd.to_vec()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            attach_stdin: Some(stdin.is_some()),
            ..Default::default()
        };

        let message = self.docker.create_exec(container, exec_config).await?;

        let start_config = StartExecOptions {
            ..Default::default()
        };

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        match self.docker.start_exec(&message.id, Some(start_config)).await? {
            StartExecResults::Attached {
                mut output,
                mut input,
            } => {
                if let Some(data) = stdin {
                    use tokio::io::AsyncWriteExt;
                    input.write_all(&data).await?;
                    input.shutdown().await?;
                }

                while let Some(msg) = output.next().await {
                    match msg? {
                        LogOutput::StdOut { message } | LogOutput::Console { message } => {
                            stdout.extend_from_slice(&message);
                        }
                        LogOutput::StdErr { message } => {
                            stderr.extend_from_slice(&message);
                        }
                        LogOutput::StdIn { .. } => {}
                    }
                }
            }
            StartExecResults::Detached => {}
        }

        // 終了コードの取得
        let inspect = self.docker.inspect_exec(&message.id).await?;
        let exit_code = inspect.exit_code.unwrap_or(-1);

        Ok(ExecOutput {
            stdout,
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code,
        })
    }

    async fn logs(
        &self,
        container: &str,
        follow: bool,
        tail: usize,
    ) -> Result<BoxStream<'static, Result<LogChunk>>> {
        let options = bollard::container::LogsOptions::<String> {
            follow,
            stdout: true,
            stderr: true,
            tail: tail.to_string(),
            timestamps: false,
            ..Default::default()
        };

        let stream = self
            .docker
            .logs(container, Some(options))
            .map(|item| match item {
                Ok(LogOutput::StdErr { message }) => Ok(LogChunk::Stderr(message.to_vec())),
                Ok(LogOutput::StdOut { message }) | Ok(LogOutput::Console { message }) => {
                    Ok(LogChunk::Stdout(message.to_vec()))
                }
                Ok(LogOutput::StdIn { .. }) => Ok(LogChunk::Stdout(Vec::new())),
                Err(e) => Err(ContainerError::from(e)),
            })
            .boxed();

        Ok(stream)
    }
}
