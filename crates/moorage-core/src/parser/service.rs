//! サービス定義の検証

use super::timing::{format_duration, parse_duration, parse_memory};
use super::{RawDeploy, RawHealthCheck, RawHealthTest, RawLimits, RawResources, RawScalar, RawService};
use crate::error::{Result, ValidationError};
use crate::model::{HealthCheckSpec, ResourceLimits, RestartPolicy, ServiceSpec};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

fn default_interval() -> Duration {
    Duration::from_secs(30)
}
fn default_timeout() -> Duration {
    Duration::from_secs(3)
}
fn default_retries() -> u32 {
    3
}
fn default_start_period() -> Duration {
    Duration::from_secs(10)
}

/// 生のサービス定義を検証して ServiceSpec を生成
///
/// 純粋関数。副作用はありません。
pub fn validate_service(project: &str, name: &str, raw: RawService) -> Result<ServiceSpec> {
    let image = raw
        .image
        .filter(|i| !i.trim().is_empty())
        .ok_or_else(|| ValidationError::MissingImage(name.to_string()))?;

    let container_name = raw
        .container_name
        .unwrap_or_else(|| format!("{}-{}", project, name));

    let mut environment: BTreeMap<String, String> = raw
        .environment
        .into_iter()
        .map(|(k, v)| (k, v.into_string()))
        .collect();

    // ポート: サービス内での重複もここで拒否
    let mut ports = Vec::new();
    let mut seen_hosts = HashSet::new();
    for value in &raw.ports {
        let mapping = super::parse_port(value)?;
        if !seen_hosts.insert(mapping.host) {
            return Err(ValidationError::DuplicateHostPort {
                port: mapping.host,
                service: name.to_string(),
            });
        }
        ports.push(mapping);
    }

    let volumes = raw
        .volumes
        .iter()
        .map(|v| super::parse_volume(v))
        .collect::<Result<Vec<_>>>()?;

    let resources = raw
        .deploy
        .and_then(|d| d.resources)
        .and_then(|r| r.limits)
        .map(|l| validate_limits(l))
        .transpose()?
        .flatten();

    let healthcheck = raw
        .healthcheck
        .map(|h| validate_healthcheck(name, h))
        .transpose()?;

    let restart = raw
        .restart
        .map(|s| {
            RestartPolicy::parse(&s).ok_or(ValidationError::InvalidRestartPolicy(s))
        })
        .transpose()?;

    // 複数データベース指定は環境変数への透過のみ。解釈はしない
    if !raw.databases.is_empty() && !environment.contains_key("POSTGRES_MULTIPLE_DATABASES") {
        environment.insert(
            "POSTGRES_MULTIPLE_DATABASES".to_string(),
            raw.databases.join(","),
        );
    }

    if image_is_postgres(&image) {
        apply_postgres_defaults(name, &mut environment)?;
    }

    Ok(ServiceSpec {
        name: name.to_string(),
        image,
        container_name,
        environment,
        ports,
        volumes,
        networks: raw.networks,
        resources,
        healthcheck,
        restart,
        databases: raw.databases,
    })
}

/// postgresイメージ向けのデフォルト適用とパスワード必須チェック
///
/// POSTGRES_DB / POSTGRES_USER はデフォルト "postgres"。
/// POSTGRES_PASSWORD にデフォルトは無い。POSTGRES_HOST_AUTH_METHOD=trust が
/// 明示されている場合のみ省略を許可します。
fn apply_postgres_defaults(name: &str, environment: &mut BTreeMap<String, String>) -> Result<()> {
    if !environment.contains_key("POSTGRES_USER") {
        environment.insert("POSTGRES_USER".to_string(), "postgres".to_string());
    }
    if !environment.contains_key("POSTGRES_DB") {
        let user = environment
            .get("POSTGRES_USER")
            .cloned()
            .unwrap_or_else(|| "postgres".to_string());
        environment.insert("POSTGRES_DB".to_string(), user);
    }

    let trust = environment
        .get("POSTGRES_HOST_AUTH_METHOD")
        .is_some_and(|v| v == "trust");
    if !trust && !environment.contains_key("POSTGRES_PASSWORD") {
        return Err(ValidationError::MissingPassword(name.to_string()));
    }

    Ok(())
}

fn image_is_postgres(image: &str) -> bool {
    image.contains("postgres")
}

fn validate_limits(raw: RawLimits) -> Result<Option<ResourceLimits>> {
    let memory_bytes = match raw.memory {
        None => None,
        Some(RawScalar::Int(n)) if n >= 0 => Some(n as u64),
        Some(RawScalar::Int(n)) => {
            return Err(ValidationError::InvalidMemory(n.to_string()));
        }
        Some(RawScalar::Text(s)) => Some(parse_memory(&s)?),
        Some(other) => {
            return Err(ValidationError::InvalidMemory(format!("{:?}", other)));
        }
    };

    let cpus = match raw.cpus {
        None => None,
        Some(RawScalar::Float(f)) => Some(f),
        Some(RawScalar::Int(n)) => Some(n as f64),
        Some(RawScalar::Text(s)) => Some(
            s.parse::<f64>()
                .map_err(|_| ValidationError::InvalidCpus(f64::NAN))?,
        ),
        Some(RawScalar::Bool(_)) => return Err(ValidationError::InvalidCpus(f64::NAN)),
    };

    if let Some(c) = cpus
        && c <= 0.0
    {
        return Err(ValidationError::InvalidCpus(c));
    }

    if memory_bytes.is_none() && cpus.is_none() {
        return Ok(None);
    }

    Ok(Some(ResourceLimits { memory_bytes, cpus }))
}

fn validate_healthcheck(name: &str, raw: RawHealthCheck) -> Result<HealthCheckSpec> {
    let test = match raw.test {
        RawHealthTest::Command(cmd) => cmd,
        RawHealthTest::Shell(s) => vec!["CMD-SHELL".to_string(), s],
    };

    if test.is_empty() || test.iter().all(|t| t.trim().is_empty()) {
        return Err(ValidationError::EmptyHealthCommand(name.to_string()));
    }

    let interval = scalar_to_duration(raw.interval)?.unwrap_or_else(default_interval);
    let timeout = scalar_to_duration(raw.timeout)?.unwrap_or_else(default_timeout);
    let retries = raw.retries.unwrap_or_else(default_retries);
    let start_period = scalar_to_duration(raw.start_period)?.unwrap_or_else(default_start_period);

    // 不変条件: timeout < interval
    if timeout >= interval {
        return Err(ValidationError::HealthCheckTiming {
            service: name.to_string(),
            interval,
            timeout,
        });
    }

    Ok(HealthCheckSpec {
        test,
        interval,
        timeout,
        retries,
        start_period,
    })
}

fn scalar_to_duration(scalar: Option<RawScalar>) -> Result<Option<Duration>> {
    match scalar {
        None => Ok(None),
        Some(RawScalar::Int(n)) if n >= 0 => Ok(Some(Duration::from_secs(n as u64))),
        Some(RawScalar::Int(n)) => Err(ValidationError::InvalidDuration(n.to_string())),
        Some(RawScalar::Text(s)) => parse_duration(&s).map(Some),
        Some(other) => Err(ValidationError::InvalidDuration(format!("{:?}", other))),
    }
}

/// 検証済みスペックを正規形の生表現へ戻す
///
/// validate_service(canonical_raw(spec)) == spec が成り立つ（冪等性）。
pub fn canonical_raw(spec: &ServiceSpec) -> RawService {
    RawService {
        image: Some(spec.image.clone()),
        container_name: Some(spec.container_name.clone()),
        environment: spec
            .environment
            .iter()
            .map(|(k, v)| (k.clone(), RawScalar::Text(v.clone())))
            .collect(),
        ports: spec.ports.iter().map(|p| p.to_compose_string()).collect(),
        volumes: spec.volumes.iter().map(|v| v.to_compose_string()).collect(),
        networks: spec.networks.clone(),
        deploy: spec.resources.map(|limits| RawDeploy {
            resources: Some(RawResources {
                limits: Some(RawLimits {
                    memory: limits.memory_bytes.map(|b| RawScalar::Int(b as i64)),
                    cpus: limits.cpus.map(RawScalar::Float),
                }),
            }),
        }),
        healthcheck: spec.healthcheck.as_ref().map(|hc| RawHealthCheck {
            test: RawHealthTest::Command(hc.test.clone()),
            interval: Some(RawScalar::Text(format_duration(hc.interval))),
            timeout: Some(RawScalar::Text(format_duration(hc.timeout))),
            retries: Some(hc.retries),
            start_period: Some(RawScalar::Text(format_duration(hc.start_period))),
        }),
        restart: spec.restart.map(|r| r.as_docker_str().to_string()),
        databases: spec.databases.clone(),
    }
}
