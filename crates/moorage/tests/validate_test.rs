mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

const VALID_CONFIG: &str = r#"
name: harbor
services:
  postgres:
    image: postgres:16-alpine
    environment:
      POSTGRES_DB: app
      POSTGRES_USER: app
      POSTGRES_PASSWORD: secret
    ports:
      - "5432:5432"
    volumes:
      - "pgdata:/var/lib/postgresql/data"
    healthcheck:
      test: ["CMD-SHELL", "pg_isready -U app"]
      interval: 30s
      timeout: 10s
      retries: 3
      start_period: 40s
volumes:
  - pgdata
"#;

/// 有効な設定の validate が成功することを確認
#[test]
fn test_validate_valid_config() {
    let project = TestProject::new();
    project.write_moorage_yaml(VALID_CONFIG);

    let mut cmd = Command::cargo_bin("moor").unwrap();
    cmd.current_dir(project.path())
        .env_remove("MOORAGE_CONFIG_PATH")
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("設定は有効です"))
        .stdout(predicate::str::contains("postgres:16-alpine"))
        .stdout(predicate::str::contains("harbor"));
}

/// POSTGRES_PASSWORD 未設定の設定は終了コード2で拒否されることを確認
/// （コンテナは作成されない）
#[test]
fn test_validate_missing_password_exits_with_2() {
    let project = TestProject::new();
    project.write_moorage_yaml(
        r#"
services:
  postgres:
    image: postgres:16
"#,
    );

    let mut cmd = Command::cargo_bin("moor").unwrap();
    cmd.current_dir(project.path())
        .env_remove("MOORAGE_CONFIG_PATH")
        .arg("validate")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("POSTGRES_PASSWORD"));
}

/// timeout >= interval のヘルスチェックは拒否されることを確認
#[test]
fn test_validate_bad_healthcheck_timing() {
    let project = TestProject::new();
    project.write_moorage_yaml(
        r#"
services:
  postgres:
    image: postgres:16
    environment:
      POSTGRES_PASSWORD: secret
    healthcheck:
      test: ["CMD", "pg_isready"]
      interval: 5s
      timeout: 5s
"#,
    );

    let mut cmd = Command::cargo_bin("moor").unwrap();
    cmd.current_dir(project.path())
        .env_remove("MOORAGE_CONFIG_PATH")
        .arg("validate")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("ヘルスチェック設定が不正です"));
}

/// ホストポートが重複した設定は拒否されることを確認
#[test]
fn test_validate_duplicate_ports() {
    let project = TestProject::new();
    project.write_moorage_yaml(
        r#"
services:
  postgres:
    image: postgres:16
    environment:
      POSTGRES_PASSWORD: secret
    ports:
      - "5432:5432"
  replica:
    image: postgres:16
    environment:
      POSTGRES_PASSWORD: secret
    ports:
      - "5432:5432"
"#,
    );

    let mut cmd = Command::cargo_bin("moor").unwrap();
    cmd.current_dir(project.path())
        .env_remove("MOORAGE_CONFIG_PATH")
        .arg("validate")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("5432"));
}
