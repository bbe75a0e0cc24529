pub mod error;

pub use error::*;

use std::path::PathBuf;

/// Moorageの設定ディレクトリを取得
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("moorage");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// プロジェクトのmoorage.yamlファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 MOORAGE_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: moorage.local.yaml, .moorage.local.yaml, moorage.yaml, .moorage.yaml
/// 3. ./.moorage/ ディレクトリ内: 同様の順序
/// 4. ~/.config/moorage/moorage.yaml (グローバル設定)
pub fn find_config_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var("MOORAGE_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;
    let candidates = [
        "moorage.local.yaml",
        ".moorage.local.yaml",
        "moorage.yaml",
        ".moorage.yaml",
    ];

    // 2. カレントディレクトリで検索
    for filename in &candidates {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. ./.moorage/ ディレクトリで検索
    let moorage_dir = current_dir.join(".moorage");
    if moorage_dir.is_dir() {
        for filename in &candidates {
            let path = moorage_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    // 4. グローバル設定ファイル (~/.config/moorage/moorage.yaml)
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("moorage").join("moorage.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    // どの設定ファイルも見つからなかった
    Err(ConfigError::ConfigFileNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_get_config_dir() {
        let result = get_config_dir();
        assert!(result.is_ok());

        let config_dir = result.unwrap();
        assert!(config_dir.ends_with("moorage"));
        assert!(config_dir.exists());
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("moorage.yaml"), "# test").unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file();
        assert!(result.is_ok());

        let config_file = result.unwrap();
        assert!(config_file.ends_with("moorage.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        // moorage.yaml と moorage.local.yaml の両方を作成
        fs::write(temp_dir.path().join("moorage.yaml"), "# global").unwrap();
        fs::write(temp_dir.path().join("moorage.local.yaml"), "# local").unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file().unwrap();

        // moorage.local.yaml が優先される
        assert!(result.ends_with("moorage.local.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_moorage_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        let moorage_dir = temp_dir.path().join(".moorage");
        fs::create_dir(&moorage_dir).unwrap();
        fs::write(moorage_dir.join("moorage.yaml"), "# in moorage dir").unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file().unwrap();
        assert!(result.ends_with(".moorage/moorage.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "# custom").unwrap();

        unsafe {
            std::env::set_var("MOORAGE_CONFIG_PATH", config_path.to_str().unwrap());
        }

        let result = find_config_file().unwrap();
        assert_eq!(result, config_path);

        unsafe {
            std::env::remove_var("MOORAGE_CONFIG_PATH");
        }
    }

    #[test]
    #[serial]
    fn test_find_config_file_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file();
        assert!(matches!(result, Err(ConfigError::ConfigFileNotFound)));

        std::env::set_current_dir(original_dir).unwrap();
    }
}
