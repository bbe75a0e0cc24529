use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません")]
    ConfigDirNotFound,

    #[error(
        "設定ファイルが見つかりません\nヒント:\n  • moorage.yaml を含むディレクトリで実行してください\n  • MOORAGE_CONFIG_PATH 環境変数で直接指定することもできます"
    )]
    ConfigFileNotFound,

    #[error("ファイル操作エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
