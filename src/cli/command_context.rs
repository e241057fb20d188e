// コマンド共通コンテキスト
//
// 設定ファイル読み込み・接続URL解決・状態ファイル解決の重複をCLI層で集約する。

use crate::adapters::connection_string::{parse_url, DataSource};
use crate::adapters::database::{DatabaseConnectionService, DatabasePool};
use crate::core::config::Config;
use crate::services::state_store::StateStore;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
    /// `--url` で指定された接続URL
    pub url: Option<String>,
}

impl CommandContext {
    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    ///
    /// 既定の設定ファイルは省略可能ですが、明示指定した設定ファイルは必須です。
    pub fn load(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
        url: Option<String>,
    ) -> Result<Self> {
        let config_path = match custom_config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(anyhow!("Config file not found: {:?}", path));
                }
                path
            }
            None => project_path.join(Config::DEFAULT_CONFIG_PATH),
        };

        let config = Config::load(&config_path).with_context(|| "Failed to read config file")?;
        debug!(config_path = %config_path.display(), "Loaded configuration");

        Ok(Self {
            project_path,
            config_path,
            config,
            url,
        })
    }

    /// 接続URLを解決してデータソースを作成
    pub fn data_source(&self) -> Result<DataSource> {
        let url = self.config.resolve_url(self.url.as_deref())?;
        parse_url(&url).with_context(|| "Failed to resolve database driver")
    }

    /// 接続プールを作成
    pub async fn connect(&self) -> Result<(DataSource, DatabasePool)> {
        let data_source = self.data_source()?;
        let service = DatabaseConnectionService::new();
        let pool = service
            .create_pool(&data_source, &self.config)
            .await
            .with_context(|| "Failed to connect to database")?;
        debug!(driver = %data_source.driver, "Connected to database");
        Ok((data_source, pool))
    }

    /// 状態ファイルのストア
    pub fn state_store(&self, explicit: Option<&Path>) -> StateStore {
        StateStore::new(self.config.resolve_state_file(&self.project_path, explicit))
    }

    /// プロジェクトルートからの相対パスを絶対パスへ
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_path.join(path)
        }
    }
}
