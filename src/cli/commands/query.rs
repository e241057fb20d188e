// queryコマンドハンドラー
//
// クエリを実行し、結果をドライバーに依存しない統一値の行としてJSONで出力します。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::InterruptGuard;
use crate::core::uniform::QueryResult;
use crate::services::row_projector::RowProjector;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

/// queryコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct QueryCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// `--url` で指定された接続URL
    pub url: Option<String>,
    /// 実行するクエリ
    pub sql: String,
}

/// queryコマンドハンドラー
#[derive(Debug, Default)]
pub struct QueryCommandHandler {}

impl QueryCommandHandler {
    /// 新しいQueryCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// queryコマンドを実行
    ///
    /// # Returns
    ///
    /// `{"rows": [...], "row_type": {...}}` 形式のJSON
    pub async fn execute(&self, command: &QueryCommand) -> Result<String> {
        let context = CommandContext::load(
            command.project_path.clone(),
            command.config_path.clone(),
            command.url.clone(),
        )?;

        let (data_source, pool) = context.connect().await?;
        debug!(driver = %data_source.driver, sql = %command.sql, "Running query");

        let result = {
            let interrupt = InterruptGuard::watch();
            let mut cursor = pool.query(&command.sql);
            RowProjector::new(data_source.driver, cursor.as_mut())
                .with_cancellation(interrupt.token())
                .collect()
                .await
        };
        pool.close().await;

        let result: QueryResult = result.with_context(|| "Failed to read query result")?;
        serde_json::to_string_pretty(&result).with_context(|| "Failed to serialize query result")
    }
}
