// driverコマンドハンドラー
//
// 接続URLから解決したドライバー名とドライバーへ渡すURLを表示します。

use crate::adapters::connection_string::DataSource;
use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

impl CommandOutput for DataSource {
    fn to_text(&self) -> String {
        format!("{} {}\n{} {}", "Driver:".bold(), self.driver, "URL:".bold(), self.url)
    }
}

/// driverコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct DriverCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// `--url` で指定された接続URL
    pub url: Option<String>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// driverコマンドハンドラー
#[derive(Debug, Default)]
pub struct DriverCommandHandler {}

impl DriverCommandHandler {
    /// 新しいDriverCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// driverコマンドを実行
    pub fn execute(&self, command: &DriverCommand) -> Result<String> {
        let context = CommandContext::load(
            command.project_path.clone(),
            command.config_path.clone(),
            command.url.clone(),
        )?;

        render_output(&context.data_source()?, command.format)
    }
}
