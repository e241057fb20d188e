// destroyコマンドハンドラー
//
// 適用済みのマイグレーションをすべて末尾から取り消します。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::apply::reconcile_and_save;
use crate::cli::commands::render_output;
use crate::cli::OutputFormat;
use crate::core::migration::MigrationSequence;
use anyhow::Result;
use std::path::PathBuf;

/// destroyコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct DestroyCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// `--url` で指定された接続URL
    pub url: Option<String>,
    /// 状態ファイル
    pub state: Option<PathBuf>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// destroyコマンドハンドラー
#[derive(Debug, Default)]
pub struct DestroyCommandHandler {}

impl DestroyCommandHandler {
    /// 新しいDestroyCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// destroyコマンドを実行
    pub async fn execute(&self, command: &DestroyCommand) -> Result<String> {
        let context = CommandContext::load(
            command.project_path.clone(),
            command.config_path.clone(),
            command.url.clone(),
        )?;

        let output =
            reconcile_and_save(&context, &MigrationSequence::new(), command.state.as_deref())
                .await?;
        render_output(&output, command.format)
    }
}
