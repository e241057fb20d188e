// applyコマンドハンドラー
//
// 宣言されたマイグレーションへデータベースを調整します。
// - 適用状態の読み込み
// - 共通接頭辞より後ろを末尾から取り消し、残りを先頭から適用
// - 成功・失敗にかかわらず、実際に適用されている列を状態ファイルへ保存

use crate::adapters::executor::PoolExecutor;
use crate::cli::command_context::CommandContext;
use crate::cli::commands::{
    format_id_list, render_output, CommandOutput, InterruptGuard, MigrationInput,
};
use crate::cli::OutputFormat;
use crate::core::migration::MigrationSequence;
use crate::services::reconciler::{MigrationReconciler, ReconcileOutcome};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// apply / destroy コマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutput {
    /// 取り消したマイグレーションID（実行順）
    pub undone: Vec<String>,
    /// 適用したマイグレーションID（実行順）
    pub applied: Vec<String>,
    /// 調整後に適用済みのマイグレーション数
    pub total: usize,
    /// 状態ファイル
    pub state_file: PathBuf,
}

impl CommandOutput for ApplyOutput {
    fn to_text(&self) -> String {
        if self.undone.is_empty() && self.applied.is_empty() {
            return format!("{} {} migration(s) applied.", "Up to date.".green(), self.total);
        }

        let mut sections = Vec::new();
        if !self.undone.is_empty() {
            sections.push(format!(
                "{}\n{}",
                format!("Undone ({}):", self.undone.len()).yellow().bold(),
                format_id_list(&self.undone)
            ));
        }
        if !self.applied.is_empty() {
            sections.push(format!(
                "{}\n{}",
                format!("Applied ({}):", self.applied.len()).green().bold(),
                format_id_list(&self.applied)
            ));
        }
        sections.push(format!(
            "{} {} migration(s) now applied. State saved to {}",
            "✓".green(),
            self.total,
            self.state_file.display()
        ));
        sections.join("\n\n")
    }
}

/// applyコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ApplyCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// `--url` で指定された接続URL
    pub url: Option<String>,
    /// マイグレーションの供給元
    pub source: MigrationInput,
    /// 状態ファイル
    pub state: Option<PathBuf>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// applyコマンドハンドラー
#[derive(Debug, Default)]
pub struct ApplyCommandHandler {}

impl ApplyCommandHandler {
    /// 新しいApplyCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// applyコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - applyコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は取り消し・適用したマイグレーションの一覧、失敗時はエラー
    pub async fn execute(&self, command: &ApplyCommand) -> Result<String> {
        let context = CommandContext::load(
            command.project_path.clone(),
            command.config_path.clone(),
            command.url.clone(),
        )?;

        let planned = command.source.load(&context)?;
        let output = reconcile_and_save(&context, &planned, command.state.as_deref()).await?;
        render_output(&output, command.format)
    }
}

/// 調整を実行して状態ファイルを更新
///
/// 失敗・キャンセル時も、その時点で適用されている列を保存してからエラーを返します。
pub(crate) async fn reconcile_and_save(
    context: &CommandContext,
    planned: &MigrationSequence,
    state: Option<&Path>,
) -> Result<ApplyOutput> {
    let store = context.state_store(state);
    let prior = store
        .load()
        .with_context(|| "Failed to load migration state")?;
    debug!(
        prior = prior.len(),
        planned = planned.len(),
        state_file = %store.path().display(),
        "Loaded migration state"
    );

    let reconciler = MigrationReconciler::new();
    if reconciler.plan(planned, &prior).is_empty() {
        return Ok(ApplyOutput {
            undone: vec![],
            applied: vec![],
            total: prior.len(),
            state_file: store.path().to_path_buf(),
        });
    }

    let (_data_source, pool) = context.connect().await?;
    let executor = PoolExecutor::new(&pool);
    let interrupt = InterruptGuard::watch();

    let result = reconciler
        .reconcile(&executor, planned, &prior, &interrupt.token())
        .await;
    drop(interrupt);
    pool.close().await;

    match result {
        Ok(ReconcileOutcome { undone, applied }) => {
            store
                .save(planned)
                .with_context(|| "Failed to save migration state")?;
            Ok(ApplyOutput {
                undone,
                applied,
                total: planned.len(),
                state_file: store.path().to_path_buf(),
            })
        }
        Err(e) => {
            let applied = e.applied_state();
            warn!(
                migration_id = e.migration_id(),
                phase = %e.phase(),
                applied = applied.len(),
                "Reconciliation stopped, saving partial state"
            );
            store
                .save(applied)
                .with_context(|| "Failed to save partial migration state")?;
            let applied_count = applied.len();
            Err(e).with_context(|| {
                format!(
                    "Reconciliation stopped with {} migration(s) applied (state saved to {})",
                    applied_count,
                    store.path().display()
                )
            })
        }
    }
}
