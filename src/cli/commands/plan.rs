// planコマンドハンドラー
//
// 宣言されたマイグレーションと適用状態を比較し、
// apply が実行する取り消し・適用の一覧を表示します（データベースには接続しません）。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{format_id_list, render_output, CommandOutput, MigrationInput};
use crate::cli::OutputFormat;
use crate::core::migration::ReconciliationPlan;
use crate::services::reconciler::MigrationReconciler;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// planコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutput {
    /// 維持される共通接頭辞の長さ
    pub unchanged: usize,
    /// 取り消すマイグレーションID（実行順）
    pub down: Vec<String>,
    /// 適用するマイグレーションID（実行順）
    pub up: Vec<String>,
}

impl PlanOutput {
    fn from_plan(plan: &ReconciliationPlan) -> Self {
        Self {
            unchanged: plan.common_prefix,
            down: plan.down.iter().map(|m| m.id().to_string()).collect(),
            up: plan.up.iter().map(|m| m.id().to_string()).collect(),
        }
    }
}

impl CommandOutput for PlanOutput {
    fn to_text(&self) -> String {
        if self.down.is_empty() && self.up.is_empty() {
            return format!(
                "{} ({} migration(s) applied)",
                "No changes.".green(),
                self.unchanged
            );
        }

        let mut sections = Vec::new();
        if !self.down.is_empty() {
            sections.push(format!(
                "{}\n{}",
                format!("Undo ({}):", self.down.len()).yellow().bold(),
                format_id_list(&self.down)
            ));
        }
        if !self.up.is_empty() {
            sections.push(format!(
                "{}\n{}",
                format!("Apply ({}):", self.up.len()).green().bold(),
                format_id_list(&self.up)
            ));
        }
        sections.push(format!("{} migration(s) unchanged", self.unchanged));
        sections.join("\n\n")
    }
}

/// planコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct PlanCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// マイグレーションの供給元
    pub source: MigrationInput,
    /// 状態ファイル
    pub state: Option<PathBuf>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// planコマンドハンドラー
#[derive(Debug, Default)]
pub struct PlanCommandHandler {}

impl PlanCommandHandler {
    /// 新しいPlanCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// planコマンドを実行
    pub fn execute(&self, command: &PlanCommand) -> Result<String> {
        let context =
            CommandContext::load(command.project_path.clone(), command.config_path.clone(), None)?;

        let planned = command.source.load(&context)?;
        let store = context.state_store(command.state.as_deref());
        let prior = store
            .load()
            .with_context(|| "Failed to load migration state")?;

        let plan = MigrationReconciler::new().plan(&planned, &prior);
        render_output(&PlanOutput::from_plan(&plan), command.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::migration::{Migration, MigrationSequence};

    #[test]
    fn test_plan_output_lists_down_before_up() {
        colored::control::set_override(false);
        let prior = MigrationSequence::from(vec![
            Migration::new("a", "UP a", "DOWN a"),
            Migration::new("b", "UP b", "DOWN b"),
        ]);
        let planned = MigrationSequence::from(vec![
            Migration::new("a", "UP a", "DOWN a"),
            Migration::new("c", "UP c", "DOWN c"),
        ]);

        let output = PlanOutput::from_plan(&ReconciliationPlan::between(&planned, &prior));
        assert_eq!(output.unchanged, 1);
        assert_eq!(output.down, vec!["b"]);
        assert_eq!(output.up, vec!["c"]);

        let text = output.to_text();
        assert!(text.find("Undo").unwrap() < text.find("Apply").unwrap());
    }
}
