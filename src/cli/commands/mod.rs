// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod apply;
pub mod destroy;
pub mod driver;
pub mod plan;
pub mod query;

use crate::cli::command_context::CommandContext;
use crate::cli::{OutputFormat, SourceArgs};
use crate::core::migration::MigrationSequence;
use crate::services::migration_loader::{LoadOptions, MigrationLoaderService, MigrationSource};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// コマンド出力
///
/// テキスト表現とJSON表現の両方を持ちます。
pub trait CommandOutput: Serialize {
    /// テキスト表現
    fn to_text(&self) -> String;
}

/// 出力フォーマットに従って出力を描画
pub fn render_output<T: CommandOutput>(output: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(output.to_text()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).with_context(|| "Failed to serialize output")
        }
    }
}

/// コマンドラインで指定されたマイグレーションの供給元
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationInput {
    /// `{id, up, down}` のリストを記述したYAML/JSONファイル
    Inline(PathBuf),
    /// マイグレーションディレクトリ
    Directory {
        path: PathBuf,
        single_file_split: Option<String>,
    },
}

impl MigrationInput {
    /// 引数から供給元を作成
    pub fn from_args(args: &SourceArgs) -> Result<Self> {
        match (&args.migrations, &args.path) {
            (Some(file), None) => Ok(MigrationInput::Inline(file.clone())),
            (None, Some(path)) => Ok(MigrationInput::Directory {
                path: path.clone(),
                single_file_split: args.single_file_split.clone(),
            }),
            (Some(_), Some(_)) => Err(anyhow!("--migrations and --path can't be used together")),
            (None, None) => Err(anyhow!("Either --migrations or --path is required")),
        }
    }

    /// マイグレーション列を読み込む
    pub fn load(&self, context: &CommandContext) -> Result<MigrationSequence> {
        let loader = MigrationLoaderService::new();

        let migrations = match self {
            MigrationInput::Inline(file) => {
                let file = context.resolve_path(file);
                loader
                    .load_inline_file(&file)
                    .with_context(|| format!("Failed to load migrations from {:?}", file))?
            }
            MigrationInput::Directory {
                path,
                single_file_split,
            } => {
                let path = context.resolve_path(path);
                loader
                    .load(MigrationSource::Directory {
                        path: path.clone(),
                        options: LoadOptions::directory(single_file_split.clone()),
                    })
                    .with_context(|| format!("Failed to load migrations from {:?}", path))?
            }
        };

        debug!(count = migrations.len(), "Loaded declared migrations");
        Ok(migrations)
    }
}

/// Ctrl-C の監視
///
/// 監視タスクはガードの破棄時に中断されます。
pub(crate) struct InterruptGuard {
    token: CancellationToken,
    watcher: JoinHandle<()>,
}

impl InterruptGuard {
    /// Ctrl-C でキャンセルされるトークンの監視を開始
    pub(crate) fn watch() -> Self {
        let token = CancellationToken::new();
        let child = token.clone();
        let watcher = tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {}
                signal = tokio::signal::ctrl_c() => {
                    if signal.is_ok() {
                        warn!("Interrupted, stopping after the current statement");
                        child.cancel();
                    }
                }
            }
        });
        Self { token, watcher }
    }

    /// 監視対象のトークン
    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

/// マイグレーションIDの一覧を箇条書きに
pub(crate) fn format_id_list(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("  - {}", id))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        value: u32,
    }

    impl CommandOutput for Sample {
        fn to_text(&self) -> String {
            format!("value = {}", self.value)
        }
    }

    #[test]
    fn test_render_output_formats() {
        let sample = Sample { value: 3 };
        assert_eq!(render_output(&sample, OutputFormat::Text).unwrap(), "value = 3");
        assert!(render_output(&sample, OutputFormat::Json)
            .unwrap()
            .contains("\"value\": 3"));
    }

    #[test]
    fn test_migration_input_from_args() {
        let args = SourceArgs {
            migrations: None,
            path: Some(PathBuf::from("migrations")),
            single_file_split: Some("--X".to_string()),
        };
        assert_eq!(
            MigrationInput::from_args(&args).unwrap(),
            MigrationInput::Directory {
                path: PathBuf::from("migrations"),
                single_file_split: Some("--X".to_string()),
            }
        );

        let args = SourceArgs {
            migrations: None,
            path: None,
            single_file_split: None,
        };
        assert!(MigrationInput::from_args(&args).is_err());
    }

    #[tokio::test]
    async fn test_interrupt_watcher_stops_with_its_guard() {
        let guard = InterruptGuard::watch();
        let token = guard.token();
        let watcher = guard.watcher.abort_handle();
        assert!(!watcher.is_finished());

        drop(guard);
        while !watcher.is_finished() {
            tokio::task::yield_now().await;
        }
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_interrupt_token_is_shared() {
        let guard = InterruptGuard::watch();
        guard.token().cancel();
        assert!(guard.token().is_cancelled());
    }

    #[test]
    fn test_format_id_list() {
        assert_eq!(
            format_id_list(&["001_init".to_string(), "002_add_col".to_string()]),
            "  - 001_init\n  - 002_add_col"
        );
    }
}
