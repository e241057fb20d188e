use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
use sqlreconcile::cli::commands::apply::{ApplyCommand, ApplyCommandHandler};
use sqlreconcile::cli::commands::destroy::{DestroyCommand, DestroyCommandHandler};
use sqlreconcile::cli::commands::driver::{DriverCommand, DriverCommandHandler};
use sqlreconcile::cli::commands::plan::{PlanCommand, PlanCommandHandler};
use sqlreconcile::cli::commands::query::{QueryCommand, QueryCommandHandler};
use sqlreconcile::cli::commands::MigrationInput;
use sqlreconcile::cli::{Cli, Commands};
use sqlreconcile::core::naming;
use std::env;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// トレーシングを初期化（ログは標準エラー出力へ）
///
/// `RUST_LOG` があればそれに従い、なければ `--verbose` で debug、通常は warn。
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", naming::APP_NAME, default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    // --config フラグの処理（絶対パスに変換）
    let config_path: Option<PathBuf> = cli.config.map(|p| {
        if p.is_absolute() {
            p
        } else {
            project_path.join(p)
        }
    });

    let format = cli.format;
    let url = cli.url;

    match cli.command {
        Commands::Plan { source, state } => {
            let handler = PlanCommandHandler::new();
            let command = PlanCommand {
                project_path,
                config_path,
                source: MigrationInput::from_args(&source)?,
                state,
                format,
            };
            handler.execute(&command)
        }

        Commands::Apply { source, state } => {
            let handler = ApplyCommandHandler::new();
            let command = ApplyCommand {
                project_path,
                config_path,
                url,
                source: MigrationInput::from_args(&source)?,
                state,
                format,
            };
            handler.execute(&command).await
        }

        Commands::Destroy { state } => {
            let handler = DestroyCommandHandler::new();
            let command = DestroyCommand {
                project_path,
                config_path,
                url,
                state,
                format,
            };
            handler.execute(&command).await
        }

        Commands::Query { sql } => {
            let handler = QueryCommandHandler::new();
            let command = QueryCommand {
                project_path,
                config_path,
                url,
                sql,
            };
            handler.execute(&command).await
        }

        Commands::Driver => {
            let handler = DriverCommandHandler::new();
            let command = DriverCommand {
                project_path,
                config_path,
                url,
                format,
            };
            handler.execute(&command)
        }
    }
}
