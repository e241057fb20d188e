// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// sqlreconcile - Ordered SQL migration reconciler
///
/// Reconcile a declared list of reversible migrations against the
/// migrations already applied to a database.
#[derive(Parser, Debug)]
#[command(name = "sqlreconcile")]
#[command(author = "sqlreconcile Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reconcile ordered SQL migrations against a live database")]
#[command(long_about = "sqlreconcile - Ordered SQL migration reconciler

Declare an ordered list of reversible migrations (an up and a down
statement each) and let sqlreconcile move the database from the
migrations it has already applied to the ones you declared:
  • Unchanged leading migrations are left alone
  • Everything after the first difference is undone from the top
  • The remaining declared migrations are applied in order

Query results can be printed as driver-independent JSON rows.

Supported databases: PostgreSQL, MySQL, SQLite")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Point at a database:     export SQL_URL=sqlite://app.db?mode=rwc
  2. Preview the changes:     sqlreconcile plan --path migrations
  3. Apply them:              sqlreconcile apply --path migrations
  4. Inspect the data:        sqlreconcile query \"SELECT * FROM users\"

For detailed help on each command, use: sqlreconcile <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database url (overrides the config file and SQL_URL)
    #[arg(short, long, global = true, value_name = "URL")]
    pub url: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// マイグレーションの供給元の指定
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// YAML or JSON file listing migrations as {id, up, down}
    #[arg(
        short,
        long,
        value_name = "FILE",
        conflicts_with = "path",
        required_unless_present = "path"
    )]
    pub migrations: Option<PathBuf>,

    /// Directory of migration files
    #[arg(short, long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Read one file per migration, split into up and down at MARKER
    #[arg(long, value_name = "MARKER", requires = "path", allow_hyphen_values = true)]
    pub single_file_split: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show what apply would execute
    ///
    /// Compares the declared migrations with the applied state and lists
    /// the migrations that would be undone and applied. Does not connect
    /// to the database.
    ///
    /// EXAMPLES:
    ///   # Plan from a directory of NNN_name.up.sql / NNN_name.down.sql files
    ///   sqlreconcile plan --path migrations
    ///
    ///   # Plan from an inline list
    ///   sqlreconcile plan --migrations migrations.yaml
    Plan {
        #[command(flatten)]
        source: SourceArgs,

        /// Migration state file
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,
    },

    /// Reconcile the database with the declared migrations
    ///
    /// Undoes applied migrations from the first difference onwards (last
    /// first), then applies the remaining declared migrations in order.
    /// The applied state is saved even when a statement fails.
    ///
    /// EXAMPLES:
    ///   # Apply from a directory
    ///   sqlreconcile apply --path migrations
    ///
    ///   # Apply shmig-style single files
    ///   sqlreconcile apply --path migrations --single-file-split "-- ==== DOWN ===="
    Apply {
        #[command(flatten)]
        source: SourceArgs,

        /// Migration state file
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,
    },

    /// Undo every applied migration
    ///
    /// Runs the down statement of each applied migration, last first.
    ///
    /// EXAMPLES:
    ///   sqlreconcile destroy
    Destroy {
        /// Migration state file
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,
    },

    /// Run a query and print uniform typed rows
    ///
    /// Prints {"rows": [...], "row_type": {...}} as JSON.
    ///
    /// EXAMPLES:
    ///   sqlreconcile query "SELECT id, name FROM users"
    Query {
        /// SQL query to run
        #[arg(value_name = "SQL")]
        sql: String,
    },

    /// Show the resolved driver and url
    ///
    /// EXAMPLES:
    ///   sqlreconcile driver --url azuresql://user:pw@host/db
    Driver,
}
