// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、ConfigurationError, IoError, DatabaseError,
// ReconcileError, ProjectionError を定義します。

use crate::core::migration::{MigrationPhase, MigrationSequence};
use thiserror::Error;

/// 設定エラー
///
/// マイグレーション定義の読み込み・検証時に発生するエラーを表現します。
/// データベースに触れる前に検出され、再試行されることはありません。
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    /// Empty identifier
    #[error("Migration #{index} has an empty id")]
    EmptyId {
        /// シーケンス内の位置
        index: usize,
    },

    /// Duplicate identifier
    #[error("Duplicate migration id {id:?} (defined by {first} and {second})")]
    DuplicateId {
        /// 重複したID
        id: String,
        /// 先に定義した箇所（ファイル名または位置）
        first: String,
        /// 後に定義した箇所（ファイル名または位置）
        second: String,
    },

    /// No migration declared
    #[error("At least one migration is required")]
    NoMigrations,

    /// Split marker does not occur exactly once
    #[error("Migration file {file} must contain the split marker {marker:?} exactly once (found {occurrences})")]
    SplitMarker {
        /// 対象ファイル
        file: String,
        /// 期待した区切り文字列
        marker: String,
        /// 出現回数
        occurrences: usize,
    },

    /// Up/down file without its counterpart
    #[error("Migration file {file} has no matching {missing} file")]
    MissingPair {
        /// 片割れのファイル
        file: String,
        /// 欠けている側（up / down）
        missing: MigrationPhase,
    },

    /// Inline migration list could not be decoded
    #[error("Failed to parse migration list {path}: {cause}")]
    Parse {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// File system failure
    #[error(transparent)]
    Io(#[from] IoError),
}

impl ConfigurationError {
    /// 空IDエラーかどうか
    pub fn is_empty_id(&self) -> bool {
        matches!(self, ConfigurationError::EmptyId { .. })
    }

    /// 重複IDエラーかどうか
    pub fn is_duplicate_id(&self) -> bool {
        matches!(self, ConfigurationError::DuplicateId { .. })
    }

    /// 区切り文字列エラーかどうか
    pub fn is_split_marker(&self) -> bool {
        matches!(self, ConfigurationError::SplitMarker { .. })
    }

    /// ペア欠落エラーかどうか
    pub fn is_missing_pair(&self) -> bool {
        matches!(self, ConfigurationError::MissingPair { .. })
    }
}

/// I/Oエラー
///
/// ファイル操作時に発生するエラーを表現します。
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound {
        /// ファイルパス
        path: String,
    },

    /// Path is not a directory
    #[error("Not a directory: {path}")]
    NotADirectory {
        /// パス
        path: String,
    },

    /// File read error
    #[error("Failed to read file: {path} (cause: {cause})")]
    FileRead {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// Directory read error
    #[error("Failed to read directory: {path} (cause: {cause})")]
    DirectoryRead {
        /// ディレクトリパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// File write error
    #[error("Failed to write file: {path} (cause: {cause})")]
    FileWrite {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// Directory creation error
    #[error("Failed to create directory: {path} (cause: {cause})")]
    DirectoryCreate {
        /// ディレクトリパス
        path: String,
        /// エラー原因
        cause: String,
    },
}

impl IoError {
    /// ファイルが見つからないエラーかどうか
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, IoError::FileNotFound { .. })
    }

    /// ファイル読み込みエラーかどうか
    pub fn is_file_read(&self) -> bool {
        matches!(self, IoError::FileRead { .. })
    }
}

/// データベースエラー
///
/// データベース操作時に発生するエラーを表現します。
#[derive(Debug, Clone, Error)]
pub enum DatabaseError {
    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Invalid connection url
    #[error("Invalid database url: {message}")]
    InvalidUrl {
        /// エラーメッセージ
        message: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },

    /// Cursor error (row fetch or column metadata)
    #[error("Cursor error: {message}")]
    Cursor {
        /// エラーメッセージ
        message: String,
    },

    /// Value could not be scanned into its target
    #[error("Unable to scan column {column:?}: {message}")]
    Scan {
        /// カラム名
        column: String,
        /// エラーメッセージ
        message: String,
    },
}

impl DatabaseError {
    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, DatabaseError::Connection { .. })
    }

    /// URLエラーかどうか
    pub fn is_invalid_url(&self) -> bool {
        matches!(self, DatabaseError::InvalidUrl { .. })
    }

    /// クエリエラーかどうか
    pub fn is_query(&self) -> bool {
        matches!(self, DatabaseError::Query { .. })
    }

    /// スキャンエラーかどうか
    pub fn is_scan(&self) -> bool {
        matches!(self, DatabaseError::Scan { .. })
    }
}

/// 調整（reconcile）エラー
///
/// 実行済みの文はロールバックされません。`applied_state()` は
/// 失敗時点でデータベースに実際に適用されているマイグレーション列を返します。
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    /// A statement was rejected by the database
    #[error("Migration {migration_id:?} failed during {phase}: {source}")]
    Execution {
        /// 失敗したマイグレーションID
        migration_id: String,
        /// 実行中のフェーズ
        phase: MigrationPhase,
        /// 原因
        #[source]
        source: DatabaseError,
        /// 失敗時点で適用済みのマイグレーション列
        applied: MigrationSequence,
    },

    /// The caller cancelled the reconciliation
    #[error("Reconciliation cancelled before {phase} of migration {migration_id:?} completed")]
    Cancelled {
        /// 未完了のマイグレーションID
        migration_id: String,
        /// 実行中のフェーズ
        phase: MigrationPhase,
        /// キャンセル時点で適用済みのマイグレーション列
        applied: MigrationSequence,
    },
}

impl ReconcileError {
    /// 実行エラーかどうか
    pub fn is_execution(&self) -> bool {
        matches!(self, ReconcileError::Execution { .. })
    }

    /// キャンセルかどうか
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReconcileError::Cancelled { .. })
    }

    /// 失敗したマイグレーションIDを取得
    pub fn migration_id(&self) -> &str {
        match self {
            ReconcileError::Execution { migration_id, .. }
            | ReconcileError::Cancelled { migration_id, .. } => migration_id,
        }
    }

    /// 失敗したフェーズを取得
    pub fn phase(&self) -> MigrationPhase {
        match self {
            ReconcileError::Execution { phase, .. } | ReconcileError::Cancelled { phase, .. } => {
                *phase
            }
        }
    }

    /// 失敗時点でデータベースに適用されているマイグレーション列
    pub fn applied_state(&self) -> &MigrationSequence {
        match self {
            ReconcileError::Execution { applied, .. } | ReconcileError::Cancelled { applied, .. } => {
                applied
            }
        }
    }
}

/// 行射影エラー
///
/// クエリ結果を統一型へ変換する際のエラーです。そのクエリのみを中断します。
#[derive(Debug, Clone, Error)]
pub enum ProjectionError {
    /// Column metadata unavailable
    #[error("Unable to retrieve column types: {cause}")]
    ColumnMetadata {
        /// エラー原因
        cause: String,
    },

    /// No uniform type for a column
    #[error("Unexpected type for {column:?}: {database_type:?} ({native_kind})")]
    UnsupportedType {
        /// カラム名
        column: String,
        /// データベースが報告した型名
        database_type: String,
        /// ネイティブ型
        native_kind: String,
    },

    /// Value did not fit its derived scan target
    #[error("Unable to scan value for {column:?}: {message}")]
    Scan {
        /// カラム名
        column: String,
        /// エラーメッセージ
        message: String,
    },

    /// Cursor failure
    #[error("Unable to read row: {cause}")]
    Cursor {
        /// エラー原因
        cause: DatabaseError,
    },

    /// Cancelled by the caller
    #[error("Query cancelled")]
    Cancelled,
}

impl ProjectionError {
    /// 型導出エラーかどうか
    pub fn is_unsupported_type(&self) -> bool {
        matches!(self, ProjectionError::UnsupportedType { .. })
    }

    /// スキャンエラーかどうか
    pub fn is_scan(&self) -> bool {
        matches!(self, ProjectionError::Scan { .. })
    }

    /// キャンセルかどうか
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProjectionError::Cancelled)
    }
}
