// 命名ポリシー
//
// アプリケーション名と関連パスの単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "sqlreconcile";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".sqlreconcile.yaml";

/// 既定の状態ディレクトリ
pub const STATE_DIR: &str = ".sqlreconcile";

/// 既定の状態ファイル名（状態ディレクトリ内）
pub const STATE_FILE: &str = "state.json";

/// 接続URLを指定する環境変数
pub const URL_ENV_VAR: &str = "SQL_URL";
