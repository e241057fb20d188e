// Adapters
// データベース接続・文実行・行カーソルへのアクセスを抽象化

pub mod connection_string;
pub mod cursor;
pub mod database;
pub mod executor;
pub mod sqlserver;
