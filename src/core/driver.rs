// データベースドライバー識別子
//
// 行射影のオーバーライド表を選択するための列挙タグ。

use serde::{Deserialize, Serialize};
use std::fmt;

/// ドライバー種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverIdentity {
    /// オーバーライドなし（SQLiteなど）
    Generic,
    /// MySQL / MariaDB
    #[serde(rename = "mysql")]
    MySql,
    /// PostgreSQL / CockroachDB
    Postgres,
    /// SQL Server / Azure SQL
    #[serde(rename = "sqlserver")]
    SqlServer,
}

impl DriverIdentity {
    /// ドライバー名
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverIdentity::Generic => "generic",
            DriverIdentity::MySql => "mysql",
            DriverIdentity::Postgres => "postgres",
            DriverIdentity::SqlServer => "sqlserver",
        }
    }
}

impl fmt::Display for DriverIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
