// 接続URLパーサー
//
// 接続URLのスキームからドライバー種別を判定し、
// ドライバーへ渡すURLを組み立てる。

use crate::core::driver::DriverIdentity;
use crate::core::error::DatabaseError;
use serde::Serialize;

/// 解決済みのデータソース
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSource {
    /// ドライバー種別
    pub driver: DriverIdentity,
    /// ドライバーへ渡すURL
    pub url: String,
}

/// 接続URLを解析
pub fn parse_url(url: &str) -> Result<DataSource, DatabaseError> {
    let scheme = scheme_from_url(url)?;

    match scheme {
        "postgres" | "postgresql" => Ok(DataSource {
            driver: DriverIdentity::Postgres,
            url: url.to_string(),
        }),
        "mysql" => Ok(DataSource {
            driver: DriverIdentity::MySql,
            url: url.to_string(),
        }),
        "azuresql" => Ok(DataSource {
            driver: DriverIdentity::SqlServer,
            url: url.replacen("azuresql://", "sqlserver://", 1),
        }),
        "sqlserver" => Ok(DataSource {
            driver: DriverIdentity::SqlServer,
            url: url.to_string(),
        }),
        "sqlite" => Ok(DataSource {
            driver: DriverIdentity::Generic,
            url: url.to_string(),
        }),
        other => Err(DatabaseError::InvalidUrl {
            message: format!("unexpected scheme: {:?}", other),
        }),
    }
}

/// URLのスキーム部分を取り出す
pub fn scheme_from_url(url: &str) -> Result<&str, DatabaseError> {
    if url.is_empty() {
        return Err(DatabaseError::InvalidUrl {
            message: "a datasource name is required".to_string(),
        });
    }

    match url.find(':') {
        Some(i) if i >= 1 => Ok(&url[..i]),
        _ => Err(DatabaseError::InvalidUrl {
            message: "a scheme for datasource name is required".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_postgres_variants() {
        for url in [
            "postgres://u:p@localhost:5432/db?sslmode=disable",
            "postgresql://u@localhost/db",
        ] {
            let ds = parse_url(url).unwrap();
            assert_eq!(ds.driver, DriverIdentity::Postgres);
            assert_eq!(ds.url, url);
        }
    }

    #[test]
    fn test_parse_mysql() {
        let ds = parse_url("mysql://root:pw@localhost:3306/app").unwrap();
        assert_eq!(ds.driver, DriverIdentity::MySql);
    }

    #[test]
    fn test_azuresql_is_rewritten_to_sqlserver() {
        let ds = parse_url("azuresql://sa:pw@host:1433?database=app").unwrap();
        assert_eq!(ds.driver, DriverIdentity::SqlServer);
        assert_eq!(ds.url, "sqlserver://sa:pw@host:1433?database=app");
    }

    #[test]
    fn test_sqlite_is_generic() {
        let ds = parse_url("sqlite://local.db").unwrap();
        assert_eq!(ds.driver, DriverIdentity::Generic);
    }

    #[test]
    fn test_invalid_urls() {
        assert!(parse_url("").unwrap_err().is_invalid_url());
        assert!(parse_url(":nothing").unwrap_err().is_invalid_url());
        assert!(parse_url("localhost").unwrap_err().is_invalid_url());
        let err = parse_url("oracle://x").unwrap_err();
        assert!(err.to_string().contains("oracle"));
    }
}
