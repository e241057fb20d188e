// データベース接続アダプター
//
// 接続URLのスキームに応じて、SQLxのネイティブ接続プール
// （PostgreSQL / MySQL / SQLite）またはtiberiusの接続（SQL Server）を作成します。
// 接続の寿命は呼び出し側（CLIコマンド）が管理し、調整・射影サービスには借用で渡します。

use crate::adapters::connection_string::{scheme_from_url, DataSource};
use crate::adapters::cursor::{RowCursor, SqlServerRowCursor, SqlxRowCursor};
use crate::adapters::sqlserver::SqlServerConnection;
use crate::core::config::Config;
use crate::core::error::DatabaseError;
use sqlx::pool::PoolOptions;
use sqlx::{Database, MySql, MySqlPool, PgPool, Postgres, Sqlite, SqlitePool};
use std::time::Duration;

/// 既定の最大接続数
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// 既定の接続取得タイムアウト（秒）
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// ドライバー別の接続
#[derive(Debug)]
pub enum DatabasePool {
    Postgres(PgPool),
    MySql(MySqlPool),
    Sqlite(SqlitePool),
    /// SQL Server は単一接続（`max_open_conns` は使わない）
    SqlServer(SqlServerConnection),
}

impl DatabasePool {
    /// クエリを発行して行カーソルを作成
    pub fn query<'a>(&'a self, sql: &'a str) -> Box<dyn RowCursor + 'a> {
        match self {
            DatabasePool::Postgres(pool) => {
                Box::new(SqlxRowCursor::new(sqlx::query(sql).fetch(pool)))
            }
            DatabasePool::MySql(pool) => Box::new(SqlxRowCursor::new(sqlx::query(sql).fetch(pool))),
            DatabasePool::Sqlite(pool) => {
                Box::new(SqlxRowCursor::new(sqlx::query(sql).fetch(pool)))
            }
            DatabasePool::SqlServer(connection) => {
                Box::new(SqlServerRowCursor::query(connection, sql))
            }
        }
    }

    /// SQL文を実行（パラメータバインドなし）
    ///
    /// 複数文を含むマイグレーションに対応するため、SQLxでは `raw_sql` を使います。
    pub async fn execute(&self, statement: &str) -> Result<(), DatabaseError> {
        let result = match self {
            DatabasePool::Postgres(pool) => {
                sqlx::raw_sql(statement).execute(pool).await.map(|_| ())
            }
            DatabasePool::MySql(pool) => sqlx::raw_sql(statement).execute(pool).await.map(|_| ()),
            DatabasePool::Sqlite(pool) => {
                sqlx::raw_sql(statement).execute(pool).await.map(|_| ())
            }
            DatabasePool::SqlServer(connection) => return connection.execute(statement).await,
        };

        result.map_err(|e| DatabaseError::Query {
            message: e.to_string(),
            sql: Some(statement.to_string()),
        })
    }

    /// 接続を閉じる
    pub async fn close(&self) {
        match self {
            DatabasePool::Postgres(pool) => pool.close().await,
            DatabasePool::MySql(pool) => pool.close().await,
            DatabasePool::Sqlite(pool) => pool.close().await,
            // 接続は破棄時に閉じる
            DatabasePool::SqlServer(_) => {}
        }
    }
}

/// データベース接続サービス
#[derive(Debug, Clone, Default)]
pub struct DatabaseConnectionService {}

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// データベース接続プールを作成
    ///
    /// # Arguments
    ///
    /// * `data_source` - 解決済みのデータソース
    /// * `config` - 接続設定
    pub async fn create_pool(
        &self,
        data_source: &DataSource,
        config: &Config,
    ) -> Result<DatabasePool, DatabaseError> {
        let url = data_source.url.as_str();
        let connection_error = |e: sqlx::Error| DatabaseError::Connection {
            message: format!("Unable to open database ({})", data_source.driver),
            cause: e.to_string(),
        };

        let pool = match scheme_from_url(url)? {
            "postgres" | "postgresql" => DatabasePool::Postgres(
                self.create_pool_options::<Postgres>(config)
                    .connect(url)
                    .await
                    .map_err(connection_error)?,
            ),
            "mysql" => DatabasePool::MySql(
                self.create_pool_options::<MySql>(config)
                    .connect(url)
                    .await
                    .map_err(connection_error)?,
            ),
            "sqlite" => DatabasePool::Sqlite(
                self.create_pool_options::<Sqlite>(config)
                    .connect(url)
                    .await
                    .map_err(connection_error)?,
            ),
            "sqlserver" => DatabasePool::SqlServer(
                SqlServerConnection::connect(url, self.timeout(config)).await?,
            ),
            other => {
                return Err(DatabaseError::InvalidUrl {
                    message: format!("unexpected scheme: {:?}", other),
                })
            }
        };

        Ok(pool)
    }

    /// プールオプションを作成
    pub fn create_pool_options<DB: Database>(&self, config: &Config) -> PoolOptions<DB> {
        let max_connections = match config.max_open_conns {
            0 => DEFAULT_MAX_CONNECTIONS,
            n => n,
        };

        PoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(self.timeout(config))
    }

    fn timeout(&self, config: &Config) -> Duration {
        Duration::from_secs(config.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// 接続テストを実行
    pub async fn test_connection(&self, pool: &DatabasePool) -> Result<(), DatabaseError> {
        pool.execute("SELECT 1")
            .await
            .map_err(|e| DatabaseError::Connection {
                message: "Unable to ping database".to_string(),
                cause: e.to_string(),
            })
    }
}
