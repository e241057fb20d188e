// 文実行アダプター
//
// 開いている接続に対して任意のDDL/DML文を実行する能力の抽象化と、
// ドライバー別の接続を使った実装を提供します。

use crate::adapters::database::DatabasePool;
use crate::core::error::DatabaseError;
use async_trait::async_trait;

/// 文実行能力
///
/// 調整サービスは実行器を借用するだけで、接続状態を保持しません。
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// SQL文を実行（パラメータバインドなし）
    async fn execute(&self, statement: &str) -> Result<(), DatabaseError>;
}

/// 接続プールを使った実行器
#[derive(Debug, Clone, Copy)]
pub struct PoolExecutor<'a> {
    pool: &'a DatabasePool,
}

impl<'a> PoolExecutor<'a> {
    /// 新しいPoolExecutorを作成
    pub fn new(pool: &'a DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatementExecutor for PoolExecutor<'_> {
    async fn execute(&self, statement: &str) -> Result<(), DatabaseError> {
        self.pool.execute(statement).await
    }
}
