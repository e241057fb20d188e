// マイグレーション調整サービス
//
// 適用済み列（prior）と目標列（planned）の位置ごとの差分から計画を導出し、
// 取り消し（down）を末尾から、適用（up）を先頭から順に実行します。
// トランザクションで包まず、最初の失敗で中断します。

use crate::adapters::executor::StatementExecutor;
use crate::core::error::{DatabaseError, ReconcileError};
use crate::core::migration::{Migration, MigrationPhase, MigrationSequence, ReconciliationPlan};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// 調整結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// 取り消したマイグレーションID（実行順）
    pub undone: Vec<String>,
    /// 適用したマイグレーションID（実行順）
    pub applied: Vec<String>,
}

impl ReconcileOutcome {
    /// 何も実行しなかったかどうか
    pub fn is_noop(&self) -> bool {
        self.undone.is_empty() && self.applied.is_empty()
    }
}

/// マイグレーション調整サービス
///
/// 接続状態を保持せず、実行器は呼び出しごとに借用します。
/// 同一データベースに対する並行呼び出しは呼び出し側で直列化してください。
#[derive(Debug, Clone, Default)]
pub struct MigrationReconciler {}

impl MigrationReconciler {
    /// 新しいMigrationReconcilerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 調整計画を作成（データベースに触れない）
    pub fn plan(
        &self,
        planned: &MigrationSequence,
        prior: &MigrationSequence,
    ) -> ReconciliationPlan {
        ReconciliationPlan::between(planned, prior)
    }

    /// 適用済み列を目標列へ調整
    ///
    /// # Arguments
    ///
    /// * `executor` - 文実行器
    /// * `planned` - 目標のマイグレーション列（destroy では空）
    /// * `prior` - 適用済みのマイグレーション列（create では空）
    /// * `cancel` - キャンセルトークン
    ///
    /// # Errors
    ///
    /// 失敗・キャンセル時は、その時点でデータベースに適用されている列を
    /// `ReconcileError::applied_state()` として返します。
    pub async fn reconcile(
        &self,
        executor: &dyn StatementExecutor,
        planned: &MigrationSequence,
        prior: &MigrationSequence,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let plan = self.plan(planned, prior);
        let k = plan.common_prefix;

        if plan.is_empty() {
            debug!(count = planned.len(), "Migrations already up to date");
            return Ok(ReconcileOutcome::default());
        }

        info!(
            common_prefix = k,
            down = plan.down.len(),
            up = plan.up.len(),
            "Reconciling migrations"
        );

        let mut outcome = ReconcileOutcome::default();

        // down: prior[len-1] から prior[k] まで
        for (offset, migration) in plan.down.iter().enumerate() {
            let index = prior.len() - 1 - offset;
            run_statement(executor, migration, MigrationPhase::Down, cancel)
                .await
                .map_err(|failure| {
                    failure.into_error(migration, MigrationPhase::Down, prior.prefix(index + 1))
                })?;
            outcome.undone.push(migration.id().to_string());
        }

        // up: planned[k] から planned[len-1] まで
        for (offset, migration) in plan.up.iter().enumerate() {
            let index = k + offset;
            run_statement(executor, migration, MigrationPhase::Up, cancel)
                .await
                .map_err(|failure| {
                    failure.into_error(migration, MigrationPhase::Up, planned.prefix(index))
                })?;
            outcome.applied.push(migration.id().to_string());
        }

        info!(
            undone = outcome.undone.len(),
            applied = outcome.applied.len(),
            "Reconciliation completed"
        );
        Ok(outcome)
    }
}

/// 1文の実行失敗
enum StatementFailure {
    Execution(DatabaseError),
    Cancelled,
}

impl StatementFailure {
    fn into_error(
        self,
        migration: &Migration,
        phase: MigrationPhase,
        applied: MigrationSequence,
    ) -> ReconcileError {
        match self {
            StatementFailure::Execution(source) => ReconcileError::Execution {
                migration_id: migration.id().to_string(),
                phase,
                source,
                applied,
            },
            StatementFailure::Cancelled => ReconcileError::Cancelled {
                migration_id: migration.id().to_string(),
                phase,
                applied,
            },
        }
    }
}

async fn run_statement(
    executor: &dyn StatementExecutor,
    migration: &Migration,
    phase: MigrationPhase,
    cancel: &CancellationToken,
) -> Result<(), StatementFailure> {
    if cancel.is_cancelled() {
        info!(migration_id = migration.id(), %phase, "Reconciliation cancelled");
        return Err(StatementFailure::Cancelled);
    }

    debug!(migration_id = migration.id(), %phase, "Executing migration statement");

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            info!(migration_id = migration.id(), %phase, "Reconciliation cancelled");
            Err(StatementFailure::Cancelled)
        }
        result = executor.execute(migration.statement(phase)) => {
            result.map_err(StatementFailure::Execution)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingExecutor {
        executed: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl StatementExecutor for RecordingExecutor {
        async fn execute(&self, statement: &str) -> Result<(), DatabaseError> {
            if self.fail_on.as_deref() == Some(statement) {
                return Err(DatabaseError::Query {
                    message: "rejected".to_string(),
                    sql: Some(statement.to_string()),
                });
            }
            self.executed.lock().unwrap().push(statement.to_string());
            Ok(())
        }
    }

    fn m(id: &str) -> Migration {
        Migration::new(id, format!("UP {}", id), format!("DOWN {}", id))
    }

    fn seq(ids: &[&str]) -> MigrationSequence {
        ids.iter().map(|id| m(id)).collect()
    }

    #[tokio::test]
    async fn test_equal_sequences_execute_nothing() {
        let executor = RecordingExecutor::default();
        let s = seq(&["a", "b"]);

        let outcome = MigrationReconciler::new()
            .reconcile(&executor, &s, &s, &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.is_noop());
        assert!(executor.executed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_down_failure_keeps_failing_migration_applied() {
        let executor = RecordingExecutor {
            fail_on: Some("DOWN b".to_string()),
            ..Default::default()
        };

        let err = MigrationReconciler::new()
            .reconcile(
                &executor,
                &MigrationSequence::new(),
                &seq(&["a", "b", "c"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(err.is_execution());
        assert_eq!(err.migration_id(), "b");
        assert_eq!(err.phase(), MigrationPhase::Down);
        assert_eq!(err.applied_state().ids(), vec!["a", "b"]);
        assert_eq!(*executor.executed.lock().unwrap(), vec!["DOWN c"]);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_first_statement() {
        let executor = RecordingExecutor::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = MigrationReconciler::new()
            .reconcile(&executor, &seq(&["a"]), &MigrationSequence::new(), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.phase(), MigrationPhase::Up);
        assert!(err.applied_state().is_empty());
        assert!(executor.executed.lock().unwrap().is_empty());
    }
}
