// マイグレーションドメインモデル
//
// 可逆なスキーマ変更（up / down）とその順序付き列、
// および二つの列の差分から導出される調整計画を表現する型システム。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;

use crate::core::error::ConfigurationError;

/// マイグレーション
///
/// ID、適用SQL（up）、取り消しSQL（down）の組です。生成後は不変です。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Migration {
    id: String,
    up: String,
    down: String,
}

impl Migration {
    /// 新しいマイグレーションを作成
    pub fn new(id: impl Into<String>, up: impl Into<String>, down: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            up: up.into(),
            down: down.into(),
        }
    }

    /// マイグレーションID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 適用SQL
    pub fn up(&self) -> &str {
        &self.up
    }

    /// 取り消しSQL
    pub fn down(&self) -> &str {
        &self.down
    }

    /// 指定フェーズで実行するSQL
    pub fn statement(&self, phase: MigrationPhase) -> &str {
        match phase {
            MigrationPhase::Up => &self.up,
            MigrationPhase::Down => &self.down,
        }
    }
}

/// マイグレーションの実行フェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationPhase {
    Up,
    Down,
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationPhase::Up => write!(f, "up"),
            MigrationPhase::Down => write!(f, "down"),
        }
    }
}

/// 順序付きマイグレーション列
///
/// 添字0が最初に適用されたマイグレーションです。
/// 二つの列は集合ではなく位置ごとに比較されます。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationSequence(Vec<Migration>);

impl MigrationSequence {
    /// 空の列を作成
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// 先頭 `len` 件からなる列を作成
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    /// マイグレーションのベクタへ変換
    pub fn into_inner(self) -> Vec<Migration> {
        self.0
    }

    /// IDの一覧
    pub fn ids(&self) -> Vec<&str> {
        self.0.iter().map(Migration::id).collect()
    }

    /// 構造検証（空ID・重複IDの検出）
    ///
    /// 調整の前に一度だけ行います。
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for (index, migration) in self.0.iter().enumerate() {
            if migration.id.trim().is_empty() {
                return Err(ConfigurationError::EmptyId { index });
            }

            if let Some(first) = seen.insert(migration.id.as_str(), index) {
                return Err(ConfigurationError::DuplicateId {
                    id: migration.id.clone(),
                    first: format!("migration #{}", first),
                    second: format!("migration #{}", index),
                });
            }
        }

        Ok(())
    }

    /// 二つの列の最長共通接頭辞の長さ
    ///
    /// id・up・down がすべて一致する位置までを数え、最初の不一致で止まります。
    pub fn common_prefix_len(&self, other: &MigrationSequence) -> usize {
        self.0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }
}

impl Deref for MigrationSequence {
    type Target = [Migration];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Migration>> for MigrationSequence {
    fn from(migrations: Vec<Migration>) -> Self {
        Self(migrations)
    }
}

impl FromIterator<Migration> for MigrationSequence {
    fn from_iter<I: IntoIterator<Item = Migration>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MigrationSequence {
    type Item = &'a Migration;
    type IntoIter = std::slice::Iter<'a, Migration>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// 調整計画
///
/// 永続化されず、調整のたびに導出されます。
/// `down` は逆順（末尾から）、`up` は正順で実行します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationPlan {
    /// 維持される共通接頭辞の長さ
    pub common_prefix: usize,
    /// 取り消すマイグレーション（実行順 = 逆位置順）
    pub down: Vec<Migration>,
    /// 適用するマイグレーション（実行順 = 正位置順）
    pub up: Vec<Migration>,
}

impl ReconciliationPlan {
    /// 適用済み列 `prior` から目標列 `planned` への計画を作成
    pub fn between(planned: &MigrationSequence, prior: &MigrationSequence) -> Self {
        let common_prefix = planned.common_prefix_len(prior);

        Self {
            common_prefix,
            down: prior[common_prefix..].iter().rev().cloned().collect(),
            up: planned[common_prefix..].to_vec(),
        }
    }

    /// 実行する文がないかどうか
    pub fn is_empty(&self) -> bool {
        self.down.is_empty() && self.up.is_empty()
    }

    /// 実行する文の数
    pub fn statement_count(&self) -> usize {
        self.down.len() + self.up.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(id: &str) -> Migration {
        Migration::new(id, format!("UP {}", id), format!("DOWN {}", id))
    }

    #[test]
    fn test_migration_accessors() {
        let migration = Migration::new("t", "CREATE TABLE t(id int)", "DROP TABLE t");
        assert_eq!(migration.id(), "t");
        assert_eq!(migration.statement(MigrationPhase::Up), "CREATE TABLE t(id int)");
        assert_eq!(migration.statement(MigrationPhase::Down), "DROP TABLE t");
    }

    #[test]
    fn test_common_prefix_stops_at_first_mismatch() {
        let a = MigrationSequence::from(vec![m("a"), m("b"), m("c")]);
        let b = MigrationSequence::from(vec![m("a"), m("x"), m("c")]);
        assert_eq!(a.common_prefix_len(&b), 1);
    }

    #[test]
    fn test_common_prefix_with_different_lengths() {
        let short = MigrationSequence::from(vec![m("a")]);
        let long = MigrationSequence::from(vec![m("a"), m("b")]);
        assert_eq!(short.common_prefix_len(&long), 1);
        assert_eq!(long.common_prefix_len(&short), 1);
        assert_eq!(MigrationSequence::new().common_prefix_len(&long), 0);
    }

    #[test]
    fn test_same_id_changed_content_is_not_equal() {
        let a = MigrationSequence::from(vec![m("a"), Migration::new("b", "UP b", "DOWN b")]);
        let b = MigrationSequence::from(vec![m("a"), Migration::new("b", "UP b v2", "DOWN b")]);
        assert_eq!(a.common_prefix_len(&b), 1);
    }

    #[test]
    fn test_plan_orders_down_in_reverse() {
        let prior = MigrationSequence::from(vec![m("a"), m("b"), m("c")]);
        let planned = MigrationSequence::from(vec![m("a"), m("d")]);

        let plan = ReconciliationPlan::between(&planned, &prior);

        assert_eq!(plan.common_prefix, 1);
        assert_eq!(
            plan.down.iter().map(Migration::id).collect::<Vec<_>>(),
            vec!["c", "b"]
        );
        assert_eq!(plan.up.iter().map(Migration::id).collect::<Vec<_>>(), vec!["d"]);
        assert_eq!(plan.statement_count(), 3);
    }

    #[test]
    fn test_plan_for_identical_sequences_is_empty() {
        let seq = MigrationSequence::from(vec![m("a"), m("b")]);
        assert!(ReconciliationPlan::between(&seq, &seq).is_empty());
        assert!(ReconciliationPlan::between(&MigrationSequence::new(), &MigrationSequence::new()).is_empty());
    }

    #[test]
    fn test_validate_rejects_blank_id() {
        let seq = MigrationSequence::from(vec![m("a"), Migration::new("  ", "x", "y")]);
        let err = seq.validate().unwrap_err();
        assert!(matches!(err, ConfigurationError::EmptyId { index: 1 }));
    }

    #[test]
    fn test_validate_rejects_duplicate_id() {
        let seq = MigrationSequence::from(vec![m("a"), m("b"), m("a")]);
        let err = seq.validate().unwrap_err();
        assert!(err.is_duplicate_id());
        assert!(err.to_string().contains("\"a\""));
        assert!(err.to_string().contains("#0"));
        assert!(err.to_string().contains("#2"));
    }

    #[test]
    fn test_sequence_serializes_as_plain_list() {
        let seq = MigrationSequence::from(vec![Migration::new("t", "CREATE", "DROP")]);
        let json = serde_json::to_string(&seq).unwrap();
        assert_eq!(json, r#"[{"id":"t","up":"CREATE","down":"DROP"}]"#);

        let back: MigrationSequence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, seq);
    }

    #[test]
    fn test_prefix_is_clamped() {
        let seq = MigrationSequence::from(vec![m("a"), m("b")]);
        assert_eq!(seq.prefix(1).ids(), vec!["a"]);
        assert_eq!(seq.prefix(5).len(), 2);
    }
}
