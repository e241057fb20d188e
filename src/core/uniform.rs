// 統一値モデル
//
// ドライバーに依存しない null 許容の値表現。
// 公開される値の形は string / number / bool と null のみです。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 統一型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniformType {
    String,
    Number,
    Bool,
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformType::String => write!(f, "string"),
            UniformType::Number => write!(f, "number"),
            UniformType::Bool => write!(f, "bool"),
        }
    }
}

/// 数値（整数または浮動小数点）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

/// 統一値
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniformValue {
    Null,
    Number(Number),
    String(String),
    Bool(bool),
}

impl UniformValue {
    /// null かどうか
    pub fn is_null(&self) -> bool {
        matches!(self, UniformValue::Null)
    }

    /// 文字列として取得
    pub fn as_str(&self) -> Option<&str> {
        match self {
            UniformValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// 整数として取得
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            UniformValue::Number(Number::Integer(i)) => Some(*i),
            _ => None,
        }
    }
}

/// 1行分の値（カラム名 → 値）
pub type Row = BTreeMap<String, UniformValue>;

/// 行の型記述子（カラム名 → 統一型）
///
/// 1つのカーソルの全行で共通です。
pub type RowType = BTreeMap<String, UniformType>;

/// クエリ結果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    /// 行
    pub rows: Vec<Row>,
    /// 全行共通の型記述子（行がない場合は空）
    pub row_type: RowType,
}
