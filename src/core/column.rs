// カラムメタデータとネイティブ値
//
// カーソルが報告するカラム情報（名前・DB型名・ネイティブ型）と、
// 行スキャン時の受け皿（ScanTarget）およびスキャン結果（NativeValue）。

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use uuid::Uuid;

use crate::core::uniform::{Number, UniformValue};

/// ドライバーのネイティブなスキャン型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeKind {
    NullableInt64,
    NullableInt32,
    NullableFloat64,
    NullableString,
    NullableBool,
    NullableTime,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Bool,
    Bytes,
    Time,
    /// 型を持たない NULL（NULL リテラルや空集合の集約など）
    Null,
    /// 上記に当てはまらない型（ドライバー固有の名前）
    Other(String),
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NativeKind::NullableInt64 => "nullable int64",
            NativeKind::NullableInt32 => "nullable int32",
            NativeKind::NullableFloat64 => "nullable float64",
            NativeKind::NullableString => "nullable string",
            NativeKind::NullableBool => "nullable bool",
            NativeKind::NullableTime => "nullable time",
            NativeKind::Int8 => "int8",
            NativeKind::Int16 => "int16",
            NativeKind::Int32 => "int32",
            NativeKind::Int64 => "int64",
            NativeKind::UInt8 => "uint8",
            NativeKind::UInt16 => "uint16",
            NativeKind::UInt32 => "uint32",
            NativeKind::UInt64 => "uint64",
            NativeKind::Float32 => "float32",
            NativeKind::Float64 => "float64",
            NativeKind::String => "string",
            NativeKind::Bool => "bool",
            NativeKind::Bytes => "bytes",
            NativeKind::Time => "time",
            NativeKind::Null => "null",
            NativeKind::Other(name) => name,
        };
        f.write_str(name)
    }
}

/// カーソルが報告するカラム情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    /// カラム名（計算式の場合はドライバーのプレースホルダーや空文字）
    pub name: String,
    /// データベースが報告した型名（例: `TIMESTAMPTZ`, `MONEY`）
    pub database_type_name: String,
    /// ネイティブなスキャン型
    pub native_kind: NativeKind,
}

impl ColumnType {
    /// 新しいカラム情報を作成
    pub fn new(
        name: impl Into<String>,
        database_type_name: impl Into<String>,
        native_kind: NativeKind,
    ) -> Self {
        Self {
            name: name.into(),
            database_type_name: database_type_name.into(),
            native_kind,
        }
    }
}

/// null 許容のスキャン受け皿
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanTarget {
    NullInt64,
    NullInt32,
    NullFloat64,
    NullString,
    NullBool,
    NullTime,
    /// SQL Server の UNIQUEIDENTIFIER（16バイト、混合エンディアン）
    UniqueIdentifier,
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanTarget::NullInt64 => "nullable int64",
            ScanTarget::NullInt32 => "nullable int32",
            ScanTarget::NullFloat64 => "nullable float64",
            ScanTarget::NullString => "nullable string",
            ScanTarget::NullBool => "nullable bool",
            ScanTarget::NullTime => "nullable time",
            ScanTarget::UniqueIdentifier => "unique identifier",
        };
        f.write_str(name)
    }
}

/// スキャン済みのネイティブ値
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Int64(Option<i64>),
    Int32(Option<i32>),
    Float64(Option<f64>),
    String(Option<String>),
    Bool(Option<bool>),
    Time(Option<DateTime<Utc>>),
    UniqueIdentifier(Option<[u8; 16]>),
}

impl NativeValue {
    /// この値を受け取るスキャン受け皿
    pub fn target(&self) -> ScanTarget {
        match self {
            NativeValue::Int64(_) => ScanTarget::NullInt64,
            NativeValue::Int32(_) => ScanTarget::NullInt32,
            NativeValue::Float64(_) => ScanTarget::NullFloat64,
            NativeValue::String(_) => ScanTarget::NullString,
            NativeValue::Bool(_) => ScanTarget::NullBool,
            NativeValue::Time(_) => ScanTarget::NullTime,
            NativeValue::UniqueIdentifier(_) => ScanTarget::UniqueIdentifier,
        }
    }

    /// null 許容の受け皿を展開して統一値へ変換
    ///
    /// 時刻は UTC・秒精度の RFC 3339 文字列になります。
    pub fn into_uniform(self) -> UniformValue {
        match self {
            NativeValue::Int64(v) => v.map_or(UniformValue::Null, |i| {
                UniformValue::Number(Number::Integer(i))
            }),
            NativeValue::Int32(v) => v.map_or(UniformValue::Null, |i| {
                UniformValue::Number(Number::Integer(i64::from(i)))
            }),
            NativeValue::Float64(v) => v.map_or(UniformValue::Null, |f| {
                UniformValue::Number(Number::Float(f))
            }),
            NativeValue::String(v) => v.map_or(UniformValue::Null, UniformValue::String),
            NativeValue::Bool(v) => v.map_or(UniformValue::Null, UniformValue::Bool),
            NativeValue::Time(v) => v.map_or(UniformValue::Null, |t| {
                UniformValue::String(format_timestamp(&t))
            }),
            NativeValue::UniqueIdentifier(v) => v.map_or(UniformValue::Null, |bytes| {
                UniformValue::String(format_unique_identifier(bytes))
            }),
        }
    }
}

/// 時刻の固定テキスト表現（例: `2024-01-02T03:04:05Z`）
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// SQL Server の UNIQUEIDENTIFIER を大文字のGUID表記へ変換
///
/// 先頭3グループはリトルエンディアンで格納されています。
pub fn format_unique_identifier(bytes: [u8; 16]) -> String {
    Uuid::from_bytes_le(bytes).to_string().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_null_unwraps_to_explicit_null() {
        assert_eq!(NativeValue::Int64(None).into_uniform(), UniformValue::Null);
        assert_eq!(NativeValue::String(None).into_uniform(), UniformValue::Null);
        assert_eq!(NativeValue::Bool(None).into_uniform(), UniformValue::Null);
        assert_eq!(NativeValue::Time(None).into_uniform(), UniformValue::Null);
    }

    #[test]
    fn test_zero_values_are_not_null() {
        assert_eq!(
            NativeValue::Int64(Some(0)).into_uniform(),
            UniformValue::Number(Number::Integer(0))
        );
        assert_eq!(
            NativeValue::String(Some(String::new())).into_uniform(),
            UniformValue::String(String::new())
        );
    }

    #[test]
    fn test_time_is_encoded_as_utc_seconds() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::milliseconds(678);
        assert_eq!(
            NativeValue::Time(Some(t)).into_uniform(),
            UniformValue::String("2024-01-02T03:04:05Z".to_string())
        );
    }

    #[test]
    fn test_unique_identifier_byte_order() {
        let bytes = [
            0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD,
            0xEE, 0xFF,
        ];
        assert_eq!(
            format_unique_identifier(bytes),
            "00112233-4455-6677-8899-AABBCCDDEEFF"
        );
    }

    #[test]
    fn test_value_reports_its_target() {
        assert_eq!(NativeValue::Int32(Some(1)).target(), ScanTarget::NullInt32);
        assert_eq!(NativeValue::Time(None).target(), ScanTarget::NullTime);
    }
}
