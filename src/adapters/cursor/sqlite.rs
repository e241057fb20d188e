// SQLite の行デコード
//
// SQLite は値ごとに格納クラスを持つため、宣言型ではなく
// 実際の格納クラス（INTEGER / REAL / TEXT / BLOB）からデコードします。
// 宣言型のない式のカラムは、現在行の値の格納クラスで型を判定します。

use super::{date_to_utc, decode_error, integer_value, null_value, NativeRow};
use crate::core::column::{NativeKind, NativeValue, ScanTarget};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// 型名からネイティブ型を判定
pub fn native_kind(type_name: &str) -> NativeKind {
    match type_name {
        "NULL" => NativeKind::Null,
        "INTEGER" => NativeKind::Int64,
        "REAL" | "NUMERIC" => NativeKind::Float64,
        "BOOLEAN" => NativeKind::Bool,
        "TEXT" | "TIME" => NativeKind::String,
        "DATE" | "DATETIME" => NativeKind::NullableTime,
        "BLOB" => NativeKind::Bytes,
        other => NativeKind::Other(other.to_string()),
    }
}

/// 格納クラスごとの生の値
#[derive(Debug)]
enum RawValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl NativeRow for SqliteRow {
    fn column_kind(&self, index: usize) -> Result<(String, NativeKind), sqlx::Error> {
        let declared = self.try_column(index)?.type_info().name().to_string();

        let type_name = if declared == "NULL" {
            let value = self.try_get_raw(index)?;
            if value.is_null() {
                declared
            } else {
                value.type_info().name().to_string()
            }
        } else {
            declared
        };

        let kind = native_kind(&type_name);
        Ok((type_name, kind))
    }

    fn decode(&self, index: usize, target: ScanTarget) -> Result<NativeValue, sqlx::Error> {
        let storage_class = {
            let value = self.try_get_raw(index)?;
            if value.is_null() {
                return Ok(null_value(target));
            }
            value.type_info().name().to_string()
        };

        let raw = match storage_class.as_str() {
            "INTEGER" => RawValue::Int(self.try_get_unchecked::<i64, _>(index)?),
            "REAL" => RawValue::Float(self.try_get_unchecked::<f64, _>(index)?),
            "TEXT" => RawValue::Text(self.try_get_unchecked::<String, _>(index)?),
            "BLOB" => RawValue::Blob(self.try_get_unchecked::<Vec<u8>, _>(index)?),
            _ => RawValue::Null,
        };

        raw.into_target(target).map_err(decode_error)
    }
}

impl RawValue {
    fn describe(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Int(_) => "integer",
            RawValue::Float(_) => "real",
            RawValue::Text(_) => "text",
            RawValue::Blob(_) => "blob",
        }
    }

    fn into_target(self, target: ScanTarget) -> Result<NativeValue, String> {
        let mismatch = |raw: &RawValue| format!("cannot scan {} into {}", raw.describe(), target);

        match (target, self) {
            (target, RawValue::Null) => Ok(null_value(target)),
            (ScanTarget::NullInt64 | ScanTarget::NullInt32 | ScanTarget::NullString, RawValue::Int(v)) => {
                integer_value(Some(v), target)
            }
            (ScanTarget::NullFloat64, RawValue::Float(v)) => Ok(NativeValue::Float64(Some(v))),
            (ScanTarget::NullFloat64, RawValue::Int(v)) => Ok(NativeValue::Float64(Some(v as f64))),
            (ScanTarget::NullString, RawValue::Float(v)) => Ok(NativeValue::String(Some(v.to_string()))),
            (ScanTarget::NullString, RawValue::Text(v)) => Ok(NativeValue::String(Some(v))),
            (ScanTarget::NullBool, RawValue::Int(v)) => Ok(NativeValue::Bool(Some(v != 0))),
            (ScanTarget::NullTime, RawValue::Text(v)) => parse_timestamp(&v)
                .map(|t| NativeValue::Time(Some(t)))
                .ok_or_else(|| format!("cannot parse {:?} as a timestamp", v)),
            // 整数の日時は UNIX 時刻（秒）
            (ScanTarget::NullTime, RawValue::Int(v)) => DateTime::from_timestamp(v, 0)
                .map(|t| NativeValue::Time(Some(t)))
                .ok_or_else(|| format!("unix time {} is out of range", v)),
            (ScanTarget::UniqueIdentifier, RawValue::Blob(v)) => <[u8; 16]>::try_from(v.as_slice())
                .map(|b| NativeValue::UniqueIdentifier(Some(b)))
                .map_err(|_| format!("expected 16 bytes, got {}", v.len())),
            (_, raw) => Err(mismatch(&raw)),
        }
    }
}

/// テキスト表現の時刻を解析
///
/// RFC 3339、`YYYY-MM-DD HH:MM:SS[.f]`（`T` 区切りも可）、`YYYY-MM-DD` を受け付け、
/// タイムゾーンのないものはUTCとみなします。
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|t| t.and_utc())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(date_to_utc)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_names() {
        assert_eq!(native_kind("DATETIME"), NativeKind::NullableTime);
        assert_eq!(native_kind("NUMERIC"), NativeKind::Float64);
        assert_eq!(native_kind("NULL"), NativeKind::Null);
        assert_eq!(native_kind("BLOB"), NativeKind::Bytes);
    }

    #[test]
    fn test_raw_value_into_matching_target() {
        assert_eq!(
            RawValue::Int(7).into_target(ScanTarget::NullInt64).unwrap(),
            NativeValue::Int64(Some(7))
        );
        assert_eq!(
            RawValue::Null.into_target(ScanTarget::NullString).unwrap(),
            NativeValue::String(None)
        );
        assert_eq!(
            RawValue::Int(2).into_target(ScanTarget::NullFloat64).unwrap(),
            NativeValue::Float64(Some(2.0))
        );
        assert_eq!(
            RawValue::Int(1).into_target(ScanTarget::NullBool).unwrap(),
            NativeValue::Bool(Some(true))
        );
    }

    #[test]
    fn test_numbers_in_untyped_text_column() {
        assert_eq!(
            RawValue::Int(3).into_target(ScanTarget::NullString).unwrap(),
            NativeValue::String(Some("3".to_string()))
        );
        assert_eq!(
            RawValue::Float(1.5).into_target(ScanTarget::NullString).unwrap(),
            NativeValue::String(Some("1.5".to_string()))
        );
    }

    #[test]
    fn test_raw_value_shape_mismatch_is_error() {
        let err = RawValue::Text("x".to_string())
            .into_target(ScanTarget::NullInt64)
            .unwrap_err();
        assert!(err.contains("text"));
        assert!(err.contains("nullable int64"));
    }

    #[test]
    fn test_int32_overflow_is_error() {
        assert!(RawValue::Int(i64::MAX)
            .into_target(ScanTarget::NullInt32)
            .is_err());
    }

    #[test]
    fn test_text_timestamp_parsing() {
        for (text, expected) in [
            ("2024-01-02 03:04:05", "2024-01-02T03:04:05Z"),
            ("2024-01-02T03:04:05.123", "2024-01-02T03:04:05Z"),
            ("2024-01-02T05:04:05+02:00", "2024-01-02T03:04:05Z"),
            ("2024-01-02", "2024-01-02T00:00:00Z"),
        ] {
            let t = RawValue::Text(text.to_string())
                .into_target(ScanTarget::NullTime)
                .unwrap();
            assert_eq!(t.into_uniform().as_str(), Some(expected), "{}", text);
        }

        assert!(RawValue::Text("yesterday".to_string())
            .into_target(ScanTarget::NullTime)
            .is_err());
    }

    #[test]
    fn test_integer_timestamp_is_unix_seconds() {
        let t = RawValue::Int(0).into_target(ScanTarget::NullTime).unwrap();
        assert_eq!(t.into_uniform().as_str(), Some("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn test_unique_identifier_requires_sixteen_bytes() {
        assert!(RawValue::Blob(vec![0; 16])
            .into_target(ScanTarget::UniqueIdentifier)
            .is_ok());
        assert!(RawValue::Blob(vec![0; 4])
            .into_target(ScanTarget::UniqueIdentifier)
            .is_err());
    }
}
