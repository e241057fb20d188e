// MySQL の行デコード
//
// 整数は符号の有無と幅がカラムごとに異なるため、型検査を省いて
// 64ビットでデコードし、受け皿に合わせて詰め直します。

use super::{
    date_to_utc, decimal_to_f64, decode_error, format_time_of_day, integer_value, mismatch,
    null_value, NativeRow,
};
use crate::core::column::{NativeKind, NativeValue, ScanTarget};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo};

const SIGNED_INTEGERS: &[&str] = &["TINYINT", "SMALLINT", "MEDIUMINT", "INT", "BIGINT"];

const UNSIGNED_INTEGERS: &[&str] = &[
    "TINYINT UNSIGNED",
    "SMALLINT UNSIGNED",
    "MEDIUMINT UNSIGNED",
    "INT UNSIGNED",
    "BIGINT UNSIGNED",
    "YEAR",
];

const TEXTUAL: &[&str] = &[
    "CHAR",
    "VARCHAR",
    "TINYTEXT",
    "TEXT",
    "MEDIUMTEXT",
    "LONGTEXT",
    "ENUM",
    "SET",
];

/// 型名からネイティブ型を判定
pub fn native_kind(type_name: &str) -> NativeKind {
    match type_name {
        "BOOLEAN" => NativeKind::Bool,
        "TINYINT" => NativeKind::Int8,
        "SMALLINT" => NativeKind::Int16,
        "MEDIUMINT" | "INT" => NativeKind::Int32,
        "BIGINT" => NativeKind::Int64,
        "TINYINT UNSIGNED" => NativeKind::UInt8,
        "SMALLINT UNSIGNED" | "YEAR" => NativeKind::UInt16,
        "MEDIUMINT UNSIGNED" | "INT UNSIGNED" => NativeKind::UInt32,
        "BIGINT UNSIGNED" => NativeKind::UInt64,
        "FLOAT" => NativeKind::Float32,
        "DOUBLE" => NativeKind::Float64,
        "DECIMAL" | "JSON" | "TIME" => NativeKind::String,
        "DATE" | "DATETIME" | "TIMESTAMP" => NativeKind::NullableTime,
        "NULL" => NativeKind::Null,
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => NativeKind::Bytes,
        other if TEXTUAL.contains(&other) => NativeKind::String,
        other => NativeKind::Other(other.to_string()),
    }
}

fn is_integer_target(target: ScanTarget) -> bool {
    matches!(
        target,
        ScanTarget::NullInt64 | ScanTarget::NullInt32 | ScanTarget::NullFloat64
    )
}

impl NativeRow for MySqlRow {
    fn column_kind(&self, index: usize) -> Result<(String, NativeKind), sqlx::Error> {
        let type_name = self.try_column(index)?.type_info().name().to_string();
        let kind = native_kind(&type_name);
        Ok((type_name, kind))
    }

    fn decode(&self, index: usize, target: ScanTarget) -> Result<NativeValue, sqlx::Error> {
        let type_name = self.try_column(index)?.type_info().name();

        let value = match (target, type_name) {
            (_, "NULL") => null_value(target),

            (target, name) if is_integer_target(target) && SIGNED_INTEGERS.contains(&name) => {
                integer_value(self.try_get_unchecked::<Option<i64>, _>(index)?, target)
                    .map_err(decode_error)?
            }
            (target, name) if is_integer_target(target) && UNSIGNED_INTEGERS.contains(&name) => {
                let value = self
                    .try_get_unchecked::<Option<u64>, _>(index)?
                    .map(i64::try_from)
                    .transpose()
                    .map_err(|_| decode_error(format!("{} value overflows int64", name)))?;
                integer_value(value, target).map_err(decode_error)?
            }

            (ScanTarget::NullFloat64, "FLOAT") => NativeValue::Float64(
                self.try_get::<Option<f32>, _>(index)?.map(f64::from),
            ),
            (ScanTarget::NullFloat64, "DOUBLE") => {
                NativeValue::Float64(self.try_get::<Option<f64>, _>(index)?)
            }
            (ScanTarget::NullFloat64, "DECIMAL") => NativeValue::Float64(
                self.try_get::<Option<Decimal>, _>(index)?
                    .map(decimal_to_f64)
                    .transpose()
                    .map_err(decode_error)?,
            ),

            (ScanTarget::NullString, "DECIMAL") => NativeValue::String(
                self.try_get::<Option<Decimal>, _>(index)?
                    .map(|v| v.to_string()),
            ),
            (ScanTarget::NullString, "JSON") => NativeValue::String(
                self.try_get::<Option<serde_json::Value>, _>(index)?
                    .map(|v| v.to_string()),
            ),
            (ScanTarget::NullString, "TIME") => NativeValue::String(
                self.try_get::<Option<NaiveTime>, _>(index)?
                    .map(format_time_of_day),
            ),
            (ScanTarget::NullString, name) if TEXTUAL.contains(&name) => {
                NativeValue::String(self.try_get_unchecked::<Option<String>, _>(index)?)
            }

            (ScanTarget::NullBool, "BOOLEAN") => {
                NativeValue::Bool(self.try_get::<Option<bool>, _>(index)?)
            }

            (ScanTarget::NullTime, "DATE") => NativeValue::Time(
                self.try_get::<Option<NaiveDate>, _>(index)?
                    .map(date_to_utc),
            ),
            (ScanTarget::NullTime, "DATETIME") => NativeValue::Time(
                self.try_get::<Option<NaiveDateTime>, _>(index)?
                    .map(|v| v.and_utc()),
            ),
            (ScanTarget::NullTime, "TIMESTAMP") => {
                NativeValue::Time(self.try_get::<Option<DateTime<Utc>>, _>(index)?)
            }

            _ => return Err(mismatch(type_name, target)),
        };

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widths_and_signedness() {
        assert_eq!(native_kind("TINYINT"), NativeKind::Int8);
        assert_eq!(native_kind("INT UNSIGNED"), NativeKind::UInt32);
        assert_eq!(native_kind("BIGINT UNSIGNED"), NativeKind::UInt64);
        assert_eq!(native_kind("YEAR"), NativeKind::UInt16);
    }

    #[test]
    fn test_temporal_and_text_kinds() {
        assert_eq!(native_kind("DATETIME"), NativeKind::NullableTime);
        assert_eq!(native_kind("TIME"), NativeKind::String);
        assert_eq!(native_kind("VARCHAR"), NativeKind::String);
        assert_eq!(native_kind("ENUM"), NativeKind::String);
    }

    #[test]
    fn test_null_column_kind() {
        assert_eq!(native_kind("NULL"), NativeKind::Null);
        assert_eq!(native_kind("GEOMETRY"), NativeKind::Bytes);
    }
}
