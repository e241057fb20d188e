// PostgreSQL の行デコード

use super::{
    date_to_utc, decimal_to_f64, decode_error, format_time_of_day, integer_value, mismatch,
    null_value, NativeRow,
};
use crate::core::column::{NativeKind, NativeValue, ScanTarget};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::types::PgMoney;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};
use uuid::Uuid;

/// 通貨型の小数桁（lc_monetary が C / en_US の場合）
const MONEY_FRACTION_DIGITS: u32 = 2;

/// 型名からネイティブ型を判定
pub fn native_kind(type_name: &str) -> NativeKind {
    match type_name {
        "BOOL" => NativeKind::Bool,
        "INT2" => NativeKind::Int16,
        "INT4" => NativeKind::Int32,
        "INT8" => NativeKind::Int64,
        "FLOAT4" => NativeKind::Float32,
        "FLOAT8" | "NUMERIC" => NativeKind::Float64,
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" | "UNKNOWN" | "UUID" | "JSON"
        | "JSONB" | "MONEY" | "TIME" => NativeKind::String,
        "TIMESTAMPTZ" | "TIMESTAMP" | "DATE" => NativeKind::NullableTime,
        "BYTEA" => NativeKind::Bytes,
        "VOID" => NativeKind::Null,
        other => NativeKind::Other(other.to_string()),
    }
}

impl NativeRow for PgRow {
    fn column_kind(&self, index: usize) -> Result<(String, NativeKind), sqlx::Error> {
        let type_name = self.try_column(index)?.type_info().name().to_string();
        let kind = native_kind(&type_name);
        Ok((type_name, kind))
    }

    fn decode(&self, index: usize, target: ScanTarget) -> Result<NativeValue, sqlx::Error> {
        let type_name = self.try_column(index)?.type_info().name();

        let value = match (target, type_name) {
            (ScanTarget::NullInt64 | ScanTarget::NullInt32 | ScanTarget::NullFloat64, "INT2") => {
                integer_value(self.try_get::<Option<i16>, _>(index)?.map(i64::from), target)
                    .map_err(decode_error)?
            }
            (ScanTarget::NullInt64 | ScanTarget::NullInt32 | ScanTarget::NullFloat64, "INT4") => {
                integer_value(self.try_get::<Option<i32>, _>(index)?.map(i64::from), target)
                    .map_err(decode_error)?
            }
            (ScanTarget::NullInt64 | ScanTarget::NullInt32 | ScanTarget::NullFloat64, "INT8") => {
                integer_value(self.try_get::<Option<i64>, _>(index)?, target)
                    .map_err(decode_error)?
            }

            (ScanTarget::NullFloat64, "FLOAT4") => NativeValue::Float64(
                self.try_get::<Option<f32>, _>(index)?.map(f64::from),
            ),
            (ScanTarget::NullFloat64, "FLOAT8") => {
                NativeValue::Float64(self.try_get::<Option<f64>, _>(index)?)
            }
            (ScanTarget::NullFloat64, "NUMERIC") => NativeValue::Float64(
                self.try_get::<Option<Decimal>, _>(index)?
                    .map(decimal_to_f64)
                    .transpose()
                    .map_err(decode_error)?,
            ),

            (ScanTarget::NullString, "NUMERIC") => NativeValue::String(
                self.try_get::<Option<Decimal>, _>(index)?
                    .map(|v| v.to_string()),
            ),
            (ScanTarget::NullString, "MONEY") => NativeValue::String(
                self.try_get::<Option<PgMoney>, _>(index)?
                    .map(|v| v.to_decimal(MONEY_FRACTION_DIGITS).to_string()),
            ),
            (ScanTarget::NullString, "UUID") => {
                NativeValue::String(self.try_get::<Option<Uuid>, _>(index)?.map(|v| v.to_string()))
            }
            (ScanTarget::NullString, "JSON" | "JSONB") => NativeValue::String(
                self.try_get::<Option<serde_json::Value>, _>(index)?
                    .map(|v| v.to_string()),
            ),
            (ScanTarget::NullString, "TIME") => NativeValue::String(
                self.try_get::<Option<NaiveTime>, _>(index)?
                    .map(format_time_of_day),
            ),
            (ScanTarget::NullString, "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" | "UNKNOWN") => {
                NativeValue::String(self.try_get::<Option<String>, _>(index)?)
            }

            (ScanTarget::NullBool, "BOOL") => NativeValue::Bool(self.try_get::<Option<bool>, _>(index)?),

            (ScanTarget::NullTime, "TIMESTAMPTZ") => {
                NativeValue::Time(self.try_get::<Option<DateTime<Utc>>, _>(index)?)
            }
            (ScanTarget::NullTime, "TIMESTAMP") => NativeValue::Time(
                self.try_get::<Option<NaiveDateTime>, _>(index)?
                    .map(|v| v.and_utc()),
            ),
            (ScanTarget::NullTime, "DATE") => NativeValue::Time(
                self.try_get::<Option<NaiveDate>, _>(index)?
                    .map(date_to_utc),
            ),

            (ScanTarget::UniqueIdentifier, "UUID") => NativeValue::UniqueIdentifier(
                self.try_get::<Option<Uuid>, _>(index)?
                    .map(|v| v.to_bytes_le()),
            ),

            (_, "VOID") => null_value(target),
            _ => return Err(mismatch(type_name, target)),
        };

        Ok(value)
    }
}
