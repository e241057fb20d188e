// 行カーソルアダプター
//
// 結果セットを1行ずつ読み進める能力の抽象化と、ドライバー別の実装を提供します。
// PostgreSQL / MySQL / SQLite はSQLxのネイティブ行、SQL Server はtiberiusの行を使い、
// データベースが報告する型名をそのまま返します。

pub mod mysql;
pub mod postgres;
pub mod sqlite;
pub mod sqlserver;

pub use sqlserver::SqlServerRowCursor;

use crate::core::column::{ColumnType, NativeKind, NativeValue, ScanTarget};
use crate::core::error::DatabaseError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futures::stream::BoxStream;
use futures::TryStreamExt;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::{Column, Row};

/// 行カーソル能力
///
/// 前進のみで再開はできません。
#[async_trait]
pub trait RowCursor: Send {
    /// 次の行へ進む。行がなければ `false`
    async fn next(&mut self) -> Result<bool, DatabaseError>;

    /// 現在行のカラム情報
    fn column_types(&self) -> Result<Vec<ColumnType>, DatabaseError>;

    /// 現在行の全カラムを受け皿へスキャン
    ///
    /// 戻り値の各要素は対応する `targets` の受け皿と同じ形です。
    fn scan(&self, targets: &[ScanTarget]) -> Result<Vec<NativeValue>, DatabaseError>;
}

/// SQLxの行に対するカラム型判定とデコード
pub trait NativeRow: Row {
    /// カラムの型名とネイティブ型
    fn column_kind(&self, index: usize) -> Result<(String, NativeKind), sqlx::Error>;

    /// 受け皿の形に合わせて値をデコード
    fn decode(&self, index: usize, target: ScanTarget) -> Result<NativeValue, sqlx::Error>;
}

/// SQLxの行ストリームを使ったカーソル
pub struct SqlxRowCursor<'a, R> {
    rows: BoxStream<'a, Result<R, sqlx::Error>>,
    current: Option<R>,
}

impl<'a, R: NativeRow> SqlxRowCursor<'a, R> {
    /// 行ストリームからカーソルを作成
    pub fn new(rows: BoxStream<'a, Result<R, sqlx::Error>>) -> Self {
        Self {
            rows,
            current: None,
        }
    }

    fn current(&self) -> Result<&R, DatabaseError> {
        self.current.as_ref().ok_or_else(|| DatabaseError::Cursor {
            message: "no current row".to_string(),
        })
    }
}

#[async_trait]
impl<R: NativeRow> RowCursor for SqlxRowCursor<'_, R> {
    async fn next(&mut self) -> Result<bool, DatabaseError> {
        self.current = self
            .rows
            .try_next()
            .await
            .map_err(|e| DatabaseError::Cursor {
                message: e.to_string(),
            })?;
        Ok(self.current.is_some())
    }

    fn column_types(&self) -> Result<Vec<ColumnType>, DatabaseError> {
        let row = self.current()?;
        row.columns()
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let (type_name, kind) =
                    row.column_kind(index)
                        .map_err(|e| DatabaseError::Cursor {
                            message: e.to_string(),
                        })?;
                Ok(ColumnType::new(column.name(), type_name, kind))
            })
            .collect()
    }

    fn scan(&self, targets: &[ScanTarget]) -> Result<Vec<NativeValue>, DatabaseError> {
        let row = self.current()?;
        let columns = row.columns();
        check_target_count(columns.len(), targets.len())?;

        columns
            .iter()
            .zip(targets)
            .enumerate()
            .map(|(index, (column, target))| {
                row.decode(index, *target)
                    .map_err(|e| DatabaseError::Scan {
                        column: column.name().to_string(),
                        message: e.to_string(),
                    })
            })
            .collect()
    }
}

pub(crate) fn check_target_count(columns: usize, targets: usize) -> Result<(), DatabaseError> {
    if columns == targets {
        return Ok(());
    }
    Err(DatabaseError::Cursor {
        message: format!("expected {} scan targets, got {}", columns, targets),
    })
}

/// 受け皿と同じ形の NULL
pub(crate) fn null_value(target: ScanTarget) -> NativeValue {
    match target {
        ScanTarget::NullInt64 => NativeValue::Int64(None),
        ScanTarget::NullInt32 => NativeValue::Int32(None),
        ScanTarget::NullFloat64 => NativeValue::Float64(None),
        ScanTarget::NullString => NativeValue::String(None),
        ScanTarget::NullBool => NativeValue::Bool(None),
        ScanTarget::NullTime => NativeValue::Time(None),
        ScanTarget::UniqueIdentifier => NativeValue::UniqueIdentifier(None),
    }
}

/// 整数を数値系の受け皿へ
pub(crate) fn integer_value(value: Option<i64>, target: ScanTarget) -> Result<NativeValue, String> {
    match target {
        ScanTarget::NullInt64 => Ok(NativeValue::Int64(value)),
        ScanTarget::NullInt32 => value
            .map(i32::try_from)
            .transpose()
            .map(NativeValue::Int32)
            .map_err(|_| format!("value {:?} overflows {}", value, target)),
        ScanTarget::NullFloat64 => Ok(NativeValue::Float64(value.map(|v| v as f64))),
        ScanTarget::NullString => Ok(NativeValue::String(value.map(|v| v.to_string()))),
        _ => Err(format!("cannot scan integer into {}", target)),
    }
}

/// 日付をその日の 00:00:00 UTC へ
pub(crate) fn date_to_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// 時刻（日付なし）のテキスト表現
pub(crate) fn format_time_of_day(time: NaiveTime) -> String {
    time.format("%H:%M:%S%.f").to_string()
}

pub(crate) fn decimal_to_f64(value: Decimal) -> Result<f64, String> {
    value
        .to_f64()
        .ok_or_else(|| format!("decimal {} is out of float64 range", value))
}

/// 受け皿に対応しない型のデコードエラー
pub(crate) fn mismatch(type_name: &str, target: ScanTarget) -> sqlx::Error {
    decode_error(format!("cannot scan {} into {}", type_name, target))
}

pub(crate) fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_value_matches_target_shape() {
        for target in [
            ScanTarget::NullInt64,
            ScanTarget::NullInt32,
            ScanTarget::NullFloat64,
            ScanTarget::NullString,
            ScanTarget::NullBool,
            ScanTarget::NullTime,
            ScanTarget::UniqueIdentifier,
        ] {
            assert_eq!(null_value(target).target(), target);
        }
    }

    #[test]
    fn test_integer_value_into_numeric_targets() {
        assert_eq!(
            integer_value(Some(7), ScanTarget::NullInt64).unwrap(),
            NativeValue::Int64(Some(7))
        );
        assert_eq!(
            integer_value(Some(2), ScanTarget::NullFloat64).unwrap(),
            NativeValue::Float64(Some(2.0))
        );
        assert_eq!(
            integer_value(None, ScanTarget::NullInt32).unwrap(),
            NativeValue::Int32(None)
        );
        assert!(integer_value(Some(i64::MAX), ScanTarget::NullInt32).is_err());
        assert!(integer_value(Some(1), ScanTarget::NullTime).is_err());
    }

    #[test]
    fn test_date_is_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(
            date_to_utc(date).to_rfc3339(),
            "2024-01-02T00:00:00+00:00"
        );
    }

    #[test]
    fn test_time_of_day_format() {
        let time = NaiveTime::from_hms_milli_opt(13, 4, 5, 250).unwrap();
        assert_eq!(format_time_of_day(time), "13:04:05.250");
        let time = NaiveTime::from_hms_opt(1, 2, 3).unwrap();
        assert_eq!(format_time_of_day(time), "01:02:03");
    }
}
