// SQL Server の行カーソル
//
// tiberiusは結果セットを接続から読み切る必要があるため、
// 最初の `next()` で結果セット全体を取得してから1行ずつ返します。

use super::{
    check_target_count, date_to_utc, decimal_to_f64, format_time_of_day, integer_value,
    null_value, RowCursor,
};
use crate::adapters::sqlserver::SqlServerConnection;
use crate::core::column::{ColumnType, NativeKind, NativeValue, ScanTarget};
use crate::core::error::DatabaseError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use tiberius::error::Error as TdsError;
use tiberius::{ColumnType as TdsType, Row, Uuid};

/// TDSの列型からデータベース型名を判定
pub fn type_name(column_type: TdsType) -> &'static str {
    match column_type {
        TdsType::Null => "NULL",
        TdsType::Bit | TdsType::Bitn => "BIT",
        TdsType::Int1 => "TINYINT",
        TdsType::Int2 => "SMALLINT",
        TdsType::Int4 | TdsType::Intn => "INT",
        TdsType::Int8 => "BIGINT",
        TdsType::Float4 => "REAL",
        TdsType::Float8 | TdsType::Floatn => "FLOAT",
        TdsType::Money => "MONEY",
        TdsType::Money4 => "SMALLMONEY",
        TdsType::Decimaln | TdsType::Numericn => "DECIMAL",
        TdsType::Guid => "UNIQUEIDENTIFIER",
        TdsType::Datetime | TdsType::Datetimen => "DATETIME",
        TdsType::Datetime4 => "SMALLDATETIME",
        TdsType::Datetime2 => "DATETIME2",
        TdsType::Daten => "DATE",
        TdsType::Timen => "TIME",
        TdsType::DatetimeOffsetn => "DATETIMEOFFSET",
        TdsType::BigVarChar => "VARCHAR",
        TdsType::BigChar => "CHAR",
        TdsType::NVarchar => "NVARCHAR",
        TdsType::NChar => "NCHAR",
        TdsType::Text => "TEXT",
        TdsType::NText => "NTEXT",
        TdsType::Xml => "XML",
        TdsType::BigVarBin => "VARBINARY",
        TdsType::BigBinary => "BINARY",
        TdsType::Image => "IMAGE",
        TdsType::Udt => "UDT",
        TdsType::SSVariant => "SQL_VARIANT",
    }
}

/// データベース型名からネイティブ型を判定
pub fn native_kind(type_name: &str) -> NativeKind {
    match type_name {
        "NULL" => NativeKind::Null,
        "BIT" => NativeKind::Bool,
        "TINYINT" => NativeKind::UInt8,
        "SMALLINT" => NativeKind::Int16,
        "INT" => NativeKind::Int32,
        "BIGINT" => NativeKind::Int64,
        "REAL" => NativeKind::Float32,
        "FLOAT" | "MONEY" | "SMALLMONEY" | "DECIMAL" => NativeKind::Float64,
        "UNIQUEIDENTIFIER" | "VARBINARY" | "BINARY" | "IMAGE" => NativeKind::Bytes,
        "DATETIME" | "SMALLDATETIME" | "DATETIME2" | "DATE" | "DATETIMEOFFSET" => {
            NativeKind::NullableTime
        }
        "TIME" | "VARCHAR" | "CHAR" | "NVARCHAR" | "NCHAR" | "TEXT" | "NTEXT" => {
            NativeKind::String
        }
        other => NativeKind::Other(other.to_string()),
    }
}

/// SQL Server の結果セットを読むカーソル
pub struct SqlServerRowCursor<'a> {
    connection: &'a SqlServerConnection,
    sql: &'a str,
    rows: Option<std::vec::IntoIter<Row>>,
    current: Option<Row>,
}

impl<'a> SqlServerRowCursor<'a> {
    /// クエリのカーソルを作成（実行は最初の `next()` まで遅延）
    pub fn query(connection: &'a SqlServerConnection, sql: &'a str) -> Self {
        Self {
            connection,
            sql,
            rows: None,
            current: None,
        }
    }

    fn current(&self) -> Result<&Row, DatabaseError> {
        self.current.as_ref().ok_or_else(|| DatabaseError::Cursor {
            message: "no current row".to_string(),
        })
    }
}

#[async_trait]
impl RowCursor for SqlServerRowCursor<'_> {
    async fn next(&mut self) -> Result<bool, DatabaseError> {
        if self.rows.is_none() {
            let rows = self.connection.fetch_rows(self.sql).await?;
            self.rows = Some(rows.into_iter());
        }
        self.current = self.rows.as_mut().and_then(|rows| rows.next());
        Ok(self.current.is_some())
    }

    fn column_types(&self) -> Result<Vec<ColumnType>, DatabaseError> {
        let row = self.current()?;
        Ok(row
            .columns()
            .iter()
            .map(|column| {
                let name = type_name(column.column_type());
                ColumnType::new(column.name(), name, native_kind(name))
            })
            .collect())
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
                decode(row, index, type_name(column.column_type()), *target).map_err(|message| {
                    DatabaseError::Scan {
                        column: column.name().to_string(),
                        message,
                    }
                })
            })
            .collect()
    }
}

/// 幅の分からない整数（INTN）は広い型から順に試す
fn get_integer(row: &Row, index: usize) -> Result<Option<i64>, TdsError> {
    row.try_get::<i64, _>(index)
        .or_else(|_| row.try_get::<i32, _>(index).map(|v| v.map(i64::from)))
        .or_else(|_| row.try_get::<i16, _>(index).map(|v| v.map(i64::from)))
        .or_else(|_| row.try_get::<u8, _>(index).map(|v| v.map(i64::from)))
}

fn get_float(row: &Row, index: usize) -> Result<Option<f64>, TdsError> {
    row.try_get::<f64, _>(index)
        .or_else(|_| row.try_get::<f32, _>(index).map(|v| v.map(f64::from)))
}

fn decode(row: &Row, index: usize, name: &str, target: ScanTarget) -> Result<NativeValue, String> {
    let value = match (target, name) {
        (_, "NULL") => null_value(target),

        (
            ScanTarget::NullInt64 | ScanTarget::NullInt32 | ScanTarget::NullFloat64,
            "TINYINT" | "SMALLINT" | "INT" | "BIGINT",
        ) => integer_value(get_integer(row, index).map_err(|e| e.to_string())?, target)?,

        (ScanTarget::NullFloat64, "REAL" | "FLOAT" | "MONEY" | "SMALLMONEY") => {
            NativeValue::Float64(get_float(row, index).map_err(|e| e.to_string())?)
        }
        (ScanTarget::NullFloat64, "DECIMAL") => NativeValue::Float64(
            row.try_get::<Decimal, _>(index)
                .map_err(|e| e.to_string())?
                .map(decimal_to_f64)
                .transpose()?,
        ),

        (ScanTarget::NullString, "DECIMAL") => NativeValue::String(
            row.try_get::<Decimal, _>(index)
                .map_err(|e| e.to_string())?
                .map(|v| v.to_string()),
        ),
        // 通貨型は小数4桁固定
        (ScanTarget::NullString, "MONEY" | "SMALLMONEY") => NativeValue::String(
            get_float(row, index)
                .map_err(|e| e.to_string())?
                .map(|v| format!("{:.4}", v)),
        ),
        (ScanTarget::NullString, "UNIQUEIDENTIFIER") => NativeValue::String(
            row.try_get::<Uuid, _>(index)
                .map_err(|e| e.to_string())?
                .map(|v| v.to_string().to_uppercase()),
        ),
        (ScanTarget::NullString, "TIME") => NativeValue::String(
            row.try_get::<NaiveTime, _>(index)
                .map_err(|e| e.to_string())?
                .map(format_time_of_day),
        ),
        (ScanTarget::NullString, "VARCHAR" | "CHAR" | "NVARCHAR" | "NCHAR" | "TEXT" | "NTEXT") => {
            NativeValue::String(
                row.try_get::<&str, _>(index)
                    .map_err(|e| e.to_string())?
                    .map(str::to_string),
            )
        }

        (ScanTarget::NullBool, "BIT") => {
            NativeValue::Bool(row.try_get::<bool, _>(index).map_err(|e| e.to_string())?)
        }

        (ScanTarget::NullTime, "DATETIME" | "SMALLDATETIME" | "DATETIME2") => NativeValue::Time(
            row.try_get::<NaiveDateTime, _>(index)
                .map_err(|e| e.to_string())?
                .map(|v| v.and_utc()),
        ),
        (ScanTarget::NullTime, "DATE") => NativeValue::Time(
            row.try_get::<NaiveDate, _>(index)
                .map_err(|e| e.to_string())?
                .map(date_to_utc),
        ),
        (ScanTarget::NullTime, "DATETIMEOFFSET") => NativeValue::Time(
            row.try_get::<DateTime<Utc>, _>(index)
                .map_err(|e| e.to_string())?,
        ),

        (ScanTarget::UniqueIdentifier, "UNIQUEIDENTIFIER") => NativeValue::UniqueIdentifier(
            row.try_get::<Uuid, _>(index)
                .map_err(|e| e.to_string())?
                .map(|v| v.to_bytes_le()),
        ),

        _ => return Err(format!("cannot scan {} into {}", name, target)),
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_match_override_table() {
        assert_eq!(type_name(TdsType::Guid), "UNIQUEIDENTIFIER");
        assert_eq!(type_name(TdsType::Decimaln), "DECIMAL");
        assert_eq!(type_name(TdsType::Numericn), "DECIMAL");
        assert_eq!(type_name(TdsType::Money), "MONEY");
        assert_eq!(type_name(TdsType::Money4), "SMALLMONEY");
    }

    #[test]
    fn test_nullable_variants_share_names() {
        assert_eq!(type_name(TdsType::Intn), type_name(TdsType::Int4));
        assert_eq!(type_name(TdsType::Bitn), type_name(TdsType::Bit));
        assert_eq!(type_name(TdsType::Floatn), type_name(TdsType::Float8));
        assert_eq!(type_name(TdsType::Datetimen), type_name(TdsType::Datetime));
    }

    #[test]
    fn test_temporal_kinds() {
        for column_type in [
            TdsType::Datetime,
            TdsType::Datetime4,
            TdsType::Datetime2,
            TdsType::Daten,
            TdsType::DatetimeOffsetn,
        ] {
            assert_eq!(
                native_kind(type_name(column_type)),
                NativeKind::NullableTime
            );
        }
        assert_eq!(native_kind(type_name(TdsType::Timen)), NativeKind::String);
    }

    #[test]
    fn test_unmapped_types_keep_their_name() {
        assert_eq!(
            native_kind(type_name(TdsType::Xml)),
            NativeKind::Other("XML".to_string())
        );
    }
}
