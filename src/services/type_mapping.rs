// 型マッピングサービス
//
// カーソルが報告するカラム情報から、統一型とスキャン受け皿を導出します。
// 優先順位:
// 1. ドライバー別オーバーライド表（ドライバー, DB型名）
// 2. null 許容ネイティブ型の直接対応
// 3. 非 null 許容プリミティブ型からの対応（型のない NULL は文字列）
// 4. いずれにも当てはまらなければエラー

use crate::core::column::{ColumnType, NativeKind, ScanTarget};
use crate::core::driver::DriverIdentity;
use crate::core::error::ProjectionError;
use crate::core::uniform::UniformType;

/// カラムごとの射影情報
///
/// 1回のクエリ実行の間だけ使われます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnProjection {
    /// 行オブジェクトでのカラム名
    pub name: String,
    /// 宣言する統一型
    pub uniform_type: UniformType,
    /// 値を受け取るスキャン受け皿
    pub target: ScanTarget,
}

/// ドライバー別オーバーライド表
///
/// 固定小数点・通貨型は精度を失わないよう文字列、
/// 日時型は固定テキスト表現の文字列として扱います。
const OVERRIDES: &[(DriverIdentity, &str, UniformType, ScanTarget)] = &[
    // SQL Server
    (
        DriverIdentity::SqlServer,
        "UNIQUEIDENTIFIER",
        UniformType::String,
        ScanTarget::UniqueIdentifier,
    ),
    (DriverIdentity::SqlServer, "DECIMAL", UniformType::String, ScanTarget::NullString),
    (DriverIdentity::SqlServer, "MONEY", UniformType::String, ScanTarget::NullString),
    (DriverIdentity::SqlServer, "SMALLMONEY", UniformType::String, ScanTarget::NullString),
    // MySQL
    (DriverIdentity::MySql, "YEAR", UniformType::Number, ScanTarget::NullInt32),
    (DriverIdentity::MySql, "VARCHAR", UniformType::String, ScanTarget::NullString),
    (DriverIdentity::MySql, "DECIMAL", UniformType::String, ScanTarget::NullString),
    (DriverIdentity::MySql, "TIME", UniformType::String, ScanTarget::NullString),
    (DriverIdentity::MySql, "JSON", UniformType::String, ScanTarget::NullString),
    (DriverIdentity::MySql, "DATE", UniformType::String, ScanTarget::NullTime),
    (DriverIdentity::MySql, "DATETIME", UniformType::String, ScanTarget::NullTime),
    // PostgreSQL（MONEY は型名の代わりに OID 790 が報告されることがある）
    (DriverIdentity::Postgres, "MONEY", UniformType::String, ScanTarget::NullString),
    (DriverIdentity::Postgres, "790", UniformType::String, ScanTarget::NullString),
    (DriverIdentity::Postgres, "TIMESTAMPTZ", UniformType::String, ScanTarget::NullTime),
    (DriverIdentity::Postgres, "TIMESTAMP", UniformType::String, ScanTarget::NullTime),
    (DriverIdentity::Postgres, "DATE", UniformType::String, ScanTarget::NullTime),
];

/// オーバーライド表を検索（型名は大文字小文字を区別しない）
pub fn lookup_override(
    driver: DriverIdentity,
    database_type_name: &str,
) -> Option<(UniformType, ScanTarget)> {
    OVERRIDES
        .iter()
        .find(|(d, name, _, _)| *d == driver && name.eq_ignore_ascii_case(database_type_name))
        .map(|(_, _, uniform_type, target)| (*uniform_type, *target))
}

/// ネイティブ型から統一型とスキャン受け皿を導出
pub fn native_projection(kind: &NativeKind) -> Option<(UniformType, ScanTarget)> {
    let projection = match kind {
        NativeKind::NullableInt64 => (UniformType::Number, ScanTarget::NullInt64),
        NativeKind::NullableInt32 => (UniformType::Number, ScanTarget::NullInt32),
        NativeKind::NullableFloat64 => (UniformType::Number, ScanTarget::NullFloat64),
        NativeKind::NullableString => (UniformType::String, ScanTarget::NullString),
        NativeKind::NullableBool => (UniformType::Bool, ScanTarget::NullBool),
        NativeKind::NullableTime => (UniformType::String, ScanTarget::NullTime),

        NativeKind::Int8
        | NativeKind::Int16
        | NativeKind::Int32
        | NativeKind::Int64
        | NativeKind::UInt8
        | NativeKind::UInt16
        | NativeKind::UInt32
        | NativeKind::UInt64 => (UniformType::Number, ScanTarget::NullInt64),
        NativeKind::Float32 | NativeKind::Float64 => (UniformType::Number, ScanTarget::NullFloat64),
        NativeKind::String => (UniformType::String, ScanTarget::NullString),
        NativeKind::Bool => (UniformType::Bool, ScanTarget::NullBool),
        // 型のない NULL は null 許容の文字列として扱う
        NativeKind::Null => (UniformType::String, ScanTarget::NullString),

        NativeKind::Bytes | NativeKind::Time | NativeKind::Other(_) => return None,
    };
    Some(projection)
}

/// カラムの射影情報を導出
///
/// # Arguments
///
/// * `driver` - ドライバー種別
/// * `column` - カーソルが報告したカラム情報
///
/// # Errors
///
/// どの規則にも当てはまらない場合、カラム名・DB型名・ネイティブ型を含む
/// `ProjectionError::UnsupportedType` を返します。
pub fn derive_column_projection(
    driver: DriverIdentity,
    column: &ColumnType,
) -> Result<ColumnProjection, ProjectionError> {
    let (uniform_type, target) = lookup_override(driver, &column.database_type_name)
        .or_else(|| native_projection(&column.native_kind))
        .ok_or_else(|| ProjectionError::UnsupportedType {
            column: column.name.clone(),
            database_type: column.database_type_name.clone(),
            native_kind: column.native_kind.to_string(),
        })?;

    Ok(ColumnProjection {
        name: column.name.clone(),
        uniform_type,
        target,
    })
}
