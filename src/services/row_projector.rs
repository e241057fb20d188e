// 行射影サービス
//
// カーソルの各行をドライバーに依存しない統一値の行へ変換します。
// 型記述子は最初の行のカラム情報から一度だけ導出し、全行で共有します。

use crate::adapters::cursor::RowCursor;
use crate::core::driver::DriverIdentity;
use crate::core::error::{DatabaseError, ProjectionError};
use crate::core::uniform::{QueryResult, Row, RowType};
use crate::services::type_mapping::{derive_column_projection, ColumnProjection};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// 計算式カラムに対してドライバーが報告するプレースホルダー名
const UNNAMED_COLUMN_PLACEHOLDER: &str = "?column?";

/// 無名カラムの合成名（0始まりの位置）
pub fn synthetic_column_name(index: usize) -> String {
    format!("column{}", index)
}

/// 行射影器
///
/// 前進のみ・再開不可の行列を生成します。カーソルは借用するだけです。
pub struct RowProjector<'c> {
    driver: DriverIdentity,
    cursor: &'c mut dyn RowCursor,
    cancel: Option<CancellationToken>,
    projections: Option<Vec<ColumnProjection>>,
    row_type: RowType,
    finished: bool,
}

impl<'c> RowProjector<'c> {
    /// 新しいRowProjectorを作成
    ///
    /// # Arguments
    ///
    /// * `driver` - オーバーライド表を選択するドライバー種別
    /// * `cursor` - 読み進める行カーソル
    pub fn new(driver: DriverIdentity, cursor: &'c mut dyn RowCursor) -> Self {
        Self {
            driver,
            cursor,
            cancel: None,
            projections: None,
            row_type: RowType::new(),
            finished: false,
        }
    }

    /// キャンセルトークンを設定
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// 導出済みの型記述子（最初の行を読むまでは空）
    pub fn row_type(&self) -> &RowType {
        &self.row_type
    }

    /// 次の行を射影
    ///
    /// # Returns
    ///
    /// 行と型記述子の組。行がなくなれば `None`
    ///
    /// エラーを返した後は終了扱いとなり、以降は `None` を返します。
    pub async fn next_row(&mut self) -> Result<Option<(Row, RowType)>, ProjectionError> {
        if self.finished {
            return Ok(None);
        }

        let result = self.project_next().await;
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    async fn project_next(&mut self) -> Result<Option<(Row, RowType)>, ProjectionError> {
        if !self.advance().await? {
            return Ok(None);
        }

        if self.projections.is_none() {
            self.derive_projections()?;
        }
        let Some(projections) = self.projections.as_ref() else {
            return Ok(None);
        };

        let targets: Vec<_> = projections.iter().map(|p| p.target).collect();
        let values = self.cursor.scan(&targets).map_err(|e| match e {
            DatabaseError::Scan { column, message } => ProjectionError::Scan { column, message },
            other => ProjectionError::Cursor { cause: other },
        })?;

        if values.len() != projections.len() {
            return Err(ProjectionError::Cursor {
                cause: DatabaseError::Cursor {
                    message: format!(
                        "expected {} values, got {}",
                        projections.len(),
                        values.len()
                    ),
                },
            });
        }

        let mut row = Row::new();
        for (projection, value) in projections.iter().zip(values) {
            if value.target() != projection.target {
                return Err(ProjectionError::Scan {
                    column: projection.name.clone(),
                    message: format!(
                        "expected {} but cursor produced {}",
                        projection.target,
                        value.target()
                    ),
                });
            }
            // 同名カラムは後のものが優先
            row.insert(projection.name.clone(), value.into_uniform());
        }

        Ok(Some((row, self.row_type.clone())))
    }

    /// 全行を読み切って結果にまとめる
    pub async fn collect(mut self) -> Result<QueryResult, ProjectionError> {
        let mut rows = Vec::new();
        while let Some((row, _)) = self.next_row().await? {
            rows.push(row);
        }

        debug!(rows = rows.len(), columns = self.row_type.len(), "Projected query result");
        Ok(QueryResult {
            rows,
            row_type: self.row_type,
        })
    }

    async fn advance(&mut self) -> Result<bool, ProjectionError> {
        let next = match &self.cancel {
            Some(cancel) => {
                if cancel.is_cancelled() {
                    return Err(ProjectionError::Cancelled);
                }
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ProjectionError::Cancelled),
                    next = self.cursor.next() => next,
                }
            }
            None => self.cursor.next().await,
        };
        next.map_err(|cause| ProjectionError::Cursor { cause })
    }

    fn derive_projections(&mut self) -> Result<(), ProjectionError> {
        let columns = self
            .cursor
            .column_types()
            .map_err(|e| ProjectionError::ColumnMetadata {
                cause: e.to_string(),
            })?;

        let mut projections = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let mut projection = derive_column_projection(self.driver, column)?;
            if projection.name.is_empty() || projection.name == UNNAMED_COLUMN_PLACEHOLDER {
                projection.name = synthetic_column_name(index);
            }
            self.row_type
                .insert(projection.name.clone(), projection.uniform_type);
            projections.push(projection);
        }

        debug!(driver = %self.driver, row_type = ?self.row_type, "Derived row type");
        self.projections = Some(projections);
        Ok(())
    }
}
