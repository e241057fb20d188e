// 適用状態ストア
//
// データベースに適用済みのマイグレーション列をJSONファイルに保存します。
// ファイルがなければ空の列として扱います。

use crate::core::error::IoError;
use crate::core::migration::MigrationSequence;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 適用状態ストア
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// 新しいStateStoreを作成
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 状態ファイルのパス
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 適用済み列を読み込む
    pub fn load(&self) -> Result<MigrationSequence, IoError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "State file not found, assuming empty state");
            return Ok(MigrationSequence::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| IoError::FileRead {
            path: self.path.display().to_string(),
            cause: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| IoError::FileRead {
            path: self.path.display().to_string(),
            cause: e.to_string(),
        })
    }

    /// 適用済み列を保存
    pub fn save(&self, applied: &MigrationSequence) -> Result<(), IoError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| IoError::DirectoryCreate {
                path: parent.display().to_string(),
                cause: e.to_string(),
            })?;
        }

        let content = serde_json::to_string_pretty(applied).map_err(|e| IoError::FileWrite {
            path: self.path.display().to_string(),
            cause: e.to_string(),
        })?;

        fs::write(&self.path, content).map_err(|e| IoError::FileWrite {
            path: self.path.display().to_string(),
            cause: e.to_string(),
        })?;

        debug!(path = %self.path.display(), count = applied.len(), "Saved migration state");
        Ok(())
    }
}
