// マイグレーション読み込みサービス
//
// インライン定義（構造化済みの列）またはディスク上のディレクトリから
// 順序付きのマイグレーション列を生成します。
// - ペアモード: `{prefix}_{name}.up.sql` / `{prefix}_{name}.down.sql`
// - 単一ファイル分割モード: `{prefix}_{name}.sql` を区切り文字列で up / down に分割

use crate::core::error::{ConfigurationError, IoError};
use crate::core::migration::{Migration, MigrationPhase, MigrationSequence};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// shmig 形式の区切り文字列
pub const SHMIG_SPLIT: &str = "-- ==== DOWN ====";

/// ペアモードのファイル名: `{id}.up.sql` / `{id}.down.sql`
static PAIR_FILE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<id>.+)\.(?P<phase>up|down)\.sql$").expect("valid pair file regex")
});

/// ディレクトリ読み込みオプション
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// `--` で始まる行を取り除く
    pub strip_line_comments: bool,
    /// 単一ファイル分割モードの区切り文字列
    pub single_file_split: Option<String>,
}

impl LoadOptions {
    /// ディレクトリ読み込みの既定（コメント除去あり）
    pub fn directory(single_file_split: Option<String>) -> Self {
        Self {
            strip_line_comments: true,
            single_file_split: single_file_split.filter(|marker| !marker.is_empty()),
        }
    }
}

/// マイグレーションの供給元
#[derive(Debug, Clone)]
pub enum MigrationSource {
    /// デコード済みのインライン定義
    Inline(MigrationSequence),
    /// ディレクトリ
    Directory {
        /// ディレクトリパス
        path: PathBuf,
        /// 読み込みオプション
        options: LoadOptions,
    },
}

/// マイグレーション読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct MigrationLoaderService {}

impl MigrationLoaderService {
    /// 新しいMigrationLoaderServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 供給元からマイグレーション列を読み込む
    pub fn load(&self, source: MigrationSource) -> Result<MigrationSequence, ConfigurationError> {
        match source {
            MigrationSource::Inline(migrations) => self.load_inline(migrations),
            MigrationSource::Directory { path, options } => self.load_directory(&path, &options),
        }
    }

    /// インライン定義を検証して返す
    ///
    /// 空ID・重複IDの検出のみを行い、少なくとも1件の定義を要求します。
    pub fn load_inline(
        &self,
        migrations: MigrationSequence,
    ) -> Result<MigrationSequence, ConfigurationError> {
        if migrations.is_empty() {
            return Err(ConfigurationError::NoMigrations);
        }
        migrations.validate()?;
        Ok(migrations)
    }

    /// `{id, up, down}` のリストを記述したYAML/JSONファイルを読み込む
    pub fn load_inline_file(&self, path: &Path) -> Result<MigrationSequence, ConfigurationError> {
        let content = read_file(path)?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let migrations: MigrationSequence = if is_json {
            serde_json::from_str(&content).map_err(|e| ConfigurationError::Parse {
                path: path.display().to_string(),
                cause: e.to_string(),
            })?
        } else {
            serde_saphyr::from_str(&content).map_err(|e| ConfigurationError::Parse {
                path: path.display().to_string(),
                cause: e.to_string(),
            })?
        };

        self.load_inline(migrations)
    }

    /// ディレクトリからマイグレーション列を読み込む
    ///
    /// # Errors
    ///
    /// - ディレクトリが存在しない場合
    /// - up / down の片方しかない場合（ペアモード）
    /// - 区切り文字列がちょうど1回現れない場合（単一ファイル分割モード）
    /// - ファイル名から導出したIDが重複した場合
    pub fn load_directory(
        &self,
        dir: &Path,
        options: &LoadOptions,
    ) -> Result<MigrationSequence, ConfigurationError> {
        let files = scan_sql_files(dir)?;
        debug!(dir = %dir.display(), count = files.len(), "Scanned migration directory");

        let mut migrations = match options.single_file_split.as_deref() {
            Some(marker) => load_split_files(dir, &files, marker, options)?,
            None => load_paired_files(dir, &files, options)?,
        };

        migrations.sort_by(|a, b| {
            ordering_prefix(a.id())
                .cmp(ordering_prefix(b.id()))
                .then_with(|| a.id().cmp(b.id()))
        });

        let sequence = MigrationSequence::from(migrations);
        sequence.validate()?;
        debug!(ids = ?sequence.ids(), "Loaded migrations from directory");
        Ok(sequence)
    }
}

/// IDの順序付け接頭辞（最初の `_` より前）
pub fn ordering_prefix(id: &str) -> &str {
    id.split('_').next().unwrap_or(id)
}

/// 行単位で `--` コメントを取り除く
pub fn strip_line_comments(statement: &str) -> String {
    statement
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn prepare_statement(statement: &str, options: &LoadOptions) -> String {
    if options.strip_line_comments {
        strip_line_comments(statement).trim().to_string()
    } else {
        statement.trim().to_string()
    }
}

/// ディレクトリ内の `.sql` ファイル名を昇順で列挙
fn scan_sql_files(dir: &Path) -> Result<Vec<String>, ConfigurationError> {
    if !dir.exists() {
        return Err(IoError::FileNotFound {
            path: dir.display().to_string(),
        }
        .into());
    }
    if !dir.is_dir() {
        return Err(IoError::NotADirectory {
            path: dir.display().to_string(),
        }
        .into());
    }

    let entries = fs::read_dir(dir).map_err(|e| IoError::DirectoryRead {
        path: dir.display().to_string(),
        cause: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IoError::DirectoryRead {
            path: dir.display().to_string(),
            cause: e.to_string(),
        })?;
        let path = entry.path();

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if name.starts_with('.') || path.is_dir() {
            debug!(name, "Skipping directory entry");
            continue;
        }

        if !has_sql_extension(name) {
            debug!(name, "Skipping non-SQL file");
            continue;
        }

        files.push(name.to_string());
    }

    // ディレクトリの列挙順に依存しないよう整列
    files.sort();
    Ok(files)
}

fn has_sql_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
}

fn read_file(path: &Path) -> Result<String, ConfigurationError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    fs::read_to_string(path).map_err(|e| {
        IoError::FileRead {
            path: path.display().to_string(),
            cause: e.to_string(),
        }
        .into()
    })
}

#[derive(Default)]
struct PairedFiles {
    up: Option<(String, String)>,
    down: Option<(String, String)>,
}

fn load_paired_files(
    dir: &Path,
    files: &[String],
    options: &LoadOptions,
) -> Result<Vec<Migration>, ConfigurationError> {
    let mut pairs: BTreeMap<String, PairedFiles> = BTreeMap::new();

    for name in files {
        let Some(captures) = PAIR_FILE_REGEX.captures(name) else {
            warn!(
                file = %name,
                "Skipping file: does not match expected format '{{id}}.up.sql' or '{{id}}.down.sql'"
            );
            continue;
        };

        let id = captures["id"].to_string();
        let phase = if captures["phase"].eq_ignore_ascii_case("up") {
            MigrationPhase::Up
        } else {
            MigrationPhase::Down
        };

        let content = read_file(&dir.join(name))?;
        let entry = pairs.entry(id.clone()).or_default();
        let slot = match phase {
            MigrationPhase::Up => &mut entry.up,
            MigrationPhase::Down => &mut entry.down,
        };

        if let Some((existing, _)) = slot {
            return Err(ConfigurationError::DuplicateId {
                id,
                first: existing.clone(),
                second: name.clone(),
            });
        }
        *slot = Some((name.clone(), content));
    }

    pairs
        .into_iter()
        .map(|(id, files)| match (files.up, files.down) {
            (Some((_, up)), Some((_, down))) => Ok(Migration::new(
                id,
                prepare_statement(&up, options),
                prepare_statement(&down, options),
            )),
            (Some((file, _)), None) => Err(ConfigurationError::MissingPair {
                file,
                missing: MigrationPhase::Down,
            }),
            (None, Some((file, _))) => Err(ConfigurationError::MissingPair {
                file,
                missing: MigrationPhase::Up,
            }),
            (None, None) => unreachable!("pair entries are only created with a file"),
        })
        .collect()
}

fn load_split_files(
    dir: &Path,
    files: &[String],
    marker: &str,
    options: &LoadOptions,
) -> Result<Vec<Migration>, ConfigurationError> {
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut migrations = Vec::with_capacity(files.len());

    for name in files {
        // 拡張子（大文字小文字を問わない）を除いた部分がID
        let id = name[..name.len() - ".sql".len()].to_string();

        if let Some(first) = seen.insert(id.clone(), name.clone()) {
            return Err(ConfigurationError::DuplicateId {
                id,
                first,
                second: name.clone(),
            });
        }

        let content = read_file(&dir.join(name))?;
        let occurrences = content.matches(marker).count();
        let Some((up, down)) = content.split_once(marker).filter(|_| occurrences == 1) else {
            return Err(ConfigurationError::SplitMarker {
                file: name.clone(),
                marker: marker.to_string(),
                occurrences,
            });
        };

        migrations.push(Migration::new(
            id,
            prepare_statement(up, options),
            prepare_statement(down, options),
        ));
    }

    Ok(migrations)
}
