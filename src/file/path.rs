//! パス処理ユーティリティ
//!
//! 素のファイル名とパスの判別、パスの正規化・展開・分解

use crate::error::{ArgumentError, IoContext, Result};
use std::env;
use std::path::{Component, Path, PathBuf};

/// パス区切り文字
pub const PATH_SEPARATOR: char = '/';

/// パス処理のトレイト
pub trait PathProcessor {
    /// パスを正規化（. や .. を解決）
    fn normalize_path<P: AsRef<Path>>(path: P) -> Result<PathBuf>;

    /// ホームディレクトリを展開（~ → /home/user）
    fn expand_home<P: AsRef<Path>>(path: P) -> Result<PathBuf>;

    /// 環境変数を展開（$VAR → 値）
    fn expand_env<P: AsRef<Path>>(path: P) -> Result<PathBuf>;

    /// 相対パスを基準ディレクトリからの絶対パスに変換
    fn to_absolute<P: AsRef<Path>>(path: P, base: &Path) -> PathBuf;
}

/// パス処理の実装
pub struct DefaultPathProcessor;

impl PathProcessor for DefaultPathProcessor {
    fn normalize_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        let mut components = Vec::new();

        for component in path.components() {
            match component {
                Component::CurDir => continue,
                Component::ParentDir => match components.last() {
                    Some(Component::Normal(_)) => {
                        components.pop();
                    }
                    _ => {
                        return Err(ArgumentError::InvalidPath {
                            path: path.display().to_string(),
                            reason: "parent reference above the root".to_string(),
                        }
                        .into());
                    }
                },
                _ => components.push(component),
            }
        }

        Ok(components.iter().collect())
    }

    fn expand_home<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy();

        if !path_str.starts_with('~') {
            return Ok(path.to_path_buf());
        }

        let home_dir = dirs::home_dir().ok_or_else(|| ArgumentError::InvalidPath {
            path: path_str.to_string(),
            reason: "home directory is unknown".to_string(),
        })?;

        if path_str == "~" {
            Ok(home_dir)
        } else if let Some(rest) = path_str.strip_prefix("~/") {
            Ok(home_dir.join(rest))
        } else {
            // ~user形式は未サポート
            Err(ArgumentError::InvalidPath {
                path: path_str.to_string(),
                reason: "~user expansion is not supported".to_string(),
            }
            .into())
        }
    }

    fn expand_env<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        match shellexpand::env(&path_str) {
            Ok(expanded) => Ok(PathBuf::from(expanded.as_ref())),
            Err(e) => Err(ArgumentError::InvalidPath {
                path: path_str.clone(),
                reason: e.to_string(),
            }
            .into()),
        }
    }

    fn to_absolute<P: AsRef<Path>>(path: P, base: &Path) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        }
    }
}

/// 名前とパスの組（`path` は常に `/name` で終わる）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub name: String,
    pub path: PathBuf,
}

/// 区切り文字を含まない名前かどうか
pub fn is_bare_name(input: &str) -> bool {
    !input.contains(PATH_SEPARATOR)
}

/// 素のファイル名であることを検証
pub fn ensure_bare_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ArgumentError::EmptyName.into());
    }
    if !is_bare_name(name) {
        return Err(ArgumentError::NotBareName { name: name.to_string() }.into());
    }
    Ok(())
}

/// 現在のディレクトリを取得
pub fn current_dir() -> Result<PathBuf> {
    env::current_dir().with_path("getcwd", Path::new("."))
}

/// 名前またはパスを解決
///
/// 素の名前なら `base` と連結し、パスなら展開・正規化して最後の要素を名前とする
pub fn resolve(input: &str, base: &Path) -> Result<ResolvedPath> {
    if input.is_empty() {
        return Err(ArgumentError::EmptyName.into());
    }
    if input.ends_with(PATH_SEPARATOR) {
        return Err(ArgumentError::InvalidPath {
            path: input.to_string(),
            reason: "no file name after the last separator".to_string(),
        }
        .into());
    }

    if is_bare_name(input) && !input.starts_with('~') && !input.starts_with('$') {
        return Ok(ResolvedPath {
            name: input.to_string(),
            path: base.join(input),
        });
    }

    let path = expand_path_in(input, base)?;
    split_path(&path)
}

/// パスを名前とパスの組に分解
pub fn split_path(path: &Path) -> Result<ResolvedPath> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ArgumentError::InvalidPath {
            path: path.display().to_string(),
            reason: "no file name after the last separator".to_string(),
        })?;

    Ok(ResolvedPath {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// 基準ディレクトリを指定してパスを展開
pub fn expand_path_in<P: AsRef<Path>>(path: P, base: &Path) -> Result<PathBuf> {
    let expanded = DefaultPathProcessor::expand_home(path)?;
    let expanded = DefaultPathProcessor::expand_env(expanded)?;
    let absolute = DefaultPathProcessor::to_absolute(expanded, base);
    DefaultPathProcessor::normalize_path(absolute)
}

/// パス展開の便利関数（カレントディレクトリ基準）
pub fn expand_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    expand_path_in(path, &current_dir()?)
}

/// パス正規化の便利関数
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    DefaultPathProcessor::normalize_path(path)
}

/// 連番付きの複製先パスを生成（`/dir/a.txt` → `/dir/a.txt_2`）
pub fn numbered_copy_path(path: &Path, number: u32) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(format!("_{}", number));
    PathBuf::from(raw)
}
