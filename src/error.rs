//! エラーハンドリングシステム
//!
//! レジストリ全体で使用される統一されたエラー型とユーティリティを定義
//! 方針：最初に違反した前提条件で即座に失敗し、再試行はしない

use std::io;
use std::path::Path;
use thiserror::Error;

/// レジストリ全体のエラー型
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    /// 引数エラー
    #[error("Invalid argument: {0}")]
    Argument(#[from] ArgumentError),

    /// 同名ファイルが既に登録済み
    #[error("Name conflict: {name}")]
    NameConflict { name: String },

    /// ファイル操作エラー（OS呼び出しの失敗）
    #[error("File operation failed: {0}")]
    File(#[from] FileError),

    /// スロット領域の確保失敗
    #[error("Cannot grow slot storage to {requested} slots")]
    Capacity { requested: usize },

    /// 設定エラー
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// 引数・状態の検証エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("index {index} is out of range (slots: {slots})")]
    InvalidIndex { index: usize, slots: usize },

    #[error("slot {index} is empty")]
    EmptySlot { index: usize },

    #[error("registry holds no files")]
    EmptyRegistry,

    #[error("name must not be empty")]
    EmptyName,

    #[error("expected a bare file name, got a path: {name}")]
    NotBareName { name: String },

    #[error("expected a path containing a separator: {path}")]
    NotAPath { path: String },

    #[error("invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("new name is the same as the current name: {name}")]
    SameName { name: String },

    #[error("invalid permission string: {mode:?} (expected 4 octal digits)")]
    InvalidMode { mode: String },

    #[error("file has no lines to read: {path}")]
    NoLines { path: String },

    #[error("maximum line length must be at least 2, got {length}")]
    LineLengthTooSmall { length: usize },

    #[error("destination is the source file itself: {path}")]
    SameFile { path: String },
}

/// ファイル操作固有のエラー
#[derive(Error, Debug, Clone)]
pub enum FileError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("IO error during {operation} on {path}: {message}")]
    Io {
        operation: &'static str,
        path: String,
        message: String,
    },
}

impl FileError {
    /// `io::Error` を操作名とパス付きで分類
    pub fn from_io(operation: &'static str, path: &Path, error: &io::Error) -> Self {
        let path = path.display().to_string();
        match error.kind() {
            io::ErrorKind::NotFound => FileError::NotFound { path },
            io::ErrorKind::PermissionDenied => FileError::PermissionDenied { path },
            _ => FileError::Io {
                operation,
                path,
                message: error.to_string(),
            },
        }
    }
}

/// 設定固有のエラー
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("Invalid configuration file {path}: {message}")]
    InvalidFile { path: String, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// エラー分類（呼び出し側が扱う4種別）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidArgument,
    NameConflict,
    OsFailure,
    Capacity,
}

impl RegistryError {
    /// エラーを分類
    pub fn category(&self) -> ErrorCategory {
        match self {
            RegistryError::Argument(_) => ErrorCategory::InvalidArgument,
            RegistryError::NameConflict { .. } => ErrorCategory::NameConflict,
            RegistryError::File(_) => ErrorCategory::OsFailure,
            RegistryError::Capacity { .. } => ErrorCategory::Capacity,
            RegistryError::Config(ConfigError::Unreadable { .. }) => ErrorCategory::OsFailure,
            RegistryError::Config(_) => ErrorCategory::InvalidArgument,
        }
    }
}

/// OSエラーにコンテキストを付与するためのトレイト
pub trait IoContext<T> {
    fn with_path(self, operation: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn with_path(self, operation: &'static str, path: &Path) -> Result<T> {
        self.map_err(|e| {
            log::debug!("{} failed on {}: {}", operation, path.display(), e);
            RegistryError::File(FileError::from_io(operation, path, &e))
        })
    }
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, RegistryError>;
