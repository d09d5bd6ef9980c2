//! レジストリ設定
//!
//! JSON設定ファイルからの読み込みと検証

use crate::error::{ConfigError, Result};
use crate::file::path::expand_path;
use crate::logging::LogLevel;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 1行あたりの既定最大長（バイト、終端分を含む）
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024;

/// コピー時の既定バッファサイズ（バイト）
pub const DEFAULT_COPY_BUFFER_SIZE: usize = 512;

/// レジストリ設定
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 素のファイル名を解決する基準ディレクトリ（未指定ならカレントディレクトリ）
    pub base_dir: Option<PathBuf>,
    /// 行読み込みの最大長
    pub max_line_length: usize,
    /// コピー用バッファサイズ
    pub copy_buffer_size: usize,
    /// ログレベル（バイナリのみ使用）
    pub log_level: LogLevel,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            copy_buffer_size: DEFAULT_COPY_BUFFER_SIZE,
            log_level: LogLevel::default(),
        }
    }
}

impl RegistryConfig {
    /// 基準ディレクトリを指定して構築
    ///
    /// 相対パスはレジストリが名前を解決する時点のカレントディレクトリ基準になる
    pub fn with_base_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// 行の最大長を変更
    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }

    /// JSON文字列から読み込み
    pub fn from_json(source: &str, origin: &Path) -> Result<Self> {
        let mut config: RegistryConfig =
            serde_json::from_str(source).map_err(|e| ConfigError::InvalidFile {
                path: origin.display().to_string(),
                message: e.to_string(),
            })?;

        if let Some(dir) = config.base_dir.take() {
            config.base_dir = Some(expand_path(&dir)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// JSONファイルから読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&source, path)
    }

    /// 設定値の検証
    pub fn validate(&self) -> Result<()> {
        if self.max_line_length < 2 {
            return Err(ConfigError::InvalidValue {
                key: "max_line_length".to_string(),
                value: self.max_line_length.to_string(),
            }
            .into());
        }
        if self.copy_buffer_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "copy_buffer_size".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
