//! 単一ファイルのレコード
//!
//! 名前とパスの組（識別情報）と、そこから導出されるキャッシュ状態を保持する。
//! 変更操作はすべて開く→操作→閉じるを1回の呼び出しの中で完結させ、
//! 最後にメタデータを読み直す。

use crate::error::{ArgumentError, IoContext, Result};
use crate::file::io::{copy_stream, count_lines, read_line_bounded, HandleSlot, WriteMode};
use crate::file::metadata::{mode_to_string, parse_permission, FileKind, FileStat};
use crate::file::path::{ensure_bare_name, numbered_copy_path, ResolvedPath};
use serde::Serialize;
use std::cell::OnceCell;
use std::fs::{self, File, OpenOptions, Permissions};
use std::io::{BufReader, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// ファイルの識別情報（`path` は常に `/name` で終わる）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    name: String,
    path: PathBuf,
}

impl FileIdentity {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl From<ResolvedPath> for FileIdentity {
    fn from(resolved: ResolvedPath) -> Self {
        Self {
            name: resolved.name,
            path: resolved.path,
        }
    }
}

/// メタデータ一覧出力用のスナップショット
#[derive(Debug, Serialize)]
pub struct RecordSnapshot<'a> {
    pub name: &'a str,
    pub path: &'a Path,
    pub kind: FileKind,
    pub mode: &'a str,
    pub line_count: usize,
    pub char_count: usize,
    pub duplicate_count: u32,
    pub stat: &'a FileStat,
}

/// 管理対象ファイル1件分のレコード
#[derive(Debug)]
pub struct FileRecord {
    identity: FileIdentity,
    handle: HandleSlot,
    stat: FileStat,
    line_count: usize,
    char_count: usize,
    /// 権限の文字列表現（読み直しのたびに破棄）
    mode_string: OnceCell<String>,
    /// 複製先を指定しないコピーの回数
    duplicate_count: u32,
    /// 行単位の内容キャッシュ
    content_cache: Vec<String>,
}

impl FileRecord {
    /// ファイルを開く（存在しなければ空ファイルを作成）
    pub(crate) fn open(resolved: ResolvedPath) -> Result<Self> {
        let mut record = Self {
            identity: FileIdentity::from(resolved),
            handle: HandleSlot::new(),
            stat: FileStat::default(),
            line_count: 0,
            char_count: 0,
            mode_string: OnceCell::new(),
            duplicate_count: 0,
            content_cache: Vec::new(),
        };
        record.load()?;

        log::debug!(
            "loaded {} ({} lines, {} bytes)",
            record.identity.path.display(),
            record.line_count,
            record.char_count
        );
        Ok(record)
    }

    /// メタデータと行数・文字数を読み直す
    pub(crate) fn load(&mut self) -> Result<()> {
        let path = &self.identity.path;
        create_if_missing(path)?;
        self.stat = FileStat::capture(path)?;
        self.mode_string = OnceCell::new();

        // 行数・文字数は走査が成功したときだけ更新する
        let stats = {
            let guard = self.handle.acquire(path, OpenOptions::new().read(true))?;
            count_lines(&*guard).with_path("read", path)?
        };

        self.line_count = stats.line_count;
        self.char_count = stats.char_count;
        Ok(())
    }

    /// 文字列を書き込み、内容キャッシュを破棄して読み直す
    pub(crate) fn write(&mut self, content: &str, mode: WriteMode) -> Result<()> {
        {
            let path = &self.identity.path;
            let mut guard = self.handle.acquire(path, &mode.open_options())?;
            guard.write_all(content.as_bytes()).with_path("write", path)?;
            guard.flush().with_path("write", path)?;
        }

        self.content_cache.clear();
        self.load()
    }

    /// 全行を読み込んでキャッシュする
    ///
    /// 1回の読み込みは改行まで、または `max_line_length - 1` バイトまで。
    /// 行数より先に終端へ達した場合は、そこまでの行を返す。
    pub(crate) fn read(&mut self, max_line_length: usize) -> Result<&[String]> {
        if max_line_length < 2 {
            return Err(ArgumentError::LineLengthTooSmall { length: max_line_length }.into());
        }
        if self.line_count == 0 {
            return Err(ArgumentError::NoLines {
                path: self.identity.path.display().to_string(),
            }
            .into());
        }

        self.content_cache.clear();
        self.content_cache.reserve(self.line_count);

        let path = &self.identity.path;
        let guard = self.handle.acquire(path, OpenOptions::new().read(true))?;
        let mut reader = BufReader::new(&*guard);

        while self.content_cache.len() < self.line_count {
            match read_line_bounded(&mut reader, max_line_length).with_path("read", path)? {
                Some(line) => self.content_cache.push(line),
                None => {
                    log::warn!(
                        "{} ended after {} of {} lines",
                        path.display(),
                        self.content_cache.len(),
                        self.line_count
                    );
                    break;
                }
            }
        }

        drop(reader);
        drop(guard);
        Ok(self.content_cache.as_slice())
    }

    /// 同じディレクトリ内で名前を変更
    pub(crate) fn rename(&mut self, new_name: &str) -> Result<()> {
        ensure_bare_name(new_name)?;
        if new_name == self.identity.name {
            return Err(ArgumentError::SameName { name: new_name.to_string() }.into());
        }

        let new_path = self.identity.path.with_file_name(new_name);
        fs::rename(&self.identity.path, &new_path).with_path("rename", &self.identity.path)?;

        self.identity = FileIdentity {
            name: new_name.to_string(),
            path: new_path,
        };
        self.load()
    }

    /// ファイルを複製し、複製先のパスを返す
    ///
    /// 複製先が未指定なら `<path>_<n>` を使い、複製カウンタを進める
    pub(crate) fn copy(&mut self, destination: Option<&ResolvedPath>, buffer_size: usize) -> Result<PathBuf> {
        let target = match destination {
            Some(resolved) => {
                self.ensure_other_path(&resolved.path)?;
                resolved.path.clone()
            }
            None => {
                self.duplicate_count += 1;
                numbered_copy_path(&self.identity.path, self.duplicate_count)
            }
        };

        self.copy_to(&target, buffer_size)?;
        Ok(target)
    }

    /// 複製してから元ファイルを削除し、複製先を新しい識別情報とする
    pub(crate) fn move_to(&mut self, destination: ResolvedPath, buffer_size: usize) -> Result<()> {
        self.ensure_other_path(&destination.path)?;
        self.copy_to(&destination.path, buffer_size)?;
        fs::remove_file(&self.identity.path).with_path("remove", &self.identity.path)?;

        self.identity = FileIdentity::from(destination);
        self.content_cache.clear();
        self.load()
    }

    /// 指定長に切り詰める（内容キャッシュは次回の読み込みで更新）
    pub(crate) fn truncate(&mut self, length: u64) -> Result<()> {
        {
            let path = &self.identity.path;
            let guard = self.handle.acquire(path, OpenOptions::new().write(true))?;
            guard.set_len(length).with_path("truncate", path)?;
        }
        self.load()
    }

    /// 4桁の8進数文字列で権限を変更
    pub(crate) fn change_mode(&mut self, permission: &str) -> Result<()> {
        let bits = parse_permission(permission)?;
        fs::set_permissions(&self.identity.path, Permissions::from_mode(bits))
            .with_path("chmod", &self.identity.path)?;
        self.load()
    }

    /// ハンドルを閉じてディスク上のファイルを削除
    pub(crate) fn remove(&mut self) -> Result<()> {
        self.handle.release();

        let path = &self.identity.path;
        if fs::symlink_metadata(path).is_ok() {
            fs::remove_file(path).with_path("remove", path)?;
        }
        Ok(())
    }

    fn copy_to(&mut self, target: &Path, buffer_size: usize) -> Result<u64> {
        let destination = File::create(target).with_path("create", target)?;
        let path = &self.identity.path;
        let source = self.handle.acquire(path, OpenOptions::new().read(true))?;

        let copied = copy_stream(&*source, &destination, buffer_size).with_path("copy", target)?;
        log::debug!("copied {} bytes from {} to {}", copied, path.display(), target.display());
        Ok(copied)
    }

    fn ensure_other_path(&self, target: &Path) -> Result<()> {
        if target == self.identity.path {
            return Err(ArgumentError::SameFile {
                path: target.display().to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn identity(&self) -> &FileIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn path(&self) -> &Path {
        &self.identity.path
    }

    pub fn size(&self) -> u64 {
        self.stat.size
    }

    pub fn stat(&self) -> &FileStat {
        &self.stat
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn duplicate_count(&self) -> u32 {
        self.duplicate_count
    }

    /// 直近の読み込みでキャッシュされた行
    pub fn cached_lines(&self) -> &[String] {
        &self.content_cache
    }

    /// ハンドルを保持中か（操作の外では常に false）
    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    /// 権限の9文字表現（例: `rw-r--r--`）
    pub fn mode_string(&self) -> &str {
        self.mode_string.get_or_init(|| mode_to_string(self.stat.mode))
    }

    /// ファイル種別
    pub fn kind(&self) -> FileKind {
        self.stat.kind()
    }

    /// メタデータ一覧
    pub fn snapshot(&self) -> RecordSnapshot<'_> {
        RecordSnapshot {
            name: self.name(),
            path: self.path(),
            kind: self.kind(),
            mode: self.mode_string(),
            line_count: self.line_count,
            char_count: self.char_count,
            duplicate_count: self.duplicate_count,
            stat: &self.stat,
        }
    }
}

fn create_if_missing(path: &Path) -> Result<()> {
    if !path.try_exists().with_path("access", path)? {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_path("create", path)?;
    }
    Ok(())
}
