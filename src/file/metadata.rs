//! ファイルメタデータ管理
//!
//! stat相当のスナップショット、ファイル種別の判定、権限ビットと文字列表現の相互変換

use crate::error::{ArgumentError, IoContext, Result};
use serde::Serialize;
use std::fmt;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// ファイル種別ビットのマスク
pub const S_IFMT: u32 = 0o170000;
pub const S_IFSOCK: u32 = 0o140000;
pub const S_IFLNK: u32 = 0o120000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFBLK: u32 = 0o060000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFCHR: u32 = 0o020000;
pub const S_IFIFO: u32 = 0o010000;

/// rwx×3 の権限ビット
pub const PERMISSION_BITS: u32 = 0o777;

/// ファイル種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileKind {
    Directory,
    Regular,
    CharDevice,
    BlockDevice,
    Pipe,
    Socket,
    SymbolicLink,
    Unknown,
}

impl FileKind {
    /// モードの種別ビットから判定
    pub fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            S_IFDIR => FileKind::Directory,
            S_IFREG => FileKind::Regular,
            S_IFCHR => FileKind::CharDevice,
            S_IFBLK => FileKind::BlockDevice,
            S_IFIFO => FileKind::Pipe,
            S_IFSOCK => FileKind::Socket,
            S_IFLNK => FileKind::SymbolicLink,
            _ => FileKind::Unknown,
        }
    }

    /// `ls -l` 形式の先頭文字
    pub fn type_char(self) -> char {
        match self {
            FileKind::Directory => 'd',
            FileKind::Regular => '-',
            FileKind::CharDevice => 'c',
            FileKind::BlockDevice => 'b',
            FileKind::Pipe => 'p',
            FileKind::Socket => 's',
            FileKind::SymbolicLink => 'l',
            FileKind::Unknown => '?',
        }
    }
}

/// 権限ビットを9文字のrwx表現に変換（所有者→グループ→その他、上位ビットから）
pub fn mode_to_string(mode: u32) -> String {
    const SYMBOLS: [char; 3] = ['r', 'w', 'x'];

    (0..9)
        .map(|i| {
            let bit = 1 << (8 - i);
            if mode & bit != 0 {
                SYMBOLS[i % 3]
            } else {
                '-'
            }
        })
        .collect()
}

/// 4桁の8進数文字列（例: "0644"）を権限ビットに変換
pub fn parse_permission(mode: &str) -> Result<u32> {
    let invalid = || ArgumentError::InvalidMode { mode: mode.to_string() };

    if mode.len() != 4 || !mode.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid().into());
    }

    u32::from_str_radix(mode, 8).map_err(|_| invalid().into())
}

/// OSレベルのファイル状態スナップショット
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileStat {
    pub size: u64,
    pub inode: u64,
    pub mode: u32,
    pub link_count: u64,
    pub uid: u32,
    pub gid: u32,
    pub block_size: u64,
    pub blocks: u64,
    /// 最終アクセス時刻（UNIX秒）
    pub accessed: i64,
    /// 最終更新時刻（UNIX秒）
    pub modified: i64,
    /// 状態変更時刻（UNIX秒）
    pub changed: i64,
    /// パス自体がシンボリックリンクか
    pub is_symlink: bool,
}

impl FileStat {
    /// パスのstatを取得（リンク先を辿る）
    pub fn capture(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).with_path("stat", path)?;
        let symlink_metadata = std::fs::symlink_metadata(path).with_path("lstat", path)?;

        Ok(FileStat {
            size: metadata.len(),
            inode: metadata.ino(),
            mode: metadata.mode(),
            link_count: metadata.nlink(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            block_size: metadata.blksize(),
            blocks: metadata.blocks(),
            accessed: metadata.atime(),
            modified: metadata.mtime(),
            changed: metadata.ctime(),
            is_symlink: symlink_metadata.file_type().is_symlink(),
        })
    }

    /// 権限ビットのみ
    pub fn permissions(&self) -> u32 {
        self.mode & PERMISSION_BITS
    }

    /// ファイル種別
    pub fn kind(&self) -> FileKind {
        if self.is_symlink {
            FileKind::SymbolicLink
        } else {
            FileKind::from_mode(self.mode)
        }
    }
}

impl fmt::Display for FileStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {} {}:{} {} bytes, {} blocks of {}, inode {}, mtime {}",
            self.kind().type_char(),
            mode_to_string(self.mode),
            self.link_count,
            self.uid,
            self.gid,
            self.size,
            self.blocks,
            self.block_size,
            self.inode,
            self.modified
        )
    }
}
