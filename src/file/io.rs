//! ファイルI/O操作
//!
//! 操作単位のハンドル管理、行数・文字数の走査、行単位の読み込み

use crate::error::{FileError, IoContext, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::ops::{Deref, DerefMut};
use std::path::Path;

/// 書き込みモード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// 切り詰めて書き込み
    Truncate,
    /// 末尾に追記
    Append,
}

impl WriteMode {
    /// 対応するオープンオプション
    pub fn open_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            WriteMode::Truncate => options.write(true).create(true).truncate(true),
            WriteMode::Append => options.append(true).create(true),
        };
        options
    }
}

/// レコードが保持する唯一のハンドル枠
///
/// ハンドルは [`HandleSlot::acquire`] が返すガードの生存期間中だけ保持される
#[derive(Debug, Default)]
pub struct HandleSlot {
    file: Option<File>,
}

impl HandleSlot {
    pub fn new() -> Self {
        Self { file: None }
    }

    /// ハンドルを保持中か
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// ファイルを開いてガードを返す（二重オープンは失敗）
    pub fn acquire(&mut self, path: &Path, options: &OpenOptions) -> Result<HandleGuard<'_>> {
        if self.file.is_some() {
            return Err(FileError::Io {
                operation: "open",
                path: path.display().to_string(),
                message: "a handle is already open for this file".to_string(),
            }
            .into());
        }

        let file = options.open(path).with_path("open", path)?;
        self.file = Some(file);
        Ok(HandleGuard { slot: &mut self.file })
    }

    /// 保持中のハンドルを閉じる
    pub fn release(&mut self) {
        self.file = None;
    }
}

/// 開いているハンドルのガード（破棄時に必ず閉じる）
pub struct HandleGuard<'a> {
    slot: &'a mut Option<File>,
}

impl Deref for HandleGuard<'_> {
    type Target = File;

    fn deref(&self) -> &File {
        match self.slot.as_ref() {
            Some(file) => file,
            None => unreachable!("handle guard outlived its file"),
        }
    }
}

impl DerefMut for HandleGuard<'_> {
    fn deref_mut(&mut self) -> &mut File {
        match self.slot.as_mut() {
            Some(file) => file,
            None => unreachable!("handle guard outlived its file"),
        }
    }
}

impl Drop for HandleGuard<'_> {
    fn drop(&mut self) {
        *self.slot = None;
    }
}

/// 行数・文字数の走査結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStats {
    pub line_count: usize,
    pub char_count: usize,
}

/// 先頭から1回の走査で行数と文字数（バイト数）を数える
///
/// 改行の後ろにさらにバイトが続く場合のみ新しい行として数える。
/// 空でないファイルは少なくとも1行。
pub fn count_lines<R: Read>(reader: R) -> io::Result<LineStats> {
    let mut reader = BufReader::new(reader);
    let mut newline_pending = false;
    let mut breaks = 0usize;
    let mut chars = 0usize;

    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            break;
        }

        for &byte in chunk {
            if newline_pending {
                breaks += 1;
                newline_pending = false;
            }
            if byte == b'\n' {
                newline_pending = true;
            }
        }

        chars += chunk.len();
        let consumed = chunk.len();
        reader.consume(consumed);
    }

    let line_count = if chars == 0 { 0 } else { breaks + 1 };
    Ok(LineStats {
        line_count,
        char_count: chars,
    })
}

/// 1行を読み込む（改行まで、または `max_length - 1` バイトまで）
///
/// UTF-8の文字の途中では切らず、上限に収まらない文字は次の行に回す。
/// ただし行頭の1文字は上限を超えても取り込む。
/// 終端に達して何も読めなかった場合は `None`
pub fn read_line_bounded<R: BufRead>(reader: &mut R, max_length: usize) -> io::Result<Option<String>> {
    let limit = max_length.saturating_sub(1);
    if limit == 0 {
        return Ok(None);
    }
    let mut line = Vec::new();

    while let Some(lead) = peek_byte(reader)? {
        let width = utf8_width(lead);
        if !line.is_empty() && line.len() + width > limit {
            break;
        }

        line.push(lead);
        reader.consume(1);
        if lead == b'\n' {
            break;
        }

        for _ in 1..width {
            match peek_byte(reader)? {
                Some(byte) if byte & 0xC0 == 0x80 => {
                    line.push(byte);
                    reader.consume(1);
                }
                _ => break,
            }
        }

        if line.len() >= limit {
            break;
        }
    }

    if line.is_empty() {
        Ok(None)
    } else {
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}

fn peek_byte<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    Ok(reader.fill_buf()?.first().copied())
}

/// 先頭バイトから見たUTF-8の文字長（不正なバイトは1）
fn utf8_width(lead: u8) -> usize {
    match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

/// 終端までバイト列をコピーし、コピーしたバイト数を返す
pub fn copy_stream<R: Read, W: Write>(source: R, destination: W, buffer_size: usize) -> io::Result<u64> {
    let mut reader = BufReader::with_capacity(buffer_size, source);
    let mut writer = BufWriter::with_capacity(buffer_size, destination);
    let copied = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    Ok(copied)
}
