//! ファイルレジストリ
//!
//! 名前付きファイルのレコードをスロット単位で管理する。
//! スロット番号はレコードの生成から削除まで変わらず、削除されたスロットは空きとして再利用される。

use crate::config::RegistryConfig;
use crate::error::{ArgumentError, RegistryError, Result};
use crate::file::io::WriteMode;
use crate::file::metadata::{FileKind, FileStat};
use crate::file::path::{self, ensure_bare_name, ResolvedPath};
use crate::file::record::FileRecord;
use std::path::{Path, PathBuf};

/// スロットの一意識別子
pub type SlotIndex = usize;

/// 複数のファイルレコードを管理する構造体
///
/// `U` は呼び出し側が任意に保持できるユーザーデータの型
#[derive(Debug)]
pub struct FileRegistry<U = ()> {
    /// レコードの格納（`None` は空きスロット）
    slots: Vec<Option<FileRecord>>,
    /// ユーザーデータ（レジストリは解釈しない）
    user_data: Option<U>,
    config: RegistryConfig,
}

impl<U> FileRegistry<U> {
    /// 空きスロット1つだけを持つレジストリを作成
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// 設定を指定して作成
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            slots: vec![None],
            user_data: None,
            config,
        }
    }

    /// 設定を取得
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// 全ファイルを削除してレジストリを破棄
    pub fn destroy(mut self) -> Result<()> {
        self.delete_all_files()
    }

    /// ユーザーデータを設定（`None` は拒否され、既存の値を保持する）
    pub fn set_user_data(&mut self, data: Option<U>) -> Option<&U> {
        let data = data?;
        self.user_data = Some(data);
        self.user_data.as_ref()
    }

    /// ユーザーデータを取得
    pub fn user_data(&self) -> Option<&U> {
        self.user_data.as_ref()
    }

    /// ユーザーデータへの可変参照を取得
    pub fn user_data_mut(&mut self) -> Option<&mut U> {
        self.user_data.as_mut()
    }

    /// 登録中のファイル数
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 確保済みスロット数（空きスロットを含む）
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// スロットにレコードがあるか
    pub fn is_occupied(&self, index: SlotIndex) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// 新しいファイルを登録（存在しなければ作成）
    pub fn new_file(&mut self, name: &str) -> Result<&mut Self> {
        self.new_file_at(name)?;
        Ok(self)
    }

    /// 新しいファイルを登録し、割り当てたスロット番号を返す
    pub fn new_file_at(&mut self, name: &str) -> Result<SlotIndex> {
        ensure_bare_name(name)?;
        if self.name_taken(name, None) {
            return Err(RegistryError::NameConflict { name: name.to_string() });
        }

        let record = FileRecord::open(ResolvedPath {
            name: name.to_string(),
            path: self.base_dir()?.join(name),
        })?;

        let index = match self.slots.iter().position(Option::is_none) {
            Some(hole) => hole,
            None => {
                let requested = self.slots.len() + 1;
                if self.slots.try_reserve(1).is_err() {
                    return Err(RegistryError::Capacity { requested });
                }
                self.slots.push(None);
                self.slots.len() - 1
            }
        };

        log::debug!("registered {} at slot {}", record.path().display(), index);
        self.slots[index] = Some(record);
        Ok(index)
    }

    /// ファイルを削除（ディスク上のファイルも削除し、スロットを空きにする）
    pub fn delete_file(&mut self, index: SlotIndex) -> Result<&mut Self> {
        if self.is_empty() && index < self.slots.len() {
            return Err(ArgumentError::EmptyRegistry.into());
        }
        self.record(index)?;

        if let Some(mut record) = self.slots[index].take() {
            if let Err(e) = record.remove() {
                self.slots[index] = Some(record);
                return Err(e);
            }
            log::debug!("deleted {} from slot {}", record.path().display(), index);
        }
        Ok(self)
    }

    /// 全ファイルを削除し、スロット領域を初期状態に戻す
    ///
    /// 失敗したスロットがあっても残りの削除は続け、最初のエラーを返す
    pub fn delete_all_files(&mut self) -> Result<()> {
        let mut first_error = None;

        for index in 0..self.slots.len() {
            if !self.is_occupied(index) {
                continue;
            }
            if let Err(e) = self.delete_file(index) {
                log::warn!("failed to delete slot {}: {}", index, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                self.slots.clear();
                self.slots.push(None);
                Ok(())
            }
        }
    }

    /// 名前で検索（先頭一致、スロット番号順で最初のもの）
    pub fn find_by_name(&self, name: &str) -> Result<Option<&FileRecord>> {
        Ok(self.position_by_name(name)?.and_then(|index| self.slots[index].as_ref()))
    }

    /// 名前で検索してスロット番号を返す
    pub fn position_by_name(&self, name: &str) -> Result<Option<SlotIndex>> {
        ensure_bare_name(name)?;
        Ok(self.slots.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|record| record.name().starts_with(name))
        }))
    }

    /// スロットのレコードを取得
    pub fn get(&self, index: SlotIndex) -> Result<&FileRecord> {
        self.record(index)
    }

    pub fn name(&self, index: SlotIndex) -> Result<&str> {
        Ok(self.record(index)?.name())
    }

    pub fn path(&self, index: SlotIndex) -> Result<&Path> {
        Ok(self.record(index)?.path())
    }

    pub fn size(&self, index: SlotIndex) -> Result<u64> {
        Ok(self.record(index)?.size())
    }

    pub fn mode_string(&self, index: SlotIndex) -> Result<&str> {
        Ok(self.record(index)?.mode_string())
    }

    pub fn stat(&self, index: SlotIndex) -> Result<&FileStat> {
        Ok(self.record(index)?.stat())
    }

    pub fn kind(&self, index: SlotIndex) -> Result<FileKind> {
        Ok(self.record(index)?.kind())
    }

    pub fn line_count(&self, index: SlotIndex) -> Result<usize> {
        Ok(self.record(index)?.line_count())
    }

    pub fn char_count(&self, index: SlotIndex) -> Result<usize> {
        Ok(self.record(index)?.char_count())
    }

    /// 登録中のレコードをスロット番号順に列挙
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &FileRecord)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|record| (index, record)))
    }

    /// 文字列を書き込み
    pub fn write(&mut self, index: SlotIndex, content: &str, mode: WriteMode) -> Result<&mut Self> {
        self.record_mut(index)?.write(content, mode)?;
        Ok(self)
    }

    /// 全行を読み込み（設定の最大行長を使用）
    pub fn read(&mut self, index: SlotIndex) -> Result<&[String]> {
        let max_line_length = self.config.max_line_length;
        self.read_with(index, max_line_length)
    }

    /// 最大行長を指定して全行を読み込み
    pub fn read_with(&mut self, index: SlotIndex, max_line_length: usize) -> Result<&[String]> {
        self.record_mut(index)?.read(max_line_length)
    }

    /// 名前を変更
    pub fn rename(&mut self, index: SlotIndex, new_name: &str) -> Result<&mut Self> {
        self.record(index)?;
        ensure_bare_name(new_name)?;
        if self.name_taken(new_name, Some(index)) {
            return Err(RegistryError::NameConflict { name: new_name.to_string() });
        }

        self.record_mut(index)?.rename(new_name)?;
        Ok(self)
    }

    /// ファイルを複製し、複製先のパスを返す
    ///
    /// 複製先を省略すると `<path>_<n>` に複製する。
    /// 明示した複製先が他のレコードのパスなら拒否し、
    /// 連番の複製先が他のレコードと重なった場合はそのレコードを読み直す。
    pub fn copy(&mut self, index: SlotIndex, destination: Option<&str>) -> Result<PathBuf> {
        self.record(index)?;
        let destination = match destination {
            Some(dest) => {
                let resolved = self.resolve_destination(dest)?;
                if self.path_owner(&resolved.path, Some(index)).is_some() {
                    return Err(RegistryError::NameConflict { name: resolved.name });
                }
                Some(resolved)
            }
            None => None,
        };

        let buffer_size = self.config.copy_buffer_size;
        let target = self.record_mut(index)?.copy(destination.as_ref(), buffer_size)?;

        if let Some(owner) = self.path_owner(&target, Some(index)) {
            log::debug!("copy overwrote slot {}, reloading {}", owner, target.display());
            self.record_mut(owner)?.load()?;
        }
        Ok(target)
    }

    /// ファイルを移動（複製後に元ファイルを削除）
    pub fn move_file(&mut self, index: SlotIndex, destination: &str) -> Result<&mut Self> {
        self.record(index)?;
        let destination = self.resolve_destination(destination)?;
        if self.name_taken(&destination.name, Some(index)) {
            return Err(RegistryError::NameConflict { name: destination.name });
        }

        let buffer_size = self.config.copy_buffer_size;
        self.record_mut(index)?.move_to(destination, buffer_size)?;
        Ok(self)
    }

    /// 指定長に切り詰め
    pub fn truncate(&mut self, index: SlotIndex, length: u64) -> Result<&mut Self> {
        self.record_mut(index)?.truncate(length)?;
        Ok(self)
    }

    /// 権限を変更（例: `"0644"`）
    pub fn change_mode(&mut self, index: SlotIndex, permission: &str) -> Result<&mut Self> {
        self.record_mut(index)?.change_mode(permission)?;
        Ok(self)
    }

    /// メタデータを読み直す（外部からの変更を反映）
    pub fn reload(&mut self, index: SlotIndex) -> Result<&mut Self> {
        self.record_mut(index)?.load()?;
        Ok(self)
    }

    fn record(&self, index: SlotIndex) -> Result<&FileRecord> {
        match self.slots.get(index) {
            Some(Some(record)) => Ok(record),
            Some(None) => Err(ArgumentError::EmptySlot { index }.into()),
            None => Err(ArgumentError::InvalidIndex {
                index,
                slots: self.slots.len(),
            }
            .into()),
        }
    }

    fn record_mut(&mut self, index: SlotIndex) -> Result<&mut FileRecord> {
        let slots = self.slots.len();
        match self.slots.get_mut(index) {
            Some(Some(record)) => Ok(record),
            Some(None) => Err(ArgumentError::EmptySlot { index }.into()),
            None => Err(ArgumentError::InvalidIndex { index, slots }.into()),
        }
    }

    /// 他のレコードが同じ名前を使っているか（完全一致）
    fn name_taken(&self, name: &str, except: Option<SlotIndex>) -> bool {
        self.iter()
            .any(|(index, record)| Some(index) != except && record.name() == name)
    }

    /// 指定パスを持つ他のレコードのスロット番号
    fn path_owner(&self, target: &Path, except: Option<SlotIndex>) -> Option<SlotIndex> {
        self.iter()
            .find(|(index, record)| Some(*index) != except && record.path() == target)
            .map(|(index, _)| index)
    }

    /// 名前の解決に使う基準ディレクトリ（常に絶対パス）
    fn base_dir(&self) -> Result<PathBuf> {
        match &self.config.base_dir {
            Some(dir) => path::expand_path(dir),
            None => path::current_dir(),
        }
    }

    /// 複製・移動先は区切り文字を含むパスでなければならない
    fn resolve_destination(&self, destination: &str) -> Result<ResolvedPath> {
        if path::is_bare_name(destination) {
            return Err(ArgumentError::NotAPath {
                path: destination.to_string(),
            }
            .into());
        }
        path::resolve(destination, &self.base_dir()?)
    }
}

impl<U> Default for FileRegistry<U> {
    fn default() -> Self {
        Self::new()
    }
}
