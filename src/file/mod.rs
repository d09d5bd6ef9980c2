//! ファイル操作モジュール
//!
//! レジストリが管理する1ファイル分の操作：
//! - ハンドルは1回の操作の中でだけ開く（操作をまたいで保持しない）
//! - 変更操作のあとは必ずメタデータを読み直す
//! - 外部プロセスによる変更は監視しない（次の読み直しまで古いまま）

pub mod io;
pub mod metadata;
pub mod path;
pub mod record;

pub use io::{LineStats, WriteMode};
pub use metadata::{mode_to_string, parse_permission, FileKind, FileStat};
pub use path::{expand_path, normalize_path, PathProcessor, ResolvedPath};
pub use record::{FileIdentity, FileRecord, RecordSnapshot};
