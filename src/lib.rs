//! filereg - 名前付きテキストファイルのプロセス内レジストリ
//!
//! ファイルを名前で開き（無ければ作成し）、メタデータと行単位の内容をキャッシュする

// コアモジュール
pub mod config;
pub mod error;
pub mod logging;

// データ層
pub mod file;
pub mod registry;

// 公開API
pub use config::RegistryConfig;
pub use error::{ErrorCategory, RegistryError, Result};
pub use file::{FileKind, FileRecord, FileStat, WriteMode};
pub use registry::{FileRegistry, SlotIndex};
