//! Photo Report Common Library
//!
//! 写真報告書生成の中核（I/Oを持たない部分）:
//! - 測定レコード・写真セットの型
//! - 写真フォルダ探索（ディレクトリ抽象上の純粋関数）
//! - 選定エンジン（日付カバレッジ＋優先度による枠内選定）
//! - シート名の一意化
//! - 進捗/結果の通知プロトコル

pub mod types;
pub mod layout;
pub mod config;
pub mod error;
pub mod status;
pub mod locator;
pub mod selection;
pub mod sheet_name;

pub use types::{DateKey, EligibleItem, MeasurementRecord, PhotoSet};
pub use layout::CellRef;
pub use config::ReportConfig;
pub use error::{Error, Result};
pub use status::{FnSink, MemorySink, StatusEvent, StatusSink, Step};
pub use locator::{locate_photos, AcceptAll, DirectoryLister, PhotoValidator};
pub use selection::select_items;
pub use sheet_name::SheetNamer;
