//! 報告書生成の型定義
//!
//! パイプライン全体で共有される型:
//! - DateKey: 日付フォルダ名兼グルーピングキー（DD-MM-YYYY）
//! - MeasurementRecord: 測定表の1行（抽出済み）
//! - PhotoSet: レコードに紐づく検証済み写真（最大3枚）
//! - EligibleItem: 必要枚数の写真を持つレコード（選定対象）

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// 日付キーの正規表記（フォルダ名と同じ）
pub const DATE_KEY_FORMAT: &str = "%d-%m-%Y";

/// 文字列セルとして受け付ける日付書式（先に一致したものを採用）
pub const ACCEPTED_DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];

/// 日付キー
///
/// 表示は常に `DD-MM-YYYY`。順序は暦順なので、BTreeMapのキーにすれば
/// そのまま日付順に並ぶ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// 文字列から日付キーを作る
    ///
    /// `ACCEPTED_DATE_FORMATS` を順に試し、最初に解釈できた書式を採用する。
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        ACCEPTED_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
            .map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// 測定表の1行
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    /// 作業日（写真フォルダ名）
    pub date_key: DateKey,

    /// 通り名（前後空白除去、大文字小文字は原文のまま）
    pub street_name: String,

    /// 優先度（空欄・数値以外は負の無限大）
    pub priority: f64,

    /// 元の行番号（1始まり）
    pub source_row: u32,
}

impl MeasurementRecord {
    pub fn new(date_key: DateKey, street_name: impl Into<String>, priority: f64, source_row: u32) -> Self {
        Self {
            date_key,
            street_name: street_name.into(),
            priority: normalize_priority(priority),
            source_row,
        }
    }
}

/// NaNは比較できないので最低優先度として扱う
///
/// `total_cmp` は -0.0 を 0.0 より小さく並べるので 0.0 に揃え、
/// 同値として行番号で決着させる。
pub fn normalize_priority(value: f64) -> f64 {
    if value.is_nan() {
        f64::NEG_INFINITY
    } else if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// 検証済み写真のパス（期待名 "1","2","3" の順）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhotoSet(Vec<PathBuf>);

impl PhotoSet {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self(paths)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.0
    }

    pub fn push(&mut self, path: PathBuf) {
        self.0.push(path);
    }
}

/// 選定対象（写真枚数の条件を満たしたレコード）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibleItem {
    #[serde(flatten)]
    pub record: MeasurementRecord,
    pub photos: PhotoSet,
}

impl EligibleItem {
    /// 写真枚数が `min_photos` に満たなければ `None`
    pub fn try_new(record: MeasurementRecord, photos: PhotoSet, min_photos: usize) -> Option<Self> {
        if photos.len() >= min_photos {
            Some(Self { record, photos })
        } else {
            None
        }
    }

    pub fn source_row(&self) -> u32 {
        self.record.source_row
    }
}
