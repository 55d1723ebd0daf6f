//! 報告書生成の設定
//!
//! 選定枠・写真枚数・アンカー位置などはすべてこの構造体で各処理に渡す。
//! 設定ファイルに書かれていない項目は既定値を使う。

use crate::error::{Error, Result};
use crate::layout::CellRef;
use serde::{Deserialize, Serialize};

/// 報告書生成の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    // ---- 選定 ----
    /// 作成するシート数の上限
    pub target_count: usize,
    /// 1件あたりに必要な写真枚数
    pub min_photos_required: usize,
    /// 探す写真のファイル名（拡張子なし、この順で並べる）
    pub expected_photo_names: Vec<String>,

    // ---- 測定表 ----
    /// データ開始行（1始まり）
    pub first_data_row: u32,
    /// 日付列（1始まり）
    pub date_column: u16,
    /// 通り名列（1始まり）
    pub street_column: u16,
    /// 優先度列（1始まり）
    pub priority_column: u16,
    /// この語句を含む通り名の行は読み飛ばす（大文字小文字を区別しない）
    pub ignored_phrases: Vec<String>,
    /// 何行ごとに進捗を通知するか
    pub progress_interval: usize,

    // ---- 写真 ----
    /// 対応する拡張子（この順で探す）
    pub image_extensions: Vec<String>,
    /// 写真をデコードして壊れていないか確認する
    pub validate_images: bool,

    // ---- 出力 ----
    /// 複製元のシート名
    pub template_sheet_name: String,
    /// 通り名を書き込むセル
    pub street_label_cell: CellRef,
    /// 写真の貼り付け位置（写真の並び順に対応）
    pub photo_anchors: Vec<CellRef>,
    /// 写真の表示幅（px）
    pub photo_width_px: u32,
    /// 写真の表示高さ（px）
    pub photo_height_px: u32,
    /// シート名の最大文字数
    pub sheet_name_max_len: usize,
    /// 出力ファイル名の接頭辞
    pub output_prefix: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            target_count: 40,
            min_photos_required: 3,
            expected_photo_names: vec!["1".into(), "2".into(), "3".into()],
            first_data_row: 7,
            date_column: 2,
            street_column: 3,
            priority_column: 6,
            ignored_phrases: vec!["TAPA BURACO".into()],
            progress_interval: 50,
            image_extensions: ["jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            validate_images: true,
            template_sheet_name: "MODELO".into(),
            street_label_cell: CellRef::new(12, 10), // K13
            photo_anchors: vec![
                CellRef::new(15, 1), // B16
                CellRef::new(38, 1), // B39
                CellRef::new(61, 1), // B62
            ],
            photo_width_px: 730,
            photo_height_px: 370,
            sheet_name_max_len: 31,
            output_prefix: "Relatorio_Fotografico_".into(),
        }
    }
}

impl ReportConfig {
    /// 選定対象となるのに必要な写真枚数
    ///
    /// 期待名の数より多くは見つからないので、期待名の数で頭打ちにする。
    pub fn min_photos_threshold(&self) -> usize {
        self.min_photos_required.min(self.expected_photo_names.len())
    }

    /// 設定値の整合性を確認
    pub fn validate(&self) -> Result<()> {
        if self.expected_photo_names.is_empty() {
            return Err(Error::Config("expectedPhotoNamesが空です".into()));
        }
        if self.expected_photo_names.len() > 3 {
            return Err(Error::Config("写真は1件あたり3枚までです".into()));
        }
        if self.photo_anchors.len() < self.expected_photo_names.len() {
            return Err(Error::Config(format!(
                "photoAnchorsが{}個しかありません（写真{}枚分が必要）",
                self.photo_anchors.len(),
                self.expected_photo_names.len()
            )));
        }
        if self.image_extensions.is_empty() {
            return Err(Error::Config("imageExtensionsが空です".into()));
        }
        if self.first_data_row == 0 || self.date_column == 0 || self.street_column == 0 || self.priority_column == 0 {
            return Err(Error::Config("行番号・列番号は1始まりで指定してください".into()));
        }
        // 接尾辞 "_N" を付ける余地が必要
        if self.sheet_name_max_len < 4 || self.sheet_name_max_len > 31 {
            return Err(Error::Config("sheetNameMaxLenは4〜31で指定してください".into()));
        }
        if self.progress_interval == 0 {
            return Err(Error::Config("progressIntervalは1以上が必要です".into()));
        }
        Ok(())
    }
}
