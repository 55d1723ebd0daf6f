//! 報告書生成の一連の流れ
//!
//! ## 処理フロー
//! 1. 測定表からレコードを抽出
//! 2. レコードごとに写真を探し、必要枚数に満たないものを除外
//! 3. 日付カバレッジと優先度で選定
//! 4. テンプレートを複製して報告書ブックを保存
//!
//! 結果は必ず1回だけ `result` イベントで通知する。

use crate::error::{ReportError, Result};
use crate::export::{self, ReportOutcome};
use crate::extractor;
use photo_report_common::{
    locate_photos, select_items, DirectoryLister, EligibleItem, MeasurementRecord, PhotoValidator, ReportConfig,
    StatusSink, Step,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// 報告書の作成依頼
///
/// ホストアプリから標準入力で渡されるJSONと同じ形。
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    /// 測定表ファイル
    #[serde(rename = "medicaoPath")]
    pub measurement_path: PathBuf,
    /// 測定表のシート名
    #[serde(rename = "aba")]
    pub sheet_name: String,
    /// 写真ルートフォルダ
    #[serde(rename = "fotosPath")]
    pub photos_dir: PathBuf,
    /// テンプレートブック
    #[serde(rename = "modeloPath")]
    pub template_path: PathBuf,
}

/// 写真の確認と選定対象の絞り込み
pub fn collect_eligible(
    records: Vec<MeasurementRecord>,
    photos_dir: &Path,
    lister: &dyn DirectoryLister,
    validator: &dyn PhotoValidator,
    config: &ReportConfig,
    sink: &mut dyn StatusSink,
) -> Vec<EligibleItem> {
    let min_photos = config.min_photos_threshold();
    let total = records.len();
    let mut eligible = Vec::new();

    for (i, record) in records.into_iter().enumerate() {
        sink.progress(format!("写真を確認中 ({}/{})", i + 1, total), i + 1, total, Step::Photos);

        let photos = locate_photos(
            lister,
            validator,
            photos_dir,
            &record.date_key,
            &record.street_name,
            config,
            sink,
        );
        if let Some(item) = EligibleItem::try_new(record, photos, min_photos) {
            eligible.push(item);
        }
    }

    eligible
}

/// 報告書を作成（エラーはそのまま返す）
pub fn generate_report(
    request: &ReportRequest,
    config: &ReportConfig,
    lister: &dyn DirectoryLister,
    validator: &dyn PhotoValidator,
    sink: &mut dyn StatusSink,
) -> Result<ReportOutcome> {
    config.validate()?;

    sink.log("処理を開始します。ステップ1: 測定表からデータを抽出");
    let records = extractor::extract_measurements(&request.measurement_path, &request.sheet_name, config, sink)?;
    if records.is_empty() {
        return Err(ReportError::NoMeasurements);
    }

    sink.log(format!("ステップ2: {}件のレコードについて写真を確認", records.len()));
    let eligible = collect_eligible(records, &request.photos_dir, lister, validator, config, sink);
    sink.log(format!("写真の確認完了: 写真が揃った項目は{}件", eligible.len()));
    if eligible.is_empty() {
        return Err(ReportError::NoEligibleItems(config.min_photos_threshold()));
    }

    sink.log("ステップ3: 各日付を1シート以上含むように選定");
    let selected = select_items(eligible, config, sink);

    sink.log("ステップ4: Excelファイルを作成します。時間がかかる場合があります...");
    export::build_report(&selected, &request.template_path, config, sink)
}

/// 報告書を作成し、結果を `result` イベントで通知
///
/// 成功したら `true`。どの経路でも `result` はちょうど1回。
pub fn run(
    request: &ReportRequest,
    config: &ReportConfig,
    lister: &dyn DirectoryLister,
    validator: &dyn PhotoValidator,
    sink: &mut dyn StatusSink,
) -> bool {
    match generate_report(request, config, lister, validator, sink) {
        Ok(outcome) => {
            info!(sheets = outcome.sheets_created, path = %outcome.output_path.display(), "報告書を作成");
            sink.result(
                format!("{}シートの報告書を作成しました", outcome.sheets_created),
                true,
                Some(outcome.output_path.display().to_string()),
            );
            true
        }
        Err(e) => {
            error!(error = %e, "報告書の作成に失敗");
            if e.is_input_error() {
                sink.error(e.to_string());
            }
            sink.result(e.to_string(), false, None);
            false
        }
    }
}
