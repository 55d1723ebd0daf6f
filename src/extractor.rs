//! 測定表の読み込み
//!
//! 固定レイアウト（既定: 7行目から、B列=日付、C列=通り名、F列=優先度）の
//! シートを読み、`MeasurementRecord` の列にする。

use crate::error::{ReportError, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDate;
use photo_report_common::{DateKey, MeasurementRecord, ReportConfig, StatusSink, Step};
use std::path::Path;
use tracing::debug;

/// 測定表ファイルからレコードを抽出
///
/// シートが無ければ `SheetNotFound`。ブックはこの関数を抜けた時点で閉じる。
pub fn extract_measurements(
    path: &Path,
    sheet_name: &str,
    config: &ReportConfig,
    sink: &mut dyn StatusSink,
) -> Result<Vec<MeasurementRecord>> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    sink.log(format!("測定表を開いています: '{}'...", file_name));

    if !path.exists() {
        return Err(ReportError::FileNotFound(path.display().to_string()));
    }

    let range = {
        let mut workbook = open_workbook_auto(path)?;
        sink.log(format!("測定表を開きました。シート '{}' を読み込みます...", sheet_name));

        if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
            return Err(ReportError::SheetNotFound(sheet_name.to_string()));
        }
        workbook.worksheet_range(sheet_name)?
    };

    let records = extract_from_range(&range, config, sink);
    sink.log(format!("測定表の抽出完了: 有効なレコード{}件", records.len()));
    Ok(records)
}

/// 読み込み済みのシートからレコードを抽出
pub fn extract_from_range(
    range: &Range<Data>,
    config: &ReportConfig,
    sink: &mut dyn StatusSink,
) -> Vec<MeasurementRecord> {
    let first_row = config.first_data_row;
    let max_row = range.end().map(|(row, _)| row + 1).unwrap_or(0);
    let total = if max_row >= first_row {
        (max_row - first_row + 1) as usize
    } else {
        0
    };
    sink.log(format!("{}行を読み込みます", total));

    let ignored: Vec<String> = config.ignored_phrases.iter().map(|p| p.to_uppercase()).collect();
    let mut records = Vec::new();

    for (i, row) in (first_row..=max_row).enumerate() {
        if i % config.progress_interval == 0 || i + 1 == total {
            sink.progress(
                format!("測定表を読み込み中 ({}/{})", i + 1, total),
                i + 1,
                total,
                Step::Extract,
            );
        }

        let cell = |col: u16| range.get_value((row - 1, col as u32 - 1));

        let Some(street_name) = cell(config.street_column).and_then(street_from_cell) else {
            continue;
        };
        let upper = street_name.to_uppercase();
        if ignored.iter().any(|phrase| upper.contains(phrase.as_str())) {
            debug!(row, street = %street_name, "除外語句を含む行をスキップ");
            continue;
        }

        let Some(date_key) = cell(config.date_column).and_then(date_key_from_cell) else {
            debug!(row, "日付を解釈できない行をスキップ");
            continue;
        };

        let priority = cell(config.priority_column)
            .map(priority_from_cell)
            .unwrap_or(f64::NEG_INFINITY);

        records.push(MeasurementRecord::new(date_key, street_name, priority, row));
    }

    records
}

/// 通り名: 空でない文字列セルのみ
fn street_from_cell(value: &Data) -> Option<String> {
    match value {
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

/// 日付: 日付セル、ISO日時、または決まった書式の文字列
fn date_key_from_cell(value: &Data) -> Option<DateKey> {
    match value {
        Data::DateTime(dt) => dt.as_datetime().map(|d| DateKey::new(d.date())),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(DateKey::new),
        Data::String(s) => DateKey::parse(s),
        _ => None,
    }
}

/// 優先度: 数値に変換できなければ負の無限大
fn priority_from_cell(value: &Data) -> f64 {
    match value {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Data::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NEG_INFINITY),
        _ => f64::NEG_INFINITY,
    }
}
