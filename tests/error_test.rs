//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use photo_report_common::{MemorySink, ReportConfig};
use photo_report_rust::config::Config;
use photo_report_rust::error::ReportError;
use photo_report_rust::extractor;
use std::path::Path;
use tempfile::tempdir;

/// 存在しない測定表
#[test]
fn test_extract_nonexistent_file() {
    let mut sink = MemorySink::new();
    let result = extractor::extract_measurements(
        Path::new("/nonexistent/path/medicao.xlsx"),
        "Medição",
        &ReportConfig::default(),
        &mut sink,
    );

    let err = result.unwrap_err();
    assert!(matches!(err, ReportError::FileNotFound(_)));
    assert!(err.is_input_error());
}

/// 表計算ファイルではないファイル
#[test]
fn test_extract_not_a_workbook() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("medicao.xlsx");
    std::fs::write(&path, "isto não é uma planilha").unwrap();

    let mut sink = MemorySink::new();
    let err = extractor::extract_measurements(&path, "Medição", &ReportConfig::default(), &mut sink).unwrap_err();
    assert!(matches!(err, ReportError::Spreadsheet(_)), "想定外のエラー: {:?}", err);
}

/// 不正な設定ファイル
#[test]
fn test_load_invalid_config() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ReportError::JsonParse(_)));
}

/// 値として不正な設定（必要枚数0など）
#[test]
fn test_load_config_out_of_range() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "photoAnchors": [] }"#).unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(err.is_input_error(), "設定エラーとして扱われていない: {:?}", err);
}

/// ReportErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        ReportError::Config("テスト設定エラー".to_string()),
        ReportError::FileNotFound("medicao.xlsx".to_string()),
        ReportError::SheetNotFound("Medição".to_string()),
        ReportError::TemplateSheetMissing("MODELO".to_string()),
        ReportError::Spreadsheet("読み込み失敗".to_string()),
        ReportError::ExcelGeneration("Excel生成エラー".to_string()),
        ReportError::NoMeasurements,
        ReportError::NoEligibleItems(3),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// 入力エラーと処理エラーの区別
#[test]
fn test_input_error_classification() {
    assert!(ReportError::SheetNotFound("x".into()).is_input_error());
    assert!(ReportError::TemplateSheetMissing("MODELO".into()).is_input_error());
    assert!(!ReportError::NoEligibleItems(3).is_input_error());
    assert!(!ReportError::NoMeasurements.is_input_error());
    assert!(!ReportError::ExcelGeneration("x".into()).is_input_error());
}

/// シート名がメッセージに含まれる
#[test]
fn test_sheet_not_found_message() {
    let err = ReportError::SheetNotFound("Medição".to_string());
    assert!(format!("{}", err).contains("Medição"));
}

/// 共通ライブラリのエラーからの変換
#[test]
fn test_error_from_common() {
    let common = photo_report_common::Error::InvalidCellReference("ZZZ".to_string());
    let err: ReportError = common.into();
    assert!(matches!(err, ReportError::Common(_)));
    assert!(format!("{}", err).contains("ZZZ"));
}
