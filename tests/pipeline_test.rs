//! 処理全体のテスト
//!
//! 測定表・写真フォルダ・雛形ブックを一時ディレクトリに用意し、
//! pipeline::run の通知と出力ブックを確認する。

mod support;

use photo_report_common::{MemorySink, ReportConfig, StatusEvent, Step};
use photo_report_rust::pipeline::{self, ReportRequest};
use photo_report_rust::scanner::{DecodeValidator, FsLister};
use std::path::Path;
use support::*;
use tempfile::tempdir;

const SHEET: &str = "Medição";
const PHOTOS: &[&str] = &["1.jpg", "2.jpg", "3.jpg"];

fn request(root: &Path) -> ReportRequest {
    ReportRequest {
        measurement_path: root.join("medicao.xlsx"),
        sheet_name: SHEET.to_string(),
        photos_dir: root.join("fotos"),
        template_path: root.join("modelo").join("modelo.xlsx"),
    }
}

fn prepare(root: &Path, rows: &[Row]) {
    write_measurement(&root.join("medicao.xlsx"), SHEET, rows);
    std::fs::create_dir_all(root.join("modelo")).unwrap();
    write_template(&root.join("modelo").join("modelo.xlsx"), "MODELO", true);
    std::fs::create_dir_all(root.join("fotos")).unwrap();
}

fn single_result(sink: &MemorySink) -> (String, bool, Option<String>) {
    let results = sink.results();
    assert_eq!(results.len(), 1, "result は1回だけ: {:?}", results);
    match results[0] {
        StatusEvent::Result { message, success, file_path } => (message.clone(), *success, file_path.clone()),
        _ => unreachable!(),
    }
}

/// 正常系: 写真の揃った項目だけがシートになる
#[test]
fn test_pipeline_end_to_end() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    prepare(
        root,
        &[
            row(7, DateCell::Native(2024, 3, 5), "Rua A", Some(2.0)),
            row(8, DateCell::Text("05/03/2024"), "Rua B", Some(5.0)),
            row(9, DateCell::Text("06-03-2024"), "Rua C", Some(1.0)),
            row(10, DateCell::Text("not-a-date"), "Rua D", Some(9.0)),
            row(11, DateCell::Text("06-03-2024"), "TAPA BURACO", Some(9.0)),
            row(12, DateCell::Text("07-03-2024"), "Rua E", None),
            row(13, DateCell::Text("07-03-2024"), "Rua F", Some(3.0)),
        ],
    );

    let photos = root.join("fotos");
    write_photos(&photos, "05-03-2024", "Rua A", PHOTOS);
    // 大文字小文字の違うフォルダ名・拡張子
    write_photos(&photos, "05-03-2024", "RUA B", &["1.JPG", "2.jpg", "3.png"]);
    write_photos(&photos, "06-03-2024", "Rua C", PHOTOS);
    write_photos(&photos, "06-03-2024", "Rua D", PHOTOS);
    write_photos(&photos, "07-03-2024", "Rua E", PHOTOS);
    // 2枚しか無い
    write_photos(&photos, "07-03-2024", "Rua F", &["1.jpg", "2.jpg"]);

    let config = ReportConfig::default();
    let mut sink = MemorySink::new();
    let ok = pipeline::run(&request(root), &config, &FsLister, &DecodeValidator, &mut sink);

    let (message, success, file_path) = single_result(&sink);
    assert!(ok, "失敗: {}", message);
    assert!(success);
    let output = file_path.expect("出力パスが無い");
    let output = Path::new(&output);
    assert!(output.exists());
    assert_eq!(output.parent(), Some(root.join("modelo").as_path()));

    // 元の行順
    assert_eq!(
        sheet_names(output),
        vec!["05-03-2024_Rua A", "05-03-2024_Rua B", "06-03-2024_Rua C", "07-03-2024_Rua E"]
    );
    assert_eq!(cell_text(output, "05-03-2024_Rua B", 12, 10).as_deref(), Some("Rua B"));

    assert_eq!(sink.progress_of(Step::Photos).len(), 5);
    assert_eq!(sink.progress_of(Step::Generate), vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    assert!(!sink.progress_of(Step::Extract).is_empty());
}

/// シート数の上限と日付カバレッジ
#[test]
fn test_pipeline_respects_target_count() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    prepare(
        root,
        &[
            row(7, DateCell::Text("05-03-2024"), "Rua A", Some(1.0)),
            row(8, DateCell::Text("05-03-2024"), "Rua B", Some(8.0)),
            row(9, DateCell::Text("06-03-2024"), "Rua C", Some(2.0)),
            row(10, DateCell::Text("07-03-2024"), "Rua D", Some(0.5)),
        ],
    );
    let photos = root.join("fotos");
    for (date, street) in [
        ("05-03-2024", "Rua A"),
        ("05-03-2024", "Rua B"),
        ("06-03-2024", "Rua C"),
        ("07-03-2024", "Rua D"),
    ] {
        write_photos(&photos, date, street, PHOTOS);
    }

    let config = ReportConfig {
        target_count: 3,
        ..ReportConfig::default()
    };
    let mut sink = MemorySink::new();
    assert!(pipeline::run(&request(root), &config, &FsLister, &DecodeValidator, &mut sink));

    let (_, _, file_path) = single_result(&sink);
    let output = file_path.unwrap();
    // 各日付の最優先1件
    assert_eq!(
        sheet_names(Path::new(&output)),
        vec!["05-03-2024_Rua B", "06-03-2024_Rua C", "07-03-2024_Rua D"]
    );
}

/// シートが無い: error と result(false)
#[test]
fn test_pipeline_missing_sheet() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    prepare(root, &[row(7, DateCell::Text("05-03-2024"), "Rua A", Some(1.0))]);

    let mut req = request(root);
    req.sheet_name = "Inexistente".to_string();

    let config = ReportConfig::default();
    let mut sink = MemorySink::new();
    let ok = pipeline::run(&req, &config, &FsLister, &DecodeValidator, &mut sink);

    assert!(!ok);
    let (message, success, file_path) = single_result(&sink);
    assert!(!success);
    assert!(file_path.is_none());
    assert!(message.contains("Inexistente"));
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, StatusEvent::Error { message } if message.contains("Inexistente"))));
    // result が最後
    assert!(matches!(sink.events.last(), Some(StatusEvent::Result { .. })));
    assert!(reports_in(&root.join("modelo"), "Relatorio_Fotografico_").is_empty());
}

/// 写真の揃った項目が無い
#[test]
fn test_pipeline_no_eligible_items() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    prepare(root, &[row(7, DateCell::Text("05-03-2024"), "Rua A", Some(1.0))]);
    write_photos(&root.join("fotos"), "05-03-2024", "Rua A", &["1.jpg"]);

    let config = ReportConfig::default();
    let mut sink = MemorySink::new();
    let ok = pipeline::run(&request(root), &config, &FsLister, &DecodeValidator, &mut sink);

    assert!(!ok);
    let (message, success, _) = single_result(&sink);
    assert!(!success);
    assert!(message.contains('3'), "必要枚数が含まれていない: {}", message);
    assert!(reports_in(&root.join("modelo"), "Relatorio_Fotografico_").is_empty());
}

/// 有効な行が1件も無い
#[test]
fn test_pipeline_no_measurements() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    prepare(
        root,
        &[
            row(7, DateCell::Text("not-a-date"), "Rua A", Some(1.0)),
            row(8, DateCell::Empty, "Rua B", Some(1.0)),
        ],
    );

    let config = ReportConfig::default();
    let mut sink = MemorySink::new();
    assert!(!pipeline::run(&request(root), &config, &FsLister, &DecodeValidator, &mut sink));

    let (message, success, _) = single_result(&sink);
    assert!(!success);
    assert!(message.contains("有効なデータ"));
}

/// 壊れた写真は検証で弾かれ、次の拡張子を探す
#[test]
fn test_pipeline_rejects_corrupt_photo() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    prepare(root, &[row(7, DateCell::Text("05-03-2024"), "Rua A", Some(1.0))]);
    let street_dir = write_photos(&root.join("fotos"), "05-03-2024", "Rua A", &["1.jpg", "2.jpg", "3.png"]);
    std::fs::write(street_dir.join("3.jpg"), b"corrompido").unwrap();

    let config = ReportConfig::default();
    let mut sink = MemorySink::new();
    assert!(pipeline::run(&request(root), &config, &FsLister, &DecodeValidator, &mut sink));
    assert!(sink.contains("3.jpg"), "壊れた写真が報告されていない");
}

/// 検証を通った TIFF の写真はそのまま報告書に載る
#[test]
fn test_pipeline_tiff_photos_are_embedded() {
    use photo_report_rust::export::package::read_sheet_package;

    let dir = tempdir().unwrap();
    let root = dir.path();
    prepare(root, &[row(7, DateCell::Text("05-03-2024"), "Rua A", Some(1.0))]);
    write_photos(&root.join("fotos"), "05-03-2024", "Rua A", &["1.tif", "2.tif", "3.tiff"]);

    let config = ReportConfig::default();
    let mut sink = MemorySink::new();
    assert!(pipeline::run(&request(root), &config, &FsLister, &DecodeValidator, &mut sink));
    assert!(!sink.events.iter().any(|e| matches!(e, StatusEvent::Error { .. })), "{:?}", sink.events);

    let (_, _, file_path) = single_result(&sink);
    let output = file_path.expect("出力パスが無い");
    let package = read_sheet_package(Path::new(&output), "05-03-2024_Rua A").unwrap();
    // ロゴ・スタンプ・写真3枚
    assert_eq!(package.images.len(), 5);
}

/// 標準入力の依頼JSON
#[test]
fn test_request_from_json() {
    let json = r#"{
        "medicaoPath": "/dados/medicao.xlsx",
        "aba": "Medição",
        "fotosPath": "/dados/fotos",
        "modeloPath": "/dados/modelo.xlsx"
    }"#;
    let req: ReportRequest = serde_json::from_str(json).unwrap();
    assert_eq!(req.sheet_name, "Medição");
    assert_eq!(req.photos_dir, Path::new("/dados/fotos"));
    assert_eq!(req.template_path, Path::new("/dados/modelo.xlsx"));
}
