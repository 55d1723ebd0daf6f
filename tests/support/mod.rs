//! 統合テスト用のファイル生成
//!
//! 測定表・テンプレート・写真フォルダを一時ディレクトリに作る。

#![allow(dead_code)]

use rust_xlsxwriter::{ExcelDateTime, Format, FormatBorder, Image, Workbook};
use std::io::Cursor;
use std::path::{Path, PathBuf};

pub const TEMPLATE_TITLE: &str = "RELATÓRIO FOTOGRÁFICO";

/// テンプレート上のロゴ（D2、右に10pxずらして 40×20）
pub const LOGO_ROW: u32 = 1;
pub const LOGO_COL: u16 = 3;
pub const LOGO_OFFSET_X: u32 = 10;
pub const LOGO_SIZE: (f64, f64) = (40.0, 20.0);

/// テンプレート上の2枚目の画像（H2、30×30）
pub const STAMP_ROW: u32 = 1;
pub const STAMP_COL: u16 = 7;

/// テンプレートの書式付き日付セル（A5）
pub const TEMPLATE_DATE_FORMAT: &str = "dd-mmm-yyyy";

/// 日付セルの書き方
pub enum DateCell {
    Text(&'static str),
    Native(u16, u8, u8),
    Empty,
}

pub struct Row {
    pub row: u32,
    pub date: DateCell,
    pub street: &'static str,
    pub priority: Option<f64>,
}

pub fn row(row: u32, date: DateCell, street: &'static str, priority: Option<f64>) -> Row {
    Row { row, date, street, priority }
}

/// 測定表を作成（行番号は1始まり、B=日付, C=通り名, F=優先度）
pub fn write_measurement(path: &Path, sheet_name: &str, rows: &[Row]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).unwrap();
    worksheet.write_string(0, 0, "PLANILHA DE MEDIÇÃO").unwrap();
    worksheet.write_string(5, 1, "DATA").unwrap();
    worksheet.write_string(5, 2, "RUA").unwrap();
    worksheet.write_string(5, 5, "PRIORIDADE").unwrap();

    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    for r in rows {
        let row = r.row - 1;
        match r.date {
            DateCell::Text(text) => {
                worksheet.write_string(row, 1, text).unwrap();
            }
            DateCell::Native(y, m, d) => {
                let date = ExcelDateTime::from_ymd(y, m, d).unwrap();
                worksheet.write_datetime_with_format(row, 1, &date, &date_format).unwrap();
            }
            DateCell::Empty => {}
        }
        if !r.street.is_empty() {
            worksheet.write_string(row, 2, r.street).unwrap();
        }
        if let Some(priority) = r.priority {
            worksheet.write_number(row, 5, priority).unwrap();
        }
    }

    workbook.save(path).unwrap();
}

/// PNG画像のバイト列
pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(color));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png).unwrap();
    buf
}

/// テンプレートブックを作成
///
/// 複製元シートには書式（太字の見出し・罫線だけのセル・独自の日付書式）、
/// 列幅・行高、任意でロゴとスタンプの2画像を置く。
/// 別シート "CAPA" の画像はロゴとして拾われてはいけない。
pub fn write_template(path: &Path, sheet_name: &str, with_logo: bool) {
    let mut workbook = Workbook::new();

    // 複製元より前にある別シートの大きな画像
    let cover = workbook.add_worksheet();
    cover.set_name("CAPA").unwrap();
    let cover_image = Image::new_from_buffer(&png_bytes(300, 300, [200, 30, 30])).unwrap();
    cover.insert_image(0, 0, &cover_image).unwrap();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).unwrap();
    let title = Format::new().set_bold().set_font_size(16);
    worksheet.write_string_with_format(2, 0, TEMPLATE_TITLE, &title).unwrap();
    worksheet.write_string(12, 9, "RUA:").unwrap();
    let label = Format::new().set_italic().set_border(FormatBorder::Thin);
    worksheet.merge_range(12, 10, 12, 13, "", &label).unwrap();
    worksheet.write_number(3, 0, 2024).unwrap();
    worksheet.write_formula(3, 1, "=A4+1").unwrap();
    let date = ExcelDateTime::from_ymd(2024, 3, 5).unwrap();
    let date_format = Format::new().set_num_format(TEMPLATE_DATE_FORMAT);
    worksheet.write_datetime_with_format(4, 0, &date, &date_format).unwrap();
    let boxed = Format::new().set_border(FormatBorder::Medium);
    worksheet.write_blank(13, 1, &boxed).unwrap();

    worksheet.set_column_width(0, 20).unwrap();
    worksheet.set_column_hidden(25).unwrap();
    worksheet.set_row_height(2, 30).unwrap();

    if with_logo {
        let logo = Image::new_from_buffer(&png_bytes(40, 20, [0, 90, 160])).unwrap();
        worksheet
            .insert_image_with_offset(LOGO_ROW, LOGO_COL, &logo, LOGO_OFFSET_X, 0)
            .unwrap();
        let stamp = Image::new_from_buffer(&png_bytes(30, 30, [0, 160, 90])).unwrap();
        worksheet.insert_image(STAMP_ROW, STAMP_COL, &stamp).unwrap();
    }

    // 複製対象ではないシート
    let other = workbook.add_worksheet();
    other.set_name("INSTRUÇÕES").unwrap();
    other.write_string(0, 0, "não copiar").unwrap();

    workbook.save(path).unwrap();
}

/// 写真フォルダ `<root>/<date>/<street>/<names>` を作成
pub fn write_photos(root: &Path, date: &str, street: &str, names: &[&str]) -> PathBuf {
    let dir = root.join(date).join(street);
    std::fs::create_dir_all(&dir).unwrap();
    for (i, name) in names.iter().enumerate() {
        // 拡張子から形式が決まる（.tif は TIFF）
        let path = dir.join(name);
        let img = image::RgbImage::from_pixel(8, 6, image::Rgb([30 * i as u8, 120, 60]));
        img.save(&path).unwrap();
    }
    dir
}

/// 出力ブックのシート名一覧
pub fn sheet_names(path: &Path) -> Vec<String> {
    use calamine::{open_workbook, Reader, Xlsx};
    let workbook: Xlsx<_> = open_workbook(path).unwrap();
    workbook.sheet_names()
}

/// 出力ブックのセル値（文字列のみ、0始まり）
pub fn cell_text(path: &Path, sheet: &str, row: u32, col: u32) -> Option<String> {
    use calamine::{open_workbook, Data, Reader, Xlsx};
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    match range.get_value((row, col)) {
        Some(Data::String(s)) => Some(s.clone()),
        _ => None,
    }
}

/// フォルダ内の .xlsx 出力（テンプレート以外）
pub fn reports_in(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with(prefix))
                .unwrap_or(false)
        })
        .collect();
    found.sort();
    found
}

/// 出力ブック内の部品（xl/styles.xml など）を文字列で読む
pub fn package_part(path: &Path, name: &str) -> String {
    use std::io::Read;
    let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut text = String::new();
    part.read_to_string(&mut text).unwrap();
    text
}

/// 画像の表示サイズ（px）がほぼ一致するか
pub fn approx_size(actual: Option<(f64, f64)>, expected: (f64, f64)) -> bool {
    match actual {
        Some((w, h)) => (w - expected.0).abs() <= 1.0 && (h - expected.1).abs() <= 1.0,
        None => false,
    }
}
