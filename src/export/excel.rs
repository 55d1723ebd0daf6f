//! シート1枚分の書き込み
//!
//! テンプレートの内容（書式・列幅・行高・画像込み）を複製し、通り名と写真を配置する。
//! 写真1枚の失敗は警告に留め、シート自体は作成済みとして扱う。

use super::package::SheetImage;
use super::template::{CellContent, TemplateSheet};
use photo_report_common::{CellRef, EligibleItem, ReportConfig, StatusSink};
use rust_xlsxwriter::{Format, Image, ObjectMovement, Worksheet, XlsxError};
use std::io::Cursor;
use std::path::Path;

/// 書式の無い日付セル用
const FALLBACK_DATE_FORMAT: &str = "dd/mm/yyyy";

/// 画像バイト列から埋め込み用の画像を作る
///
/// rust_xlsxwriter が直接扱えない形式（TIFF・WebPなど）はPNGに変換してから読む。
pub fn load_image(data: &[u8]) -> Result<Image, XlsxError> {
    match Image::new_from_buffer(data) {
        Ok(image) => Ok(image),
        Err(original) => {
            let decoded = image::load_from_memory(data).map_err(|_| original)?;
            let mut png = Cursor::new(Vec::new());
            decoded
                .write_to(&mut png, image::ImageFormat::Png)
                .map_err(|e| XlsxError::ParameterError(format!("PNGへの変換に失敗: {}", e)))?;
            Image::new_from_buffer(png.get_ref())
        }
    }
}

/// 列幅・行高・非表示の指定を写す
fn apply_layout(worksheet: &mut Worksheet, template: &TemplateSheet) -> Result<(), XlsxError> {
    for column in &template.layout.columns {
        for col in column.first..=column.last {
            if let Some(width) = column.width_px {
                worksheet.set_column_width_pixels(col, width)?;
            }
            if column.hidden {
                worksheet.set_column_hidden(col)?;
            }
        }
    }

    for row in &template.layout.rows {
        if let Some(height) = row.height_pt {
            worksheet.set_row_height(row.row, height)?;
        }
        if row.hidden {
            worksheet.set_row_hidden(row.row)?;
        }
    }

    Ok(())
}

/// テンプレートの値・数式・結合セル・書式・列幅・行高を書き込む
pub fn write_template_content(worksheet: &mut Worksheet, template: &TemplateSheet) -> Result<(), XlsxError> {
    let plain = Format::new();

    apply_layout(worksheet, template)?;

    for merge in &template.merges {
        if merge.first == merge.last {
            continue;
        }
        let format = template.format_at(merge.first.row, merge.first.col).unwrap_or(&plain);
        worksheet.merge_range(
            merge.first.row,
            merge.first.col,
            merge.last.row,
            merge.last.col,
            "",
            format,
        )?;
    }

    for (&(row, col), content) in &template.cells {
        if template.is_hidden_by_merge(CellRef::new(row, col)) {
            continue;
        }
        let format = template.format_at(row, col);
        match content {
            CellContent::Text(text) => {
                worksheet.write_string_with_format(row, col, text, format.unwrap_or(&plain))?;
            }
            CellContent::Number(value) => {
                worksheet.write_number_with_format(row, col, *value, format.unwrap_or(&plain))?;
            }
            CellContent::Bool(value) => {
                worksheet.write_boolean_with_format(row, col, *value, format.unwrap_or(&plain))?;
            }
            CellContent::DateTime(serial) => {
                let fallback;
                let format = match format {
                    Some(format) => format,
                    None => {
                        fallback = Format::new().set_num_format(FALLBACK_DATE_FORMAT);
                        &fallback
                    }
                };
                worksheet.write_number_with_format(row, col, *serial, format)?;
            }
            CellContent::Formula(formula) => {
                worksheet.write_formula_with_format(row, col, formula.as_str(), format.unwrap_or(&plain))?;
            }
        }
    }

    // 値の無い書式だけのセル（罫線・塗りつぶし）
    for (&(row, col), &index) in &template.layout.cell_styles {
        if template.cells.contains_key(&(row, col)) || template.is_hidden_by_merge(CellRef::new(row, col)) {
            continue;
        }
        if let Some(format) = template.styles.format(index) {
            worksheet.write_blank(row, col, format)?;
        }
    }

    Ok(())
}

/// テンプレートの画像を元の位置・大きさで貼る
fn insert_template_image(worksheet: &mut Worksheet, picture: &SheetImage) -> Result<(), XlsxError> {
    let image = load_image(&picture.data)?;
    let (width, height) = picture.size_px.unwrap_or((image.width(), image.height()));
    let image = image.set_scale_to_size(width, height, false);

    worksheet.insert_image_with_offset(
        picture.anchor.row,
        picture.anchor.col,
        &image,
        picture.offset_px.0,
        picture.offset_px.1,
    )?;
    Ok(())
}

/// テンプレートの画像（ロゴ含む）をすべて貼る
///
/// 画像は毎回バイト列から新しく作る。失敗は通知のみ。
pub fn write_template_images(worksheet: &mut Worksheet, template: &TemplateSheet, sink: &mut dyn StatusSink) {
    for (i, picture) in template.images.iter().enumerate() {
        if let Err(e) = insert_template_image(worksheet, picture) {
            let what = if i == 0 { "ロゴ" } else { "テンプレート画像" };
            sink.error(format!(
                "シート '{}' への{}再挿入に失敗（{}）: {}",
                worksheet.name(),
                what,
                picture.anchor,
                e
            ));
        }
    }
}

/// 報告シートを1枚作成
///
/// テンプレート複製と通り名の書き込みの失敗は呼び出し元に返す。
/// ロゴ・写真の貼り付け失敗は通知のみ。
pub fn write_report_sheet(
    worksheet: &mut Worksheet,
    template: &TemplateSheet,
    item: &EligibleItem,
    config: &ReportConfig,
    sink: &mut dyn StatusSink,
) -> Result<(), XlsxError> {
    write_template_content(worksheet, template)?;

    let label = config.street_label_cell;
    let plain = Format::new();
    let label_format = template.format_at(label.row, label.col).unwrap_or(&plain);
    worksheet.write_string_with_format(label.row, label.col, &item.record.street_name, label_format)?;

    write_template_images(worksheet, template, sink);

    let sheet_name = worksheet.name();
    for (path, anchor) in item.photos.paths().iter().zip(&config.photo_anchors) {
        if let Err(e) = insert_photo(worksheet, path, *anchor, config) {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            sink.error(format!(
                "写真 '{}' をシート '{}' に追加できません: {}",
                file_name, sheet_name, e
            ));
        }
    }

    Ok(())
}

fn insert_photo(worksheet: &mut Worksheet, path: &Path, anchor: CellRef, config: &ReportConfig) -> Result<(), XlsxError> {
    let data = std::fs::read(path)?;
    let image = load_image(&data)?
        .set_scale_to_size(config.photo_width_px, config.photo_height_px, false)
        .set_object_movement(ObjectMovement::DontMoveOrSizeWithCells);

    worksheet.insert_image(anchor.row, anchor.col, &image)?;
    Ok(())
}
