//! xlsxパッケージ（zip内のXML）の直接読み取り
//!
//! calamine はセルの値しか返さないため、テンプレートの見た目に関わる部分
//! （列幅・行高さ・セルの書式番号・描画の画像とアンカー）はここで読む。
//!
//! 読む部品:
//! - `xl/workbook.xml` と rels: シート名 → シートXMLのパス
//! - シートXML: `<cols>`, `<row>`, `<c s=..>`, `<drawing r:id=..>`
//! - 描画XML: `<xdr:twoCellAnchor>` などの `<xdr:from>`, `<a:ext>`, `<a:blip r:embed>`
//! - `xl/styles.xml`（[`super::styles`]）

use super::styles::StyleTable;
use crate::error::{ReportError, Result};
use photo_report_common::CellRef;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

/// 1pxあたりのEMU
pub const EMU_PER_PX: f64 = 9525.0;

/// 列の幅・表示（0始まり、両端を含む）
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub first: u16,
    pub last: u16,
    pub width_px: Option<u16>,
    pub hidden: bool,
}

/// 行の高さ・表示（0始まり）
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub row: u32,
    pub height_pt: Option<f64>,
    pub hidden: bool,
}

/// シートの見た目に関わる設定
#[derive(Debug, Clone, Default)]
pub struct SheetLayout {
    pub columns: Vec<ColumnLayout>,
    pub rows: Vec<RowLayout>,
    /// セル位置 → styles.xml の cellXfs 番号（0 は省略）
    pub cell_styles: BTreeMap<(u32, u16), u32>,
}

/// シートに貼られた画像
#[derive(Debug, Clone)]
pub struct SheetImage {
    pub data: Vec<u8>,
    pub anchor: CellRef,
    /// アンカーセル左上からのずれ（px）
    pub offset_px: (u32, u32),
    /// 表示サイズ（px）。描画に無ければ `None`
    pub size_px: Option<(f64, f64)>,
}

/// テンプレートシート1枚分の部品
#[derive(Debug, Clone, Default)]
pub struct SheetPackage {
    pub layout: SheetLayout,
    pub styles: StyleTable,
    pub images: Vec<SheetImage>,
}

/// ブックから指定シートの部品を読む
pub fn read_sheet_package(path: &Path, sheet_name: &str) -> Result<SheetPackage> {
    let mut archive = ZipArchive::new(File::open(path)?)?;

    let workbook_path = office_document_path(&mut archive)?;
    let sheet_path = sheet_part_path(&mut archive, &workbook_path, sheet_name)?
        .ok_or_else(|| ReportError::SheetNotFound(sheet_name.to_string()))?;

    let sheet_xml = read_part(&mut archive, &sheet_path)?
        .ok_or_else(|| ReportError::Spreadsheet(format!("'{}' がパッケージ内にありません", sheet_path)))?;
    let (layout, drawing_rel) = parse_worksheet(&sheet_xml)?;

    let images = match drawing_rel {
        Some(rel_id) => {
            let sheet_rels = read_relationships(&mut archive, &sheet_path)?;
            match sheet_rels.get(&rel_id) {
                Some(target) => {
                    let drawing_path = resolve_target(&sheet_path, target);
                    read_drawing_images(&mut archive, &drawing_path)?
                }
                None => Vec::new(),
            }
        }
        None => Vec::new(),
    };

    let styles_path = resolve_target(&workbook_path, "styles.xml");
    let styles = match read_part(&mut archive, &styles_path)? {
        Some(xml) => StyleTable::parse(&xml)?,
        None => StyleTable::default(),
    };

    Ok(SheetPackage { layout, styles, images })
}

// ============================================
// zip・パス
// ============================================

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            Ok(Some(buf))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// `xl/worksheets/sheet1.xml` → `xl/worksheets/_rels/sheet1.xml.rels`
fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// 部品からの相対ターゲットをパッケージ内の絶対パスにする
fn resolve_target(base_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match base_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn read_relationships<R: Read + Seek>(archive: &mut ZipArchive<R>, part: &str) -> Result<HashMap<String, String>> {
    match read_part(archive, &rels_path(part))? {
        Some(xml) => parse_relationships(&xml),
        None => Ok(HashMap::new()),
    }
}

fn office_document_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let Some(xml) = read_part(archive, "_rels/.rels")? else {
        return Ok("xl/workbook.xml".to_string());
    };

    let mut reader = Reader::from_reader(xml.as_slice());
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let is_document = attr(&e, b"Type")
                    .map(|t| t.ends_with("/officeDocument"))
                    .unwrap_or(false);
                if is_document {
                    if let Some(target) = attr(&e, b"Target") {
                        return Ok(resolve_target("", &target));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok("xl/workbook.xml".to_string())
}

fn sheet_part_path<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    workbook_path: &str,
    sheet_name: &str,
) -> Result<Option<String>> {
    let Some(xml) = read_part(archive, workbook_path)? else {
        return Ok(None);
    };

    let mut rel_id = None;
    let mut reader = Reader::from_reader(xml.as_slice());
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if attr(&e, b"name").as_deref() == Some(sheet_name) {
                    rel_id = attr(&e, b"id");
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let Some(rel_id) = rel_id else {
        return Ok(None);
    };
    let rels = read_relationships(archive, workbook_path)?;
    Ok(rels.get(&rel_id).map(|target| resolve_target(workbook_path, target)))
}

// ============================================
// XML
// ============================================

/// 名前空間接頭辞を無視して属性を取り出す
pub(crate) fn attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| {
            let decoded = std::str::from_utf8(&a.value).ok()?;
            quick_xml::escape::unescape(decoded).ok().map(|v| v.into_owned())
        })
}

pub(crate) fn is_true(value: Option<String>) -> bool {
    matches!(value.as_deref(), Some("1") | Some("true"))
}

/// rels: Id → Target（外部リンクは除く）
fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>> {
    let mut rels = HashMap::new();
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let external = attr(&e, b"TargetMode").as_deref() == Some("External");
                if let (false, Some(id), Some(target)) = (external, attr(&e, b"Id"), attr(&e, b"Target")) {
                    rels.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// Excelの列幅（文字数単位）をpxに（Calibri 11 の最大桁幅7px）
fn column_width_to_px(width: f64) -> u16 {
    (width * 7.0 + 0.5).floor().clamp(0.0, u16::MAX as f64) as u16
}

/// シートXMLから列幅・行高さ・セル書式番号・描画の参照を読む
fn parse_worksheet(xml: &[u8]) -> Result<(SheetLayout, Option<String>)> {
    let mut layout = SheetLayout::default();
    let mut drawing = None;

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"col" => {
                    let first = attr(&e, b"min").and_then(|v| v.parse::<u16>().ok());
                    let last = attr(&e, b"max").and_then(|v| v.parse::<u16>().ok());
                    if let (Some(first), Some(last)) = (first, last) {
                        if first >= 1 && last >= first {
                            layout.columns.push(ColumnLayout {
                                first: first - 1,
                                last: last.min(16384) - 1,
                                width_px: attr(&e, b"width")
                                    .and_then(|v| v.parse::<f64>().ok())
                                    .map(column_width_to_px),
                                hidden: is_true(attr(&e, b"hidden")),
                            });
                        }
                    }
                }
                b"row" => {
                    let row = attr(&e, b"r").and_then(|v| v.parse::<u32>().ok()).filter(|r| *r >= 1);
                    let height_pt = attr(&e, b"ht").and_then(|v| v.parse::<f64>().ok());
                    let hidden = is_true(attr(&e, b"hidden"));
                    if let (Some(row), true) = (row, height_pt.is_some() || hidden) {
                        layout.rows.push(RowLayout {
                            row: row - 1,
                            height_pt,
                            hidden,
                        });
                    }
                }
                b"c" => {
                    let style = attr(&e, b"s").and_then(|v| v.parse::<u32>().ok()).unwrap_or(0);
                    if style != 0 {
                        if let Some(cell) = attr(&e, b"r").and_then(|r| r.parse::<CellRef>().ok()) {
                            layout.cell_styles.insert((cell.row, cell.col), style);
                        }
                    }
                }
                b"drawing" => {
                    drawing = attr(&e, b"id");
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((layout, drawing))
}

/// 描画アンカー1件分の読み取り途中の値
#[derive(Debug, Default)]
struct AnchorDraft {
    col: u32,
    row: u32,
    col_off: i64,
    row_off: i64,
    ext: Option<(i64, i64)>,
    embed: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FromField {
    Col,
    ColOff,
    Row,
    RowOff,
}

/// 描画に置かれた画像（文書順）
#[derive(Debug, Clone, PartialEq)]
struct DrawingPicture {
    rel_id: String,
    anchor: CellRef,
    offset_px: (u32, u32),
    size_px: Option<(f64, f64)>,
}

fn emu_to_px(emu: i64) -> f64 {
    emu.max(0) as f64 / EMU_PER_PX
}

fn parse_drawing(xml: &[u8]) -> Result<Vec<DrawingPicture>> {
    let mut pictures = Vec::new();
    let mut draft: Option<AnchorDraft> = None;
    let mut in_from = false;
    let mut field: Option<FromField> = None;

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"twoCellAnchor" | b"oneCellAnchor" | b"absoluteAnchor" => draft = Some(AnchorDraft::default()),
                b"from" => in_from = true,
                b"col" if in_from => field = Some(FromField::Col),
                b"colOff" if in_from => field = Some(FromField::ColOff),
                b"row" if in_from => field = Some(FromField::Row),
                b"rowOff" if in_from => field = Some(FromField::RowOff),
                name => read_anchor_attrs(name, &e, draft.as_mut()),
            },
            Event::Empty(e) => read_anchor_attrs(e.local_name().as_ref(), &e, draft.as_mut()),
            Event::Text(t) => {
                if let (Some(f), Some(d)) = (field, draft.as_mut()) {
                    let value = t.unescape()?.trim().parse::<i64>().unwrap_or(0);
                    match f {
                        FromField::Col => d.col = value.max(0) as u32,
                        FromField::ColOff => d.col_off = value,
                        FromField::Row => d.row = value.max(0) as u32,
                        FromField::RowOff => d.row_off = value,
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"from" => in_from = false,
                b"col" | b"colOff" | b"row" | b"rowOff" => field = None,
                b"twoCellAnchor" | b"oneCellAnchor" | b"absoluteAnchor" => {
                    if let Some(d) = draft.take() {
                        if let Some(rel_id) = d.embed {
                            pictures.push(DrawingPicture {
                                rel_id,
                                anchor: CellRef::new(d.row, d.col.min(u16::MAX as u32) as u16),
                                offset_px: (emu_to_px(d.col_off).round() as u32, emu_to_px(d.row_off).round() as u32),
                                size_px: d.ext.map(|(cx, cy)| (emu_to_px(cx), emu_to_px(cy))),
                            });
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(pictures)
}

/// アンカー内の属性だけで決まる要素（サイズ・位置・画像参照）
fn read_anchor_attrs(name: &[u8], e: &BytesStart, draft: Option<&mut AnchorDraft>) {
    let Some(d) = draft else {
        return;
    };
    match name {
        // `<a:extLst><a:ext uri=..>` は cx を持たないので除外される
        b"ext" if d.ext.is_none() => {
            let cx = attr(e, b"cx").and_then(|v| v.parse::<i64>().ok());
            let cy = attr(e, b"cy").and_then(|v| v.parse::<i64>().ok());
            if let (Some(cx), Some(cy)) = (cx, cy) {
                d.ext = Some((cx, cy));
            }
        }
        // absoluteAnchor はA1からのずれとして扱う
        b"pos" => {
            d.col_off = attr(e, b"x").and_then(|v| v.parse().ok()).unwrap_or(0);
            d.row_off = attr(e, b"y").and_then(|v| v.parse().ok()).unwrap_or(0);
        }
        b"blip" if d.embed.is_none() => d.embed = attr(e, b"embed"),
        _ => {}
    }
}

fn read_drawing_images<R: Read + Seek>(archive: &mut ZipArchive<R>, drawing_path: &str) -> Result<Vec<SheetImage>> {
    let Some(xml) = read_part(archive, drawing_path)? else {
        return Ok(Vec::new());
    };
    let pictures = parse_drawing(&xml)?;
    let rels = read_relationships(archive, drawing_path)?;

    let mut images = Vec::new();
    for picture in pictures {
        let Some(target) = rels.get(&picture.rel_id) else {
            continue;
        };
        let media_path = resolve_target(drawing_path, target);
        if let Some(data) = read_part(archive, &media_path)? {
            images.push(SheetImage {
                data,
                anchor: picture.anchor,
                offset_px: picture.offset_px,
                size_px: picture.size_px,
            });
        }
    }
    Ok(images)
}
