//! テンプレートのセル書式（xl/styles.xml）
//!
//! cellXfs の各項目を `rust_xlsxwriter::Format` に組み立て直す。
//! 対応: 表示形式、フォント（太字・斜体・下線・取消線・サイズ・名前・RGB色）、
//! 塗りつぶし、罫線、配置（横・縦・折り返し・インデント・回転）。
//! テーマ色・インデックス色は読まない（既定色になる）。

use super::package::{attr, is_true};
use crate::error::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, FormatPattern, FormatUnderline};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
struct FontDef {
    bold: bool,
    italic: bool,
    underline: Option<String>,
    strike: bool,
    size: Option<f64>,
    name: Option<String>,
    color: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct FillDef {
    pattern: Option<String>,
    fg: Option<u32>,
    bg: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct BorderSide {
    style: Option<String>,
    color: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct BorderDef {
    left: BorderSide,
    right: BorderSide,
    top: BorderSide,
    bottom: BorderSide,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct XfDef {
    num_fmt_id: u32,
    font_id: usize,
    fill_id: usize,
    border_id: usize,
    horizontal: Option<String>,
    vertical: Option<String>,
    wrap: bool,
    indent: u8,
    rotation: i16,
}

/// styles.xml の読み取り結果（書式組み立て前）
#[derive(Debug, Default)]
struct RawStyles {
    num_fmts: HashMap<u32, String>,
    fonts: Vec<FontDef>,
    fills: Vec<FillDef>,
    borders: Vec<BorderDef>,
    xfs: Vec<XfDef>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// `FF1F4E79` → 0x1F4E79
fn parse_rgb(value: &str) -> Option<u32> {
    let hex = value.get(value.len().checked_sub(6)?..)?;
    u32::from_str_radix(hex, 16).ok()
}

fn rgb_attr(e: &BytesStart) -> Option<u32> {
    attr(e, b"rgb").and_then(|v| parse_rgb(&v))
}

/// `<b/>` は val 省略で真、`<b val="0"/>` は偽
fn flag(e: &BytesStart) -> bool {
    !matches!(attr(e, b"val").as_deref(), Some("0") | Some("false"))
}

fn parse_raw(xml: &[u8]) -> Result<RawStyles> {
    let mut raw = RawStyles::default();
    let mut section: Option<Section> = None;
    let mut side: Option<Side> = None;

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => read_element(&mut raw, &mut section, &mut side, &e, true),
            Event::Empty(e) => read_element(&mut raw, &mut section, &mut side, &e, false),
            Event::End(e) => match e.local_name().as_ref() {
                b"numFmts" | b"fonts" | b"fills" | b"borders" | b"cellXfs" => section = None,
                b"left" | b"right" | b"top" | b"bottom" | b"start" | b"end" => side = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(raw)
}

/// 開始タグ・空要素1つ分
///
/// `section` の外（cellStyleXfs・dxfs など）の要素は読まない。
fn read_element(
    raw: &mut RawStyles,
    section: &mut Option<Section>,
    side: &mut Option<Side>,
    e: &BytesStart,
    is_start: bool,
) {
    match (*section, e.local_name().as_ref()) {
        (_, b"numFmts") if is_start => *section = Some(Section::NumFmts),
        (_, b"fonts") if is_start => *section = Some(Section::Fonts),
        (_, b"fills") if is_start => *section = Some(Section::Fills),
        (_, b"borders") if is_start => *section = Some(Section::Borders),
        (_, b"cellXfs") if is_start => *section = Some(Section::CellXfs),

        (Some(Section::NumFmts), b"numFmt") => {
            if let (Some(id), Some(code)) = (
                attr(e, b"numFmtId").and_then(|v| v.parse().ok()),
                attr(e, b"formatCode"),
            ) {
                raw.num_fmts.insert(id, code);
            }
        }

        (Some(Section::Fonts), b"font") => raw.fonts.push(FontDef::default()),
        (Some(Section::Fonts), name) => {
            if let Some(font) = raw.fonts.last_mut() {
                match name {
                    b"b" => font.bold = flag(e),
                    b"i" => font.italic = flag(e),
                    b"strike" => font.strike = flag(e),
                    b"u" => font.underline = Some(attr(e, b"val").unwrap_or_else(|| "single".into())),
                    b"sz" => font.size = attr(e, b"val").and_then(|v| v.parse().ok()),
                    b"name" => font.name = attr(e, b"val"),
                    b"color" => font.color = rgb_attr(e),
                    _ => {}
                }
            }
        }

        (Some(Section::Fills), b"fill") => raw.fills.push(FillDef::default()),
        (Some(Section::Fills), name) => {
            if let Some(fill) = raw.fills.last_mut() {
                match name {
                    b"patternFill" => fill.pattern = attr(e, b"patternType"),
                    b"fgColor" => fill.fg = rgb_attr(e),
                    b"bgColor" => fill.bg = rgb_attr(e),
                    _ => {}
                }
            }
        }

        (Some(Section::Borders), b"border") => raw.borders.push(BorderDef::default()),
        (Some(Section::Borders), name) => {
            if let Some(border) = raw.borders.last_mut() {
                let this_side = match name {
                    b"left" | b"start" => Some(Side::Left),
                    b"right" | b"end" => Some(Side::Right),
                    b"top" => Some(Side::Top),
                    b"bottom" => Some(Side::Bottom),
                    _ => None,
                };
                if let Some(s) = this_side {
                    border_side(border, s).style = attr(e, b"style");
                    if is_start {
                        *side = Some(s);
                    }
                } else if name == b"color" {
                    if let Some(s) = *side {
                        border_side(border, s).color = rgb_attr(e);
                    }
                }
            }
        }

        (Some(Section::CellXfs), b"xf") => raw.xfs.push(XfDef {
            num_fmt_id: attr(e, b"numFmtId").and_then(|v| v.parse().ok()).unwrap_or(0),
            font_id: attr(e, b"fontId").and_then(|v| v.parse().ok()).unwrap_or(0),
            fill_id: attr(e, b"fillId").and_then(|v| v.parse().ok()).unwrap_or(0),
            border_id: attr(e, b"borderId").and_then(|v| v.parse().ok()).unwrap_or(0),
            ..XfDef::default()
        }),
        (Some(Section::CellXfs), b"alignment") => {
            if let Some(xf) = raw.xfs.last_mut() {
                xf.horizontal = attr(e, b"horizontal");
                xf.vertical = attr(e, b"vertical");
                xf.wrap = is_true(attr(e, b"wrapText"));
                xf.indent = attr(e, b"indent").and_then(|v| v.parse().ok()).unwrap_or(0);
                xf.rotation = attr(e, b"textRotation").and_then(|v| v.parse().ok()).unwrap_or(0);
            }
        }

        _ => {}
    }
}

fn border_side(border: &mut BorderDef, side: Side) -> &mut BorderSide {
    match side {
        Side::Left => &mut border.left,
        Side::Right => &mut border.right,
        Side::Top => &mut border.top,
        Side::Bottom => &mut border.bottom,
    }
}

fn border_style(style: &str) -> Option<FormatBorder> {
    Some(match style {
        "thin" => FormatBorder::Thin,
        "medium" => FormatBorder::Medium,
        "dashed" => FormatBorder::Dashed,
        "dotted" => FormatBorder::Dotted,
        "thick" => FormatBorder::Thick,
        "double" => FormatBorder::Double,
        "hair" => FormatBorder::Hair,
        "mediumDashed" => FormatBorder::MediumDashed,
        "dashDot" => FormatBorder::DashDot,
        "mediumDashDot" => FormatBorder::MediumDashDot,
        "dashDotDot" => FormatBorder::DashDotDot,
        "mediumDashDotDot" => FormatBorder::MediumDashDotDot,
        "slantDashDot" => FormatBorder::SlantDashDot,
        _ => return None,
    })
}

fn fill_pattern(pattern: &str) -> Option<FormatPattern> {
    Some(match pattern {
        "solid" => FormatPattern::Solid,
        "mediumGray" => FormatPattern::MediumGray,
        "darkGray" => FormatPattern::DarkGray,
        "lightGray" => FormatPattern::LightGray,
        "darkHorizontal" => FormatPattern::DarkHorizontal,
        "darkVertical" => FormatPattern::DarkVertical,
        "darkDown" => FormatPattern::DarkDown,
        "darkUp" => FormatPattern::DarkUp,
        "darkGrid" => FormatPattern::DarkGrid,
        "darkTrellis" => FormatPattern::DarkTrellis,
        "lightHorizontal" => FormatPattern::LightHorizontal,
        "lightVertical" => FormatPattern::LightVertical,
        "lightDown" => FormatPattern::LightDown,
        "lightUp" => FormatPattern::LightUp,
        "lightGrid" => FormatPattern::LightGrid,
        "lightTrellis" => FormatPattern::LightTrellis,
        "gray125" => FormatPattern::Gray125,
        "gray0625" => FormatPattern::Gray0625,
        _ => return None,
    })
}

fn horizontal_align(value: &str) -> Option<FormatAlign> {
    Some(match value {
        "left" => FormatAlign::Left,
        "center" => FormatAlign::Center,
        "right" => FormatAlign::Right,
        "fill" => FormatAlign::Fill,
        "justify" => FormatAlign::Justify,
        "centerContinuous" => FormatAlign::CenterAcross,
        "distributed" => FormatAlign::Distributed,
        _ => return None,
    })
}

fn vertical_align(value: &str) -> Option<FormatAlign> {
    Some(match value {
        "top" => FormatAlign::Top,
        "center" => FormatAlign::VerticalCenter,
        "bottom" => FormatAlign::Bottom,
        "justify" => FormatAlign::VerticalJustify,
        "distributed" => FormatAlign::VerticalDistributed,
        _ => return None,
    })
}

fn build_format(raw: &RawStyles, xf: &XfDef) -> Format {
    let mut format = Format::new();

    if let Some(code) = raw.num_fmts.get(&xf.num_fmt_id) {
        format = format.set_num_format(code);
    } else if let Ok(index) = u8::try_from(xf.num_fmt_id) {
        if index != 0 {
            format = format.set_num_format_index(index);
        }
    }

    if let Some(font) = raw.fonts.get(xf.font_id) {
        if font.bold {
            format = format.set_bold();
        }
        if font.italic {
            format = format.set_italic();
        }
        if font.strike {
            format = format.set_font_strikethrough();
        }
        match font.underline.as_deref() {
            Some("single") => format = format.set_underline(FormatUnderline::Single),
            Some("double") => format = format.set_underline(FormatUnderline::Double),
            Some("singleAccounting") => format = format.set_underline(FormatUnderline::SingleAccounting),
            Some("doubleAccounting") => format = format.set_underline(FormatUnderline::DoubleAccounting),
            _ => {}
        }
        if let Some(size) = font.size {
            format = format.set_font_size(size);
        }
        if let Some(name) = &font.name {
            format = format.set_font_name(name);
        }
        if let Some(rgb) = font.color {
            format = format.set_font_color(Color::RGB(rgb));
        }
    }

    if let Some(fill) = raw.fills.get(xf.fill_id) {
        match fill.pattern.as_deref().and_then(fill_pattern) {
            // 単色塗りは前景色がセルの色
            Some(FormatPattern::Solid) => {
                format = format.set_pattern(FormatPattern::Solid);
                if let Some(rgb) = fill.fg {
                    format = format.set_background_color(Color::RGB(rgb));
                }
            }
            Some(pattern) => {
                format = format.set_pattern(pattern);
                if let Some(rgb) = fill.fg {
                    format = format.set_foreground_color(Color::RGB(rgb));
                }
                if let Some(rgb) = fill.bg {
                    format = format.set_background_color(Color::RGB(rgb));
                }
            }
            None => {}
        }
    }

    if let Some(border) = raw.borders.get(xf.border_id) {
        if let Some(style) = border.left.style.as_deref().and_then(border_style) {
            format = format.set_border_left(style);
            if let Some(rgb) = border.left.color {
                format = format.set_border_left_color(Color::RGB(rgb));
            }
        }
        if let Some(style) = border.right.style.as_deref().and_then(border_style) {
            format = format.set_border_right(style);
            if let Some(rgb) = border.right.color {
                format = format.set_border_right_color(Color::RGB(rgb));
            }
        }
        if let Some(style) = border.top.style.as_deref().and_then(border_style) {
            format = format.set_border_top(style);
            if let Some(rgb) = border.top.color {
                format = format.set_border_top_color(Color::RGB(rgb));
            }
        }
        if let Some(style) = border.bottom.style.as_deref().and_then(border_style) {
            format = format.set_border_bottom(style);
            if let Some(rgb) = border.bottom.color {
                format = format.set_border_bottom_color(Color::RGB(rgb));
            }
        }
    }

    if let Some(align) = xf.horizontal.as_deref().and_then(horizontal_align) {
        format = format.set_align(align);
    }
    if let Some(align) = xf.vertical.as_deref().and_then(vertical_align) {
        format = format.set_align(align);
    }
    if xf.wrap {
        format = format.set_text_wrap();
    }
    if xf.indent > 0 {
        format = format.set_indent(xf.indent);
    }
    if xf.rotation != 0 {
        format = format.set_rotation(xf.rotation);
    }

    format
}

/// cellXfs 番号 → 書式
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    formats: Vec<Format>,
}

impl StyleTable {
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let raw = parse_raw(xml)?;
        let formats = raw.xfs.iter().map(|xf| build_format(&raw, xf)).collect();
        Ok(Self { formats })
    }

    pub fn format(&self, index: u32) -> Option<&Format> {
        self.formats.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
