//! テンプレートシートの取り込み
//!
//! 雛形ブックから複製元シートを一度だけ読み出し、各シート作成時に使い回す。
//! - 値・数式・結合セル: calamine
//! - 書式・列幅・行高・画像とそのアンカー: パッケージのXML（`package`）
//!
//! ロゴは複製元シートの描画に含まれる最初の画像。
//! 読み込み用のブックはこの関数内で閉じる。

use super::package::{self, SheetImage, SheetLayout, SheetPackage};
use super::styles::StyleTable;
use crate::error::{ReportError, Result};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use photo_report_common::{CellRef, ReportConfig, StatusSink};
use rust_xlsxwriter::Format;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// セルの中身
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excelのシリアル値
    DateTime(f64),
    /// 先頭の "=" なし
    Formula(String),
}

/// 結合セル範囲（0始まり、両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRange {
    pub first: CellRef,
    pub last: CellRef,
}

impl MergedRange {
    pub fn contains(&self, cell: CellRef) -> bool {
        (self.first.row..=self.last.row).contains(&cell.row)
            && (self.first.col..=self.last.col).contains(&cell.col)
    }
}

/// 複製元シート
#[derive(Debug, Clone)]
pub struct TemplateSheet {
    pub name: String,
    pub cells: BTreeMap<(u32, u16), CellContent>,
    pub merges: Vec<MergedRange>,
    pub layout: SheetLayout,
    pub styles: StyleTable,
    /// 描画内の画像（出現順、先頭がロゴ）
    pub images: Vec<SheetImage>,
}

impl TemplateSheet {
    /// 雛形ブックを読み込む
    ///
    /// 複製元シートが無ければ `TemplateSheetMissing`。
    /// 書式・画像の読み取りに失敗しても処理は続ける（値と数式のみ複製）。
    pub fn load(path: &Path, config: &ReportConfig, sink: &mut dyn StatusSink) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::FileNotFound(path.display().to_string()));
        }

        sink.log("テンプレートファイルを読み込んでいます...");
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let name = config.template_sheet_name.clone();

        if !workbook.sheet_names().iter().any(|n| *n == name) {
            return Err(ReportError::TemplateSheetMissing(name));
        }

        let values = workbook.worksheet_range(&name)?;
        let formulas = match workbook.worksheet_formula(&name) {
            Ok(range) => Some(range),
            Err(e) => {
                debug!(error = %e, "数式を読み込めないため値のみ複製");
                None
            }
        };
        let merges = match workbook.load_merged_regions() {
            Ok(()) => workbook
                .merged_regions_by_sheet(&name)
                .into_iter()
                .map(|(_, _, dims)| MergedRange {
                    first: CellRef::new(dims.start.0, dims.start.1 as u16),
                    last: CellRef::new(dims.end.0, dims.end.1 as u16),
                })
                .collect(),
            Err(e) => {
                debug!(error = %e, "結合セルを読み込めません");
                Vec::new()
            }
        };

        let package = match package::read_sheet_package(path, &name) {
            Ok(package) => package,
            Err(e) => {
                sink.error(format!("テンプレートの書式・画像を読み込めません: {}", e));
                SheetPackage::default()
            }
        };
        debug!(
            columns = package.layout.columns.len(),
            rows = package.layout.rows.len(),
            styles = package.styles.len(),
            images = package.images.len(),
            "テンプレートのレイアウト"
        );

        match package.images.first() {
            Some(logo) => sink.log(format!(
                "ロゴ画像を検出しました。{} に複製します（画像{}枚）",
                logo.anchor,
                package.images.len()
            )),
            None => sink.log("テンプレートにロゴ画像が無いため、ロゴは複製しません"),
        }

        Ok(Self {
            cells: collect_cells(&values, formulas.as_ref()),
            name,
            merges,
            layout: package.layout,
            styles: package.styles,
            images: package.images,
        })
    }

    /// ロゴ（複製元シートの最初の画像）
    pub fn logo(&self) -> Option<&SheetImage> {
        self.images.first()
    }

    /// セルに設定された書式（既定書式のセルは `None`）
    pub fn format_at(&self, row: u32, col: u16) -> Option<&Format> {
        self.layout
            .cell_styles
            .get(&(row, col))
            .and_then(|&index| self.styles.format(index))
    }

    /// 結合範囲の左上以外（書き込むと結合が崩れるセル）
    pub fn is_hidden_by_merge(&self, cell: CellRef) -> bool {
        self.merges
            .iter()
            .any(|m| m.contains(cell) && m.first != cell)
    }
}

fn collect_cells(values: &Range<Data>, formulas: Option<&Range<String>>) -> BTreeMap<(u32, u16), CellContent> {
    let mut cells = BTreeMap::new();

    if let Some((row0, col0)) = values.start() {
        for (row, col, value) in values.used_cells() {
            let content = match value {
                Data::String(s) => CellContent::Text(s.clone()),
                Data::Float(f) => CellContent::Number(*f),
                Data::Int(i) => CellContent::Number(*i as f64),
                Data::Bool(b) => CellContent::Bool(*b),
                Data::DateTime(dt) => CellContent::DateTime(dt.as_f64()),
                Data::DateTimeIso(s) | Data::DurationIso(s) => CellContent::Text(s.clone()),
                _ => continue,
            };
            cells.insert((row0 + row as u32, (col0 + col as u32) as u16), content);
        }
    }

    // 数式は値（キャッシュ）より優先
    if let Some(formulas) = formulas {
        if let Some((row0, col0)) = formulas.start() {
            for (row, col, formula) in formulas.used_cells() {
                if formula.is_empty() {
                    continue;
                }
                cells.insert(
                    (row0 + row as u32, (col0 + col as u32) as u16),
                    CellContent::Formula(formula.clone()),
                );
            }
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_range_contains() {
        let merge = MergedRange {
            first: CellRef::new(12, 10),
            last: CellRef::new(12, 14),
        };
        assert!(merge.contains(CellRef::new(12, 10)));
        assert!(merge.contains(CellRef::new(12, 14)));
        assert!(!merge.contains(CellRef::new(13, 10)));
        assert!(!merge.contains(CellRef::new(12, 9)));
    }

    #[test]
    fn test_collect_cells_uses_absolute_positions() {
        let mut values: Range<Data> = Range::new((2, 1), (3, 2));
        values.set_value((2, 1), Data::String("Relatório".into()));
        values.set_value((3, 2), Data::Float(4.5));

        let mut formulas: Range<String> = Range::new((3, 1), (3, 1));
        formulas.set_value((3, 1), "SUM(C4:C5)".to_string());

        let cells = collect_cells(&values, Some(&formulas));
        assert_eq!(cells.get(&(2, 1)), Some(&CellContent::Text("Relatório".into())));
        assert_eq!(cells.get(&(3, 2)), Some(&CellContent::Number(4.5)));
        assert_eq!(cells.get(&(3, 1)), Some(&CellContent::Formula("SUM(C4:C5)".into())));
    }

    #[test]
    fn test_hidden_by_merge() {
        let template = TemplateSheet {
            name: "MODELO".into(),
            cells: BTreeMap::new(),
            merges: vec![MergedRange {
                first: CellRef::new(0, 0),
                last: CellRef::new(1, 1),
            }],
            layout: SheetLayout::default(),
            styles: StyleTable::default(),
            images: Vec::new(),
        };
        assert!(!template.is_hidden_by_merge(CellRef::new(0, 0)));
        assert!(template.is_hidden_by_merge(CellRef::new(1, 1)));
        assert!(!template.is_hidden_by_merge(CellRef::new(2, 0)));
    }
}
