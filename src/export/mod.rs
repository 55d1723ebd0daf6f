pub mod excel;
pub mod package;
pub mod styles;
pub mod template;

use crate::error::Result;
use chrono::Local;
use photo_report_common::{EligibleItem, ReportConfig, SheetNamer, StatusSink, Step};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use template::TemplateSheet;

/// 報告書作成の結果
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub sheets_created: usize,
    pub output_path: PathBuf,
}

/// 出力ファイルのパス（テンプレートと同じフォルダ）
pub fn output_path_for(template_path: &Path, prefix: &str, timestamp: &str) -> PathBuf {
    let parent = template_path.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{}{}.xlsx", prefix, timestamp))
}

/// 選定済みの項目から報告書ブックを作成
///
/// 1項目につきテンプレートを複製したシートを1枚作る。
/// テンプレート自体は1枚以上作成できた場合は出力に含めない。
pub fn build_report(
    items: &[EligibleItem],
    template_path: &Path,
    config: &ReportConfig,
    sink: &mut dyn StatusSink,
) -> Result<ReportOutcome> {
    let template = TemplateSheet::load(template_path, config, sink)?;

    let mut workbook = Workbook::new();
    let mut namer = SheetNamer::new(config.sheet_name_max_len);
    // テンプレートが残っている間は同名のシートは作れない
    namer.reserve(&template.name);

    let total = items.len();
    let mut sheets_created = 0;

    for (i, item) in items.iter().enumerate() {
        sink.progress(
            format!("シート作成中 ({}/{})", i + 1, total),
            i + 1,
            total,
            Step::Generate,
        );

        let title = namer.unique_name(&format!("{}_{}", item.record.date_key, item.record.street_name));
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&title)?;
        excel::write_report_sheet(worksheet, &template, item, config, sink)?;

        sheets_created += 1;
    }

    if sheets_created > 0 {
        sink.log(format!("元のテンプレートシート '{}' は出力に含めません", template.name));
    } else {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&template.name)?;
        excel::write_template_content(worksheet, &template)?;
        excel::write_template_images(worksheet, &template, sink);
    }

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let output_path = output_path_for(template_path, &config.output_prefix, &timestamp);

    sink.log("最終ファイルを保存しています。時間がかかる場合があります...");
    workbook.save(&output_path)?;
    sink.log(format!("報告書を保存しました: '{}'", output_path.display()));

    Ok(ReportOutcome {
        sheets_created,
        output_path,
    })
}
