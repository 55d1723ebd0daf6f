use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photo-report")]
#[command(about = "測定表と現場写真から写真報告書を生成するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 設定ファイル（省略時: ~/.config/photo-report/config.json）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 詳細ログを標準エラーに出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 引数で指定して報告書を作成
    Run {
        /// 測定表ファイル
        #[arg(short, long, required = true)]
        measurement: PathBuf,

        /// 測定表のシート名
        #[arg(short, long, required = true)]
        sheet: String,

        /// 写真ルートフォルダ（<日付>/<通り名>/1.jpg ...）
        #[arg(short, long, required = true)]
        photos: PathBuf,

        /// テンプレートブック（出力もこのフォルダに保存）
        #[arg(short, long, required = true)]
        template: PathBuf,

        /// 作成するシート数の上限
        #[arg(long)]
        target_count: Option<usize>,

        /// 1件あたりに必要な写真枚数
        #[arg(long)]
        min_photos: Option<usize>,

        /// 写真のデコード検証を省略
        #[arg(long)]
        skip_validation: bool,
    },

    /// 標準入力のJSONで依頼を受けて報告書を作成（ホストアプリ用）
    Stdin,

    /// 設定を表示/初期化
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 既定の設定ファイルを書き出す
        #[arg(long)]
        init: bool,
    },
}

/// 引数で指定された上書き
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target_count: Option<usize>,
    pub min_photos: Option<usize>,
    pub skip_validation: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut photo_report_common::ReportConfig) {
        if let Some(target) = self.target_count {
            config.target_count = target;
        }
        if let Some(min) = self.min_photos {
            config.min_photos_required = min;
        }
        if self.skip_validation {
            config.validate_images = false;
        }
    }
}
