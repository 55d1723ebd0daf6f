use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("シート '{0}' が見つかりません")]
    SheetNotFound(String),

    #[error("テンプレートシート '{0}' がファイル内に見つかりません")]
    TemplateSheetMissing(String),

    #[error("表計算ファイル読み込みエラー: {0}")]
    Spreadsheet(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("測定表に有効なデータがありません")]
    NoMeasurements,

    #[error("写真が{0}枚以上（1, 2, 3 の名前）揃った項目がありません")]
    NoEligibleItems(usize),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] photo_report_common::Error),
}

impl ReportError {
    /// 入力・設定の誤り（"error" チャンネルにも通知する種類）
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ReportError::Config(_)
                | ReportError::FileNotFound(_)
                | ReportError::SheetNotFound(_)
                | ReportError::TemplateSheetMissing(_)
                | ReportError::Spreadsheet(_)
                | ReportError::Common(_)
        )
    }
}

impl From<calamine::Error> for ReportError {
    fn from(e: calamine::Error) -> Self {
        ReportError::Spreadsheet(e.to_string())
    }
}

impl From<calamine::XlsxError> for ReportError {
    fn from(e: calamine::XlsxError) -> Self {
        ReportError::Spreadsheet(e.to_string())
    }
}

impl From<zip::result::ZipError> for ReportError {
    fn from(e: zip::result::ZipError) -> Self {
        ReportError::Spreadsheet(e.to_string())
    }
}

impl From<quick_xml::Error> for ReportError {
    fn from(e: quick_xml::Error) -> Self {
        ReportError::Spreadsheet(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ReportError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ReportError::ExcelGeneration(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
