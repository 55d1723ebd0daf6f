use crate::error::{ReportError, Result};
use photo_report_common::ReportConfig;
use std::path::{Path, PathBuf};

/// 設定ファイルの読み書き
///
/// 中身は `ReportConfig` そのもの。書かれていない項目は既定値になる。
pub struct Config;

impl Config {
    /// `~/.config/photo-report/config.json` を読む（無ければ既定値）
    pub fn load() -> Result<ReportConfig> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(ReportConfig::default())
        }
    }

    /// 指定ファイルを読む
    pub fn load_from(path: &Path) -> Result<ReportConfig> {
        if !path.exists() {
            return Err(ReportError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: ReportConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(config: &ReportConfig) -> Result<PathBuf> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&config_path, content)?;
        Ok(config_path)
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ReportError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("photo-report").join("config.json"))
    }
}
