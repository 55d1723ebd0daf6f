//! 写真フォルダ探索
//!
//! `<写真ルート>/<DD-MM-YYYY>/<通り名>/{1,2,3}.<拡張子>` から写真を探す。
//! ファイルシステムには直接触らず `DirectoryLister` 越しに見るので、
//! テストでは偽のディレクトリ構造を渡せる。

use crate::config::ReportConfig;
use crate::status::StatusSink;
use crate::types::{DateKey, PhotoSet};
use std::io;
use std::path::{Path, PathBuf};

/// ディレクトリ一覧の抽象
pub trait DirectoryLister {
    fn is_dir(&self, path: &Path) -> bool;

    /// 直下のサブディレクトリ（名前順）
    fn subdirectories(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// 直下のファイル（名前順）
    fn files(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// 画像の検証
pub trait PhotoValidator {
    /// 画像として読めなければエラー内容を返す
    fn validate(&self, path: &Path) -> Result<(), String>;
}

/// 検証しない（ファイルがあれば採用）
pub struct AcceptAll;

impl PhotoValidator for AcceptAll {
    fn validate(&self, _path: &Path) -> Result<(), String> {
        Ok(())
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// 日付・通り名から写真を探す
///
/// 期待名（"1","2","3"）ごとに拡張子の優先順で探し、最初に見つかった
/// 有効な画像を採用する。見つからない期待名は詰めて返す（空きは作らない）。
pub fn locate_photos(
    lister: &dyn DirectoryLister,
    validator: &dyn PhotoValidator,
    base_dir: &Path,
    date_key: &DateKey,
    street_name: &str,
    config: &ReportConfig,
    sink: &mut dyn StatusSink,
) -> PhotoSet {
    let mut photos = PhotoSet::default();

    let date_dir = base_dir.join(date_key.to_string());
    if !lister.is_dir(&date_dir) {
        return photos;
    }

    let Some(street_dir) = find_street_dir(lister, &date_dir, street_name) else {
        sink.log(format!(
            "警告: 通り '{}' のフォルダが '{}' 内に見つかりません",
            street_name, date_key
        ));
        return photos;
    };

    let files = match lister.files(&street_dir) {
        Ok(files) => files,
        Err(e) => {
            sink.log(format!("警告: '{}' を読み込めません: {}", street_dir.display(), e));
            return photos;
        }
    };

    for stem in &config.expected_photo_names {
        if let Some(path) = find_photo(&files, stem, config, validator, sink) {
            photos.push(path);
        }
    }

    photos
}

/// 通り名と大文字小文字を無視して一致するサブフォルダ（最初の一致）
fn find_street_dir(lister: &dyn DirectoryLister, date_dir: &Path, street_name: &str) -> Option<PathBuf> {
    let wanted = street_name.to_lowercase();
    lister
        .subdirectories(date_dir)
        .ok()?
        .into_iter()
        .find(|dir| file_name_of(dir).to_lowercase() == wanted)
}

fn find_photo(
    files: &[PathBuf],
    stem: &str,
    config: &ReportConfig,
    validator: &dyn PhotoValidator,
    sink: &mut dyn StatusSink,
) -> Option<PathBuf> {
    for ext in &config.image_extensions {
        let wanted = format!("{}.{}", stem, ext.trim_start_matches('.')).to_lowercase();
        let Some(candidate) = files.iter().find(|f| file_name_of(f).to_lowercase() == wanted) else {
            continue;
        };

        if config.validate_images {
            if let Err(e) = validator.validate(candidate) {
                sink.log(format!(
                    "警告: 画像 '{}' は無効なためスキップします: {}",
                    file_name_of(candidate),
                    e
                ));
                continue;
            }
        }

        return Some(candidate.clone());
    }

    None
}
