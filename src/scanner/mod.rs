//! 写真フォルダのファイルシステム実装
//!
//! `photo_report_common::locator` の抽象をローカルディスク上で実装する。

use photo_report_common::{DirectoryLister, PhotoValidator};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 直下のエントリを名前順に列挙する
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLister;

impl FsLister {
    fn entries(&self, folder: &Path, want_dirs: bool) -> io::Result<Vec<PathBuf>> {
        let mut found = Vec::new();

        for entry in WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)  // 直下のみ（再帰しない）
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::other)?;
            let file_type = entry.file_type();
            if (want_dirs && file_type.is_dir()) || (!want_dirs && file_type.is_file()) {
                found.push(entry.into_path());
            }
        }

        Ok(found)
    }
}

impl DirectoryLister for FsLister {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn subdirectories(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.entries(path, true)
    }

    fn files(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.entries(path, false)
    }
}

/// 画像を実際にデコードして検証する
#[derive(Debug, Default, Clone, Copy)]
pub struct DecodeValidator;

impl PhotoValidator for DecodeValidator {
    fn validate(&self, path: &Path) -> Result<(), String> {
        image::ImageReader::open(path)
            .map_err(|e| e.to_string())?
            .with_guessed_format()
            .map_err(|e| e.to_string())?
            .decode()
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
