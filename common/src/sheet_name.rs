//! シート名の生成
//!
//! `<日付>_<通り名>` を基にシート名を作る。Excelの制約:
//! - 最大31文字
//! - `[ ] : * ? / \` は使えない
//! - 大文字小文字を区別せずに一意
//!
//! 重複時は `_1`, `_2`, ... を付け、接尾辞込みで文字数制限に収める。

use std::collections::HashSet;

const FORBIDDEN_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// 文字数（バイト数ではない）で切り詰める
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// 切り詰めてから両端のアポストロフィ・空白を落とす
///
/// 切り詰めで末尾に `'` が残るとExcelがシート名を拒否する。
fn fit(text: &str, max_chars: usize) -> String {
    truncate_chars(text, max_chars)
        .trim_matches(|c: char| c == '\'' || c.is_whitespace())
        .to_string()
}

/// シート名に使えない文字を置き換える
pub fn sanitize_sheet_name(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '-' } else { c })
        .collect();
    // 先頭・末尾のアポストロフィも不可
    cleaned.trim_matches('\'').to_string()
}

/// 一意なシート名を払い出す
#[derive(Debug, Clone)]
pub struct SheetNamer {
    max_len: usize,
    used: HashSet<String>,
}

impl SheetNamer {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            used: HashSet::new(),
        }
    }

    /// 既存のシート名を予約する
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_lowercase());
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(&name.to_lowercase())
    }

    /// `base` を基に一意な名前を決めて予約する
    pub fn unique_name(&mut self, base: &str) -> String {
        let mut base = sanitize_sheet_name(base);
        if fit(&base, self.max_len).is_empty() {
            base = "Sheet".to_string();
        }

        let mut candidate = fit(&base, self.max_len);
        let mut count = 1;
        while self.is_used(&candidate) {
            let suffix = format!("_{}", count);
            let room = self.max_len.saturating_sub(suffix.chars().count());
            candidate = format!("{}{}", fit(&base, room), suffix);
            count += 1;
        }

        self.reserve(&candidate);
        candidate
    }
}
