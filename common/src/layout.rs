//! セル参照（A1形式）
//!
//! 写真・ロゴのアンカー位置や通り名ラベルのセルは設定ファイルでは
//! "B16" のようなA1形式で書き、書き込み時に0始まりの行/列へ変換する。

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Excelの最大列数（XFD）
const MAX_COL: u16 = 16_384;
/// Excelの最大行数
const MAX_ROW: u32 = 1_048_576;

/// 0始まりのセル位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    pub const fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// 列番号（0始まり）を列名に変換（0 → "A", 26 → "AA"）
    pub fn column_name(col: u16) -> String {
        let mut n = col as u32 + 1;
        let mut name = Vec::new();
        while n > 0 {
            let rem = ((n - 1) % 26) as u8;
            name.push(b'A' + rem);
            n = (n - 1) / 26;
        }
        name.reverse();
        String::from_utf8_lossy(&name).into_owned()
    }
}

impl FromStr for CellRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim().replace('$', "");
        let split = text
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| Error::InvalidCellReference(s.to_string()))?;
        let (letters, digits) = text.split_at(split);

        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidCellReference(s.to_string()));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
            if col > MAX_COL as u32 {
                return Err(Error::InvalidCellReference(s.to_string()));
            }
        }

        let row: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidCellReference(s.to_string()))?;
        if row == 0 || row > MAX_ROW {
            return Err(Error::InvalidCellReference(s.to_string()));
        }

        Ok(Self::new(row - 1, (col - 1) as u16))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::column_name(self.col), self.row + 1)
    }
}

impl Serialize for CellRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
