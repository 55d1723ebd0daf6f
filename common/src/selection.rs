//! 選定エンジン
//!
//! 写真の揃ったレコードから、シート数の上限内で報告書に載せるものを選ぶ。
//!
//! ## 処理フロー
//! 1. 日付ごとに分け、日付順に並べる
//! 2. 第1パス: 各日付から優先度最大の1件（同点は行番号の小さい方）
//! 3. 第2パス: 残りを優先度順に、第1パスで選んだ通りと重複しないものを追加
//! 4. 第3パス: まだ枠が余っていれば、通りの重複を許して追加
//! 5. 元の行順に並べ直す

use crate::config::ReportConfig;
use crate::status::StatusSink;
use crate::types::{DateKey, EligibleItem};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// 優先度の高い順、同点は行番号の小さい順
fn by_priority(a: &EligibleItem, b: &EligibleItem) -> Ordering {
    b.record
        .priority
        .total_cmp(&a.record.priority)
        .then_with(|| a.record.source_row.cmp(&b.record.source_row))
}

/// 報告書に載せるレコードを選ぶ
///
/// 戻り値は `config.target_count` 件以下、行番号の昇順。
/// 日付の種類が上限以下なら、すべての日付が少なくとも1件含まれる。
pub fn select_items(
    items: Vec<EligibleItem>,
    config: &ReportConfig,
    sink: &mut dyn StatusSink,
) -> Vec<EligibleItem> {
    let target = config.target_count;

    let mut by_date: BTreeMap<DateKey, Vec<EligibleItem>> = BTreeMap::new();
    for item in items {
        by_date.entry(item.record.date_key).or_default().push(item);
    }
    sink.log(format!("グループ化完了: 写真のある日付は{}日分", by_date.len()));

    let mut selected: Vec<EligibleItem> = Vec::new();
    let mut remaining: Vec<EligibleItem> = Vec::new();

    // 第1パス（日付カバレッジ）
    sink.log("第1パス: 各日付から優先度最大の通りを1件ずつ選定");
    for (_, mut group) in by_date {
        group.sort_by(by_priority);
        let mut group = group.into_iter();
        if selected.len() < target {
            if let Some(best) = group.next() {
                selected.push(best);
            }
        }
        remaining.extend(group);
    }
    sink.log(format!("第1パス後: {}件を選定（1日1件）", selected.len()));

    if selected.len() < target {
        sink.log(format!("第2パス: 残り{}枠を埋めます", target - selected.len()));
        remaining.sort_by(by_priority);

        // 第1パスで選ばれた通りだけを避ける
        let first_pass_streets: HashSet<String> =
            selected.iter().map(|item| item.record.street_name.clone()).collect();

        let mut leftover = Vec::new();
        for item in remaining {
            if selected.len() < target && !first_pass_streets.contains(&item.record.street_name) {
                selected.push(item);
            } else {
                leftover.push(item);
            }
        }

        // 第3パス（通りの重複を許す）
        if selected.len() < target && !leftover.is_empty() {
            sink.log(format!(
                "第3パス: 通りの重複を許して残り{}枠を埋めます",
                target - selected.len()
            ));
            let room = target - selected.len();
            selected.extend(leftover.into_iter().take(room));
        }
    }

    sink.log(format!("選定完了: {}件を処理します", selected.len()));

    selected.sort_by_key(|item| item.record.source_row);
    selected
}
