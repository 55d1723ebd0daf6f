//! 進捗・結果の通知プロトコル
//!
//! 各処理は標準出力に直接書かず、`StatusSink` にイベントを流す。
//! 呼び出し側（CLI/ホストアプリ）がJSON行として出力する。
//!
//! ```json
//! {"type":"progress","message":"...","value":3,"total":10,"step":"photos"}
//! {"type":"result","message":"...","success":true,"file_path":"/tmp/out.xlsx"}
//! ```

use serde::Serialize;

/// 進捗の工程
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// 測定表の読み込み
    Extract,
    /// 写真の確認
    Photos,
    /// シート作成
    Generate,
}

/// 通知イベント
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StatusEvent {
    Log {
        message: String,
    },
    Progress {
        message: String,
        value: usize,
        total: usize,
        step: Step,
    },
    Error {
        message: String,
    },
    Result {
        message: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
    },
}

impl StatusEvent {
    pub fn message(&self) -> &str {
        match self {
            StatusEvent::Log { message }
            | StatusEvent::Progress { message, .. }
            | StatusEvent::Error { message }
            | StatusEvent::Result { message, .. } => message,
        }
    }

    /// JSON 1行に変換
    pub fn to_json_line(&self) -> String {
        // フィールドはすべて文字列・数値・真偽値なので失敗しない
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"type":"error","message":{:?}}}"#, self.message())
        })
    }
}

/// 通知の受け口
pub trait StatusSink {
    fn emit(&mut self, event: StatusEvent);
}

/// クロージャを受け口として使うためのラッパー
pub struct FnSink<F>(pub F);

impl<F: FnMut(StatusEvent)> StatusSink for FnSink<F> {
    fn emit(&mut self, event: StatusEvent) {
        (self.0)(event)
    }
}

/// `dyn StatusSink` 向けの便利メソッド
impl dyn StatusSink + '_ {
    pub fn log(&mut self, message: impl Into<String>) {
        self.emit(StatusEvent::Log { message: message.into() });
    }

    pub fn progress(&mut self, message: impl Into<String>, value: usize, total: usize, step: Step) {
        self.emit(StatusEvent::Progress {
            message: message.into(),
            value,
            total,
            step,
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.emit(StatusEvent::Error { message: message.into() });
    }

    pub fn result(&mut self, message: impl Into<String>, success: bool, file_path: Option<String>) {
        self.emit(StatusEvent::Result {
            message: message.into(),
            success,
            file_path,
        });
    }
}

/// イベントをメモリに溜める受け口（テスト・集計用）
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Vec<StatusEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.message()).collect()
    }

    pub fn results(&self) -> Vec<&StatusEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, StatusEvent::Result { .. }))
            .collect()
    }

    pub fn progress_of(&self, step: Step) -> Vec<(usize, usize)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                StatusEvent::Progress { value, total, step: s, .. } if *s == step => Some((*value, *total)),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.events.iter().any(|e| e.message().contains(needle))
    }
}

impl StatusSink for MemorySink {
    fn emit(&mut self, event: StatusEvent) {
        self.events.push(event);
    }
}
