//! 通知イベントの出力先
//!
//! ホストアプリは標準出力をJSON行として読むので、1イベント1行で書き、
//! 毎回フラッシュする。

use photo_report_common::{StatusEvent, StatusSink};
use std::io::Write;
use tracing::warn;

pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> StatusSink for JsonLinesSink<W> {
    fn emit(&mut self, event: StatusEvent) {
        let line = event.to_json_line();
        if let Err(e) = writeln!(self.writer, "{}", line).and_then(|_| self.writer.flush()) {
            // 出力先が閉じられても処理は続ける
            warn!(error = %e, "通知を書き込めません");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photo_report_common::Step;

    #[test]
    fn test_one_json_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        {
            let dyn_sink: &mut dyn StatusSink = &mut sink;
            dyn_sink.log("Iniciando");
            dyn_sink.progress("写真を確認中 (1/2)", 1, 2, Step::Photos);
            dyn_sink.result("完了", true, Some("/tmp/out.xlsx".into()));
        }

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);

        let result: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(result["type"], "result");
        assert_eq!(result["success"], true);
        assert_eq!(result["file_path"], "/tmp/out.xlsx");
    }
}
