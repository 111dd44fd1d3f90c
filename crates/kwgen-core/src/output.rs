//! Batch report output in JSON or JSON Lines.
//!
//! JSON Lines records are written as soon as they arrive. JSON output is
//! buffered and written as one array by [`ReportWriter::finish`].

use serde::Serialize;
use std::io::{self, Write};

/// Report format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON array of records
    #[default]
    Json,
    /// One JSON object per line
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Streams batch records to a writer.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    pending: Vec<serde_json::Value>,
    records: usize,
}

impl<W: Write> ReportWriter<W> {
    /// `pretty` only affects the JSON array format.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            pending: Vec::new(),
            records: 0,
        }
    }

    /// Add one record to the report.
    pub fn record<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let value = serde_json::to_value(item).map_err(io::Error::other)?;
                self.pending.push(value);
            }
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
        }
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Write any buffered records, flush, and return the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.format == OutputFormat::Json {
            let pending = std::mem::take(&mut self.pending);
            if self.pretty {
                serde_json::to_writer_pretty(&mut self.writer, &pending)
            } else {
                serde_json::to_writer(&mut self.writer, &pending)
            }
            .map_err(io::Error::other)?;
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Row {
        file: &'static str,
        keywords: Vec<&'static str>,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                file: "a.jpg",
                keywords: vec!["sky"],
            },
            Row {
                file: "b.png",
                keywords: vec!["sea", "sand"],
            },
        ]
    }

    #[test]
    fn test_jsonl_streams_one_line_per_record() {
        let mut report = ReportWriter::new(Vec::new(), OutputFormat::JsonLines, true);
        for row in rows() {
            report.record(&row).unwrap();
        }
        assert_eq!(report.records(), 2);
        let output = String::from_utf8(report.finish().unwrap()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"file":"a.jpg","keywords":["sky"]}"#);
    }

    #[test]
    fn test_json_buffers_until_finish() {
        let mut buffer = Vec::new();
        {
            let mut report = ReportWriter::new(&mut buffer, OutputFormat::Json, false);
            for row in rows() {
                report.record(&row).unwrap();
            }
            report.finish().unwrap();
        }
        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[1]["keywords"][1], "sand");
    }

    #[test]
    fn test_empty_json_report_is_empty_array() {
        let report = ReportWriter::new(Vec::new(), OutputFormat::Json, false);
        let output = String::from_utf8(report.finish().unwrap()).unwrap();
        assert_eq!(output, "[]\n");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("JSONL"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("ndjson"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("csv"), None);
    }
}
