//! Report serialization for files and stdout.
//!
//! The CLI stores finished [`DamageReport`](crate::types::DamageReport)s
//! either as one JSON document or as JSON Lines, where each report lands on
//! its own line as soon as it completes.

use serde::Serialize;
use std::io::{self, Write};

/// How serialized reports are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON document (object or array)
    Json,
    /// One JSON object per line
    JsonLines,
}

/// Serializes reports to an underlying writer in the chosen format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Wrap `writer`. `pretty` only affects the JSON format; JSON Lines
    /// output is always compact.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write one report, followed by a newline.
    pub fn write<T: Serialize>(&mut self, report: &T) -> io::Result<()> {
        let use_pretty = self.pretty && self.format == OutputFormat::Json;
        self.emit(report, use_pretty)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write a collection of reports.
    ///
    /// JSON gets a single array document; JSON Lines gets one line each.
    pub fn write_all<T: Serialize>(&mut self, reports: &[T]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                self.emit(&reports, self.pretty)?;
                self.items_written += reports.len();
            }
            OutputFormat::JsonLines => {
                for report in reports {
                    self.write(report)?;
                }
            }
        }
        Ok(())
    }

    /// Number of reports written so far.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn emit<T: Serialize>(&mut self, value: &T, pretty: bool) -> io::Result<()> {
        if pretty {
            serde_json::to_writer_pretty(&mut self.writer, value).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, value).map_err(io::Error::other)?;
        }
        writeln!(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DamageReport, ReportLanguage, VehicleInfo};

    fn sample_report(id: &str) -> DamageReport {
        DamageReport {
            report_id: id.to_string(),
            timestamp: "2025-06-01 10:30".to_string(),
            engine: "OpenAI".to_string(),
            model: "gpt-4o-mini".to_string(),
            language: ReportLanguage::English,
            vehicle: VehicleInfo {
                make: Some("Kia".to_string()),
                model: None,
                year: None,
                plate: None,
            },
            damages: vec![],
            total_cost: Some("$1,200".to_string()),
            repair_time: None,
            safety_status: "Safe".to_string(),
            content: "### 1. Vehicle Identification".to_string(),
            capture: None,
            latency_ms: 900,
            tokens_used: None,
        }
    }

    #[test]
    fn test_single_report_as_json() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, false);

        writer.write(&sample_report("abc123def456")).unwrap();
        assert_eq!(writer.items_written(), 1);

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("\"report_id\":\"abc123def456\""));
        assert!(output.contains("\"total_cost\":\"$1,200\""));
        // Absent optional fields are omitted, not null
        assert!(!output.contains("repair_time"));
    }

    #[test]
    fn test_jsonl_streams_one_line_per_report() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::JsonLines, false);

        writer.write(&sample_report("aaa")).unwrap();
        writer.write(&sample_report("bbb")).unwrap();
        assert_eq!(writer.items_written(), 2);

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.trim().split('\n').collect();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("report_id").is_some());
        }
    }

    #[test]
    fn test_write_all_json_is_an_array() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, true);

        let reports = vec![sample_report("aaa"), sample_report("bbb")];
        writer.write_all(&reports).unwrap();
        assert_eq!(writer.items_written(), 2);

        let output = String::from_utf8(buffer).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_jsonl_ignores_pretty_flag() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::JsonLines, true);

        writer.write(&sample_report("aaa")).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        // Compact output means the whole report stays on one line
        assert_eq!(output.trim().lines().count(), 1);
    }
}
