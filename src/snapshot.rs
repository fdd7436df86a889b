//! snapshot — один проход конвейера: parse → filter → dedup → format.
//!
//! A `Pipeline` is built once from the frozen configuration and reused by
//! every polling iteration. All per-iteration state (the dedup set, counters,
//! the output buffer) is created inside `render()` and dropped with it, so
//! nothing observed in one snapshot can influence the next.

use log::{debug, warn};
use serde::Serialize;

use crate::consts::FIELD_DELIMITER;
use crate::dedup::Deduplicator;
use crate::error::StatError;
use crate::field::FieldRegistry;
use crate::filter::FilterEvaluator;
use crate::format::{Formatter, OutputMode};
use crate::record::parse_line;
use crate::selection::OutputSelection;

/// Per-snapshot counters. Never carried over to the next iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotStats {
    /// Data lines seen (header excluded).
    pub lines: u64,
    pub kept: u64,
    pub filtered: u64,
    pub duplicates: u64,
    pub malformed: u64,
}

/// Rendered block of one iteration plus what went wrong on the way.
#[derive(Debug, Clone, Default)]
pub struct SnapshotOutput {
    pub text: String,
    pub stats: SnapshotStats,
    pub errors: Vec<StatError>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    filter: FilterEvaluator,
    formatter: Formatter,
    delimiter: char,
    show_header: bool,
}

impl Pipeline {
    pub fn new(
        registry: &FieldRegistry,
        selection: OutputSelection,
        mode: OutputMode,
        exclude_loopback: bool,
    ) -> Self {
        Self {
            filter: FilterEvaluator::new(registry, exclude_loopback),
            formatter: Formatter::new(mode, selection),
            delimiter: FIELD_DELIMITER,
            show_header: true,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Human mode only; parsable mode never prints a header.
    pub fn with_header(mut self, on: bool) -> Self {
        self.show_header = on;
        self
    }

    pub fn mode(&self) -> OutputMode {
        self.formatter.mode()
    }

    /// Render one snapshot. The first line is the caption header.
    pub fn render<I, S>(&self, lines: I, marker: Option<&str>) -> SnapshotOutput
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = SnapshotOutput::default();
        let mut dedup = Deduplicator::new();

        if let Some(m) = marker {
            out.text.push_str(m);
            out.text.push('\n');
        }

        for (idx, raw) in lines.into_iter().enumerate() {
            let raw = raw.as_ref();
            let line_no = idx + 1;

            if idx == 0 {
                self.render_heading(raw, &mut out);
                continue;
            }
            out.stats.lines += 1;

            let rec = match parse_line(raw, self.delimiter, line_no) {
                Ok(r) => r,
                Err(e) => {
                    warn!("snapshot: skip {}", e);
                    out.stats.malformed += 1;
                    out.errors.push(e);
                    continue;
                }
            };

            if self.filter.excludes(&rec) {
                out.stats.filtered += 1;
                continue;
            }
            if !dedup.admit(&rec) {
                out.stats.duplicates += 1;
                continue;
            }

            self.formatter.render_record(&rec, &mut out.text);
            out.stats.kept += 1;
        }

        debug!(
            "snapshot: lines={} kept={} filtered={} duplicates={} malformed={}",
            out.stats.lines,
            out.stats.kept,
            out.stats.filtered,
            out.stats.duplicates,
            out.stats.malformed
        );
        out
    }

    fn render_heading(&self, raw: &str, out: &mut SnapshotOutput) {
        if self.formatter.mode() == OutputMode::Parsable || !self.show_header {
            return;
        }
        match parse_line(raw, self.delimiter, 1) {
            Ok(header) => {
                self.formatter.render_header(&header, &mut out.text);
            }
            Err(e) => {
                warn!("snapshot: header unusable ({}), using field names", e);
                out.stats.malformed += 1;
                out.errors.push(e);
                self.formatter.render_field_names(&mut out.text);
            }
        }
    }
}
