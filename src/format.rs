//! Rendering of kept records: fixed-width table or CSV.

use std::fmt::{self, Write as _};

use crate::record::Record;
use crate::selection::OutputSelection;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    /// Right-justified fixed-width columns, header shown.
    Human,
    /// Comma-separated raw values, no header. Values carrying a comma or a
    /// double quote are quoted.
    Parsable,
}

impl OutputMode {
    pub fn from_parsable(parsable: bool) -> Self {
        if parsable {
            OutputMode::Parsable
        } else {
            OutputMode::Human
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Human => f.write_str("human"),
            OutputMode::Parsable => f.write_str("parsable"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Formatter {
    mode: OutputMode,
    selection: OutputSelection,
}

impl Formatter {
    pub fn new(mode: OutputMode, selection: OutputSelection) -> Self {
        Self { mode, selection }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Append one data line (with trailing newline) to `out`.
    pub fn render_record(&self, rec: &Record<'_>, out: &mut String) {
        self.render_values(|i| rec.get(i), out);
    }

    /// Append the heading row built from the header line's captions.
    /// Returns false (and writes nothing) in parsable mode.
    pub fn render_header(&self, header: &Record<'_>, out: &mut String) -> bool {
        if self.mode == OutputMode::Parsable {
            return false;
        }
        self.render_values(|i| header.get(i), out);
        true
    }

    /// Heading row made of the field names, used when the source header is unusable.
    pub fn render_field_names(&self, out: &mut String) -> bool {
        if self.mode == OutputMode::Parsable {
            return false;
        }
        self.render_values(|i| crate::field::FIELD_DEFS[i].name, out);
        true
    }

    fn render_values<'v, F>(&self, value_at: F, out: &mut String)
    where
        F: Fn(usize) -> &'v str,
    {
        match self.mode {
            OutputMode::Human => {
                for d in self.selection.fields() {
                    // write! into a String cannot fail
                    let _ = write!(out, "{:>width$}", value_at(d.index), width = d.width);
                }
            }
            OutputMode::Parsable => {
                for (n, d) in self.selection.fields().iter().enumerate() {
                    if n > 0 {
                        out.push(',');
                    }
                    push_csv_value(out, value_at(d.index));
                }
            }
        }
        out.push('\n');
    }
}

/// Input delimiters other than ',' let a comma reach a value; quote it then.
fn push_csv_value(out: &mut String, value: &str) {
    if !value.contains([',', '"']) {
        out.push_str(value);
        return;
    }
    out.push('"');
    out.push_str(&value.replace('"', "\"\""));
    out.push('"');
}
