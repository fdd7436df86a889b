//! Разбор одной строки таблицы в Record.

use crate::consts::FIELD_COUNT;
use crate::error::{StatError, StatResult};
use crate::field::UNIQUE_KEY_FIELDS;

/// One parsed line: exactly `FIELD_COUNT` values borrowed from the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    values: Vec<&'a str>,
}

impl<'a> Record<'a> {
    /// Value at a column index. Panics on an index outside the table, which
    /// can only come from a `FieldDef` of a different layout.
    pub fn get(&self, index: usize) -> &'a str {
        self.values[index]
    }

    /// laddr+lport+raddr+rport, concatenated without a separator.
    pub fn unique_key(&self) -> String {
        let mut key = String::new();
        for &i in UNIQUE_KEY_FIELDS.iter() {
            key.push_str(self.values[i]);
        }
        key
    }
}

/// Split `line` on `delimiter`. `line_no` (1-based) is only used for errors.
///
/// A trailing `\r` is dropped; all other bytes are kept as-is.
pub fn parse_line(line: &str, delimiter: char, line_no: usize) -> StatResult<Record<'_>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let values: Vec<&str> = line.split(delimiter).collect();
    if values.len() != FIELD_COUNT {
        return Err(StatError::MalformedRecord {
            line: line_no,
            expected: FIELD_COUNT,
            found: values.len(),
        });
    }
    Ok(Record { values })
}
