//! Typed errors of the record pipeline.
//!
//! Outer layers (source, config, CLI) wrap these into `anyhow::Error`.

/// Errors raised by the field registry and the snapshot parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatError {
    /// Name is not one of the recognized columns.
    #[error("unknown field '{0}' (see --list-fields)")]
    UnknownField(String),

    /// A data line does not split into the expected number of columns.
    #[error("malformed record at line {line}: expected {expected} fields, found {found}")]
    MalformedRecord {
        line: usize,
        expected: usize,
        found: usize,
    },
}

pub type StatResult<T> = std::result::Result<T, StatError>;
