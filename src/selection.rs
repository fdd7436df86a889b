//! Output column selection.

use crate::consts::{ALL_FIELDS_KEYWORD, DEFAULT_OUTPUT_FIELDS};
use crate::error::StatResult;
use crate::field::{def_by_name, FieldDef, FieldRegistry, FIELD_DEFS};

/// Ordered list of columns to render, chosen once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSelection {
    fields: Vec<&'static FieldDef>,
}

impl OutputSelection {
    /// Every column in canonical order.
    pub fn all() -> Self {
        Self {
            fields: FIELD_DEFS.iter().collect(),
        }
    }

    /// Built-in column order used when nothing was requested.
    pub fn default_order() -> Self {
        Self {
            fields: DEFAULT_OUTPUT_FIELDS
                .iter()
                .filter_map(|n| def_by_name(n))
                .collect(),
        }
    }

    /// Explicit list; order is kept, repeats are allowed.
    pub fn from_names<I, S>(registry: &FieldRegistry, names: I) -> StatResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields = Vec::new();
        for n in names {
            fields.push(registry.lookup(n.as_ref().trim())?.def());
        }
        Ok(Self { fields })
    }

    /// Parse `--fields`: either `all` or a comma-separated list of names.
    /// Empty entries are ignored.
    pub fn parse(registry: &FieldRegistry, spec: &str) -> StatResult<Self> {
        let spec = spec.trim();
        if spec.eq_ignore_ascii_case(ALL_FIELDS_KEYWORD) {
            return Ok(Self::all());
        }
        Self::from_names(registry, spec.split(',').filter(|s| !s.trim().is_empty()))
    }

    pub fn fields(&self) -> &[&'static FieldDef] {
        &self.fields
    }
}
