//! Record exclusion: loopback check and per-field exact-match filters.

use crate::consts::LOOPBACK_OCTET;
use crate::field::{FieldRegistry, LADDR};
use crate::record::Record;

/// Textual loopback test: the first `.`-separated element equals "127".
///
/// No address parsing: `::1` or `localhost` are not loopback here.
pub fn is_loopback(addr: &str) -> bool {
    addr.split('.').next() == Some(LOOPBACK_OCTET)
}

/// Decides whether a data record is dropped. Never applied to the header.
#[derive(Debug, Clone)]
pub struct FilterEvaluator {
    exclude_loopback: bool,
    active: Vec<(usize, String)>,
}

impl FilterEvaluator {
    /// Snapshot the registry's active filters.
    pub fn new(registry: &FieldRegistry, exclude_loopback: bool) -> Self {
        let active = registry
            .active_filters()
            .map(|(f, v)| (f.index(), v.to_string()))
            .collect();
        Self {
            exclude_loopback,
            active,
        }
    }

    /// True when the record must not be rendered.
    pub fn excludes(&self, rec: &Record<'_>) -> bool {
        self.loopback_fires(rec) || self.mismatch_fires(rec)
    }

    fn loopback_fires(&self, rec: &Record<'_>) -> bool {
        self.exclude_loopback && is_loopback(rec.get(LADDR))
    }

    fn mismatch_fires(&self, rec: &Record<'_>) -> bool {
        self.active.iter().any(|(i, v)| rec.get(*i) != v)
    }
}
