//! field — метаданные колонок таблицы tcpstat.
//!
//! The table layout is fixed: 18 columns, canonical order below. Each column
//! has an immutable descriptor (`FieldDef`) and a per-process filter value that
//! can only be set while the registry is being built (`RegistryBuilder`).
//! Once `build()` returns a `FieldRegistry`, nothing in it changes.

use std::collections::HashMap;

use serde::Serialize;

use crate::consts::FIELD_COUNT;
use crate::error::{StatError, StatResult};

// -------- Column indices --------
pub const LADDR: usize = 0;
pub const LPORT: usize = 1;
pub const RADDR: usize = 2;
pub const RPORT: usize = 3;
pub const STATE: usize = 4;
pub const TXBYTES: usize = 5;
pub const RXBYTES: usize = 6;
pub const TXSEGS: usize = 7;
pub const RXSEGS: usize = 8;
pub const RETRANS: usize = 9;
pub const SWND: usize = 10;
pub const RWND: usize = 11;
pub const CWND: usize = 12;
pub const SSTHRESH: usize = 13;
pub const MSS: usize = 14;
pub const RTO: usize = 15;
pub const RTT: usize = 16;
pub const RTTVAR: usize = 17;

/// Columns whose concatenated values identify a connection within a snapshot.
pub const UNIQUE_KEY_FIELDS: [usize; 4] = [LADDR, LPORT, RADDR, RPORT];

/// Immutable column descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    pub index: usize,
    pub name: &'static str,
    pub width: usize,
    pub about: &'static str,
}

const fn def(index: usize, name: &'static str, width: usize, about: &'static str) -> FieldDef {
    FieldDef { index, name, width, about }
}

/// Canonical column table; position in the array == `index`.
pub static FIELD_DEFS: [FieldDef; FIELD_COUNT] = [
    def(LADDR, "laddr", 16, "local address"),
    def(LPORT, "lport", 7, "local port"),
    def(RADDR, "raddr", 16, "remote address"),
    def(RPORT, "rport", 7, "remote port"),
    def(STATE, "state", 13, "connection state"),
    def(TXBYTES, "txbytes", 13, "bytes sent"),
    def(RXBYTES, "rxbytes", 13, "bytes received"),
    def(TXSEGS, "txsegs", 10, "segments sent"),
    def(RXSEGS, "rxsegs", 10, "segments received"),
    def(RETRANS, "retrans", 9, "retransmitted segments"),
    def(SWND, "swnd", 9, "send window"),
    def(RWND, "rwnd", 9, "receive window"),
    def(CWND, "cwnd", 9, "congestion window"),
    def(SSTHRESH, "ssthresh", 10, "slow-start threshold"),
    def(MSS, "mss", 7, "maximum segment size"),
    def(RTO, "rto", 8, "retransmission timeout (ms)"),
    def(RTT, "rtt", 8, "smoothed round-trip time (us)"),
    def(RTTVAR, "rttvar", 8, "round-trip time variance (us)"),
];

/// Static lookup without a registry (no filter state involved).
pub fn def_by_name(name: &str) -> Option<&'static FieldDef> {
    FIELD_DEFS.iter().find(|d| d.name == name)
}

/// A column descriptor together with its (optional) filter value.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    #[serde(flatten)]
    def: &'static FieldDef,
    filter: Option<String>,
}

impl Field {
    pub fn def(&self) -> &'static FieldDef {
        self.def
    }

    pub fn index(&self) -> usize {
        self.def.index
    }

    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn width(&self) -> usize {
        self.def.width
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }
}

/// Frozen field registry. Read-only after `RegistryBuilder::build()`.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<Field>,
    by_name: HashMap<&'static str, usize>,
}

impl FieldRegistry {
    /// Start the initialization phase.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    fn unfiltered() -> Self {
        let fields = FIELD_DEFS
            .iter()
            .map(|d| Field { def: d, filter: None })
            .collect();
        let by_name = FIELD_DEFS.iter().map(|d| (d.name, d.index)).collect();
        Self { fields, by_name }
    }

    pub fn lookup(&self, name: &str) -> StatResult<&Field> {
        self.by_name
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| StatError::UnknownField(name.to_string()))
    }

    /// All fields in canonical order.
    pub fn all_fields(&self) -> &[Field] {
        &self.fields
    }

    /// Fields with a non-empty filter value, in canonical order.
    pub fn active_filters(&self) -> impl Iterator<Item = (&Field, &str)> + '_ {
        self.fields
            .iter()
            .filter_map(|f| f.filter().map(|v| (f, v)))
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::unfiltered()
    }
}

/// Mutable registry used only before polling starts.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    reg: FieldRegistry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) the filter of `name`. An empty value clears it.
    pub fn set_filter(&mut self, name: &str, value: impl Into<String>) -> StatResult<()> {
        let idx = self.reg.lookup(name)?.index();
        let value = value.into();
        self.reg.fields[idx].filter = if value.is_empty() { None } else { Some(value) };
        Ok(())
    }

    /// Fluent variant of `set_filter`.
    pub fn filter(mut self, name: &str, value: impl Into<String>) -> StatResult<Self> {
        self.set_filter(name, value)?;
        Ok(self)
    }

    pub fn lookup(&self, name: &str) -> StatResult<&Field> {
        self.reg.lookup(name)
    }

    /// Finish the initialization phase.
    pub fn build(self) -> FieldRegistry {
        self.reg
    }
}
