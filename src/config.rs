//! Centralized configuration for tcpstat.
//!
//! Sources, lowest precedence first:
//! - built-in defaults (`StatConfig::default()`);
//! - environment: TCPSTAT_PATH, TCPSTAT_INTERVAL_MS, TCPSTAT_COUNT, TCPSTAT_TIMESTAMP;
//! - TOML file (`--config`), see `FileConfig`;
//! - command-line flags (applied by `cli`).
//!
//! Everything here is finalized before the first snapshot: `build_registry()`
//! is the only place where filter values are set.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::consts::{
    ALL_FIELDS_KEYWORD, DEFAULT_COUNT, DEFAULT_INTERVAL_MS, DEFAULT_STATS_PATH, ENV_COUNT,
    ENV_INTERVAL_MS, ENV_PATH, ENV_TIMESTAMP, ESTABLISHED_STATE, FIELD_DELIMITER,
};
use crate::field::{FieldRegistry, FIELD_DEFS, STATE};
use crate::format::OutputMode;
use crate::poll::Poller;
use crate::selection::OutputSelection;
use crate::snapshot::Pipeline;

/// Which columns to print.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum FieldsSpec {
    /// Built-in order (`consts::DEFAULT_OUTPUT_FIELDS`).
    #[default]
    Default,
    /// Every column, canonical order.
    All,
    /// Explicit names, in the given order.
    List(Vec<String>),
}

impl FieldsSpec {
    /// `all` or a comma-separated list.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.eq_ignore_ascii_case(ALL_FIELDS_KEYWORD) {
            return FieldsSpec::All;
        }
        FieldsSpec::List(
            s.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl fmt::Display for FieldsSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldsSpec::Default => f.write_str("default"),
            FieldsSpec::All => f.write_str(ALL_FIELDS_KEYWORD),
            FieldsSpec::List(v) => f.write_str(&v.join(",")),
        }
    }
}

/// Parse `name=value` filters; a single argument may hold a comma-separated list.
pub fn parse_filter_spec(s: &str) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, value) = part
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid filter '{}': expected name=value", part))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("invalid filter '{}': empty field name", part));
        }
        out.push((name.to_string(), value.trim().to_string()));
    }
    Ok(out)
}

fn env_flag(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "on" || s == "yes"
}

/// TOML config file. Every key is optional; present keys override env values.
///
/// ```toml
/// path = "/proc/net/tcpstat"
/// interval_ms = 2000
/// count = 10
/// fields = "laddr,lport,state,rtt"
/// parsable = true
/// no_loopback = true
/// filters = ["state=ESTABLISHED", "rport=443"]
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub path: Option<PathBuf>,
    pub interval_ms: Option<u64>,
    pub count: Option<u64>,
    pub fields: Option<String>,
    pub parsable: Option<bool>,
    pub no_loopback: Option<bool>,
    pub no_header: Option<bool>,
    pub established: Option<bool>,
    pub filters: Option<Vec<String>>,
    pub timestamp: Option<bool>,
    pub delimiter: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("open config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Effective configuration of one tcpstat run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatConfig {
    /// Statistics table to sample. Env: TCPSTAT_PATH
    pub path: PathBuf,
    /// Pause between snapshots. Env: TCPSTAT_INTERVAL_MS (default 1000)
    pub interval_ms: u64,
    /// Number of snapshots, 0 = until stopped. Env: TCPSTAT_COUNT (default 0)
    pub count: u64,
    pub fields: FieldsSpec,
    pub parsable: bool,
    pub exclude_loopback: bool,
    /// Human mode: do not print the caption row.
    pub no_header: bool,
    /// Shorthand for `state=ESTABLISHED`.
    pub established: bool,
    /// Explicit `name=value` filters, applied after `established`.
    pub filters: Vec<(String, String)>,
    /// Marker line with local time before each snapshot. Env: TCPSTAT_TIMESTAMP
    pub timestamp: bool,
    pub delimiter: char,
}

impl Default for StatConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STATS_PATH),
            interval_ms: DEFAULT_INTERVAL_MS,
            count: DEFAULT_COUNT,
            fields: FieldsSpec::Default,
            parsable: false,
            exclude_loopback: false,
            no_header: false,
            established: false,
            filters: Vec::new(),
            timestamp: false,
            delimiter: FIELD_DELIMITER,
        }
    }
}

impl StatConfig {
    /// Defaults overridden by TCPSTAT_* variables. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var(ENV_PATH) {
            let s = v.trim();
            if !s.is_empty() {
                cfg.path = PathBuf::from(s);
            }
        }
        if let Ok(v) = std::env::var(ENV_INTERVAL_MS) {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.interval_ms = n;
            }
        }
        if let Ok(v) = std::env::var(ENV_COUNT) {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.count = n;
            }
        }
        if let Ok(v) = std::env::var(ENV_TIMESTAMP) {
            cfg.timestamp = env_flag(&v);
        }

        cfg
    }

    /// Overlay values present in a config file.
    pub fn apply_file(&mut self, file: FileConfig) -> Result<()> {
        if let Some(p) = file.path {
            self.path = p;
        }
        if let Some(n) = file.interval_ms {
            self.interval_ms = n;
        }
        if let Some(n) = file.count {
            self.count = n;
        }
        if let Some(s) = file.fields {
            self.fields = FieldsSpec::parse(&s);
        }
        if let Some(b) = file.parsable {
            self.parsable = b;
        }
        if let Some(b) = file.no_loopback {
            self.exclude_loopback = b;
        }
        if let Some(b) = file.no_header {
            self.no_header = b;
        }
        if let Some(b) = file.established {
            self.established = b;
        }
        if let Some(list) = file.filters {
            for f in list {
                self.filters.extend(parse_filter_spec(&f)?);
            }
        }
        if let Some(b) = file.timestamp {
            self.timestamp = b;
        }
        if let Some(d) = file.delimiter {
            let mut chars = d.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => self.delimiter = c,
                _ => return Err(anyhow!("delimiter must be a single character, got '{}'", d)),
            }
        }
        Ok(())
    }

    // ----- fluent setters -----

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_interval_ms(mut self, ms: u64) -> Self {
        self.interval_ms = ms;
        self
    }

    pub fn with_count(mut self, n: u64) -> Self {
        self.count = n;
        self
    }

    pub fn with_fields(mut self, fields: FieldsSpec) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_parsable(mut self, on: bool) -> Self {
        self.parsable = on;
        self
    }

    pub fn with_exclude_loopback(mut self, on: bool) -> Self {
        self.exclude_loopback = on;
        self
    }

    pub fn with_no_header(mut self, on: bool) -> Self {
        self.no_header = on;
        self
    }

    pub fn with_established(mut self, on: bool) -> Self {
        self.established = on;
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((name.into(), value.into()));
        self
    }

    pub fn with_timestamp(mut self, on: bool) -> Self {
        self.timestamp = on;
        self
    }

    pub fn with_delimiter(mut self, c: char) -> Self {
        self.delimiter = c;
        self
    }

    pub fn mode(&self) -> OutputMode {
        OutputMode::from_parsable(self.parsable)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Reject combinations the pipeline does not handle. Unknown field names
    /// (selection or filters) are reported here, before any snapshot.
    pub fn validate(&self) -> Result<()> {
        if self.parsable {
            match &self.fields {
                FieldsSpec::Default => {
                    return Err(anyhow!("parsable output requires an explicit --fields list"));
                }
                FieldsSpec::All => {
                    return Err(anyhow!(
                        "--fields {} is not allowed with parsable output",
                        ALL_FIELDS_KEYWORD
                    ));
                }
                FieldsSpec::List(_) => {}
            }
        }
        if let FieldsSpec::List(v) = &self.fields {
            if v.is_empty() {
                return Err(anyhow!("--fields list is empty"));
            }
        }
        if self.interval_ms == 0 && self.count != 1 {
            return Err(anyhow!("interval must be greater than zero when count != 1"));
        }
        if self.delimiter == '\n' || self.delimiter == '\r' {
            return Err(anyhow!("delimiter cannot be a line break"));
        }
        let registry = self.build_registry()?;
        self.selection(&registry)?;
        Ok(())
    }

    /// Initialization phase of the field registry: apply `established`, then
    /// explicit filters (a later filter on the same field wins).
    pub fn build_registry(&self) -> Result<FieldRegistry> {
        let mut b = FieldRegistry::builder();
        if self.established {
            b.set_filter(FIELD_DEFS[STATE].name, ESTABLISHED_STATE)?;
        }
        for (name, value) in &self.filters {
            b.set_filter(name, value.as_str())?;
        }
        Ok(b.build())
    }

    pub fn selection(&self, registry: &FieldRegistry) -> Result<OutputSelection> {
        let sel = match &self.fields {
            FieldsSpec::Default => OutputSelection::default_order(),
            FieldsSpec::All => OutputSelection::all(),
            FieldsSpec::List(v) => OutputSelection::from_names(registry, v)?,
        };
        Ok(sel)
    }

    pub fn pipeline(&self) -> Result<Pipeline> {
        let registry = self.build_registry()?;
        let selection = self.selection(&registry)?;
        Ok(Pipeline::new(&registry, selection, self.mode(), self.exclude_loopback)
            .with_delimiter(self.delimiter)
            .with_header(!self.no_header))
    }

    /// Validated poller for this configuration.
    pub fn poller(&self) -> Result<Poller> {
        self.validate()?;
        Ok(Poller::new(self.pipeline()?, self.interval(), self.count).with_timestamp(self.timestamp))
    }
}

impl fmt::Display for StatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filters: Vec<String> = self
            .filters
            .iter()
            .map(|(n, v)| format!("{}={}", n, v))
            .collect();
        write!(
            f,
            "StatConfig {{ \
             path: {}, \
             interval_ms: {}, \
             count: {}, \
             fields: {}, \
             mode: {}, \
             exclude_loopback: {}, \
             no_header: {}, \
             established: {}, \
             filters: [{}], \
             timestamp: {} \
             }}",
            self.path.display(),
            self.interval_ms,
            if self.count == 0 { "inf".to_string() } else { self.count.to_string() },
            self.fields,
            self.mode(),
            self.exclude_loopback,
            self.no_header,
            self.established,
            filters.join(","),
            self.timestamp,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatError;

    #[test]
    fn fields_spec_parse() {
        assert_eq!(FieldsSpec::parse(" all "), FieldsSpec::All);
        assert_eq!(
            FieldsSpec::parse("laddr, lport,"),
            FieldsSpec::List(vec!["laddr".into(), "lport".into()])
        );
    }

    #[test]
    fn filter_spec_parse() {
        let got = parse_filter_spec("state=ESTABLISHED, rport=443").unwrap();
        assert_eq!(
            got,
            vec![
                ("state".to_string(), "ESTABLISHED".to_string()),
                ("rport".to_string(), "443".to_string())
            ]
        );
        assert!(parse_filter_spec("state").is_err());
        assert!(parse_filter_spec("=x").is_err());
    }

    #[test]
    fn parsable_needs_explicit_list() {
        let base = StatConfig::default().with_parsable(true);
        assert!(base.clone().validate().is_err());
        assert!(base.clone().with_fields(FieldsSpec::All).validate().is_err());
        assert!(base
            .with_fields(FieldsSpec::parse("laddr,lport"))
            .validate()
            .is_ok());
    }

    #[test]
    fn human_mode_accepts_default_and_all() {
        assert!(StatConfig::default().validate().is_ok());
        assert!(StatConfig::default().with_fields(FieldsSpec::All).validate().is_ok());
    }

    #[test]
    fn unknown_names_are_fatal() {
        let bad_sel = StatConfig::default().with_fields(FieldsSpec::parse("laddr,nope"));
        let err = bad_sel.validate().unwrap_err();
        assert_eq!(
            err.downcast_ref::<StatError>(),
            Some(&StatError::UnknownField("nope".into()))
        );

        let bad_filter = StatConfig::default().with_filter("bogus", "1");
        assert!(bad_filter.validate().is_err());
    }

    #[test]
    fn zero_interval_only_for_single_shot() {
        assert!(StatConfig::default().with_interval_ms(0).validate().is_err());
        assert!(StatConfig::default()
            .with_interval_ms(0)
            .with_count(1)
            .validate()
            .is_ok());
    }

    #[test]
    fn explicit_filter_overrides_established() {
        let reg = StatConfig::default()
            .with_established(true)
            .with_filter("state", "LISTEN")
            .build_registry()
            .unwrap();
        assert_eq!(reg.lookup("state").unwrap().filter(), Some("LISTEN"));

        let reg = StatConfig::default().with_established(true).build_registry().unwrap();
        assert_eq!(reg.lookup("state").unwrap().filter(), Some(ESTABLISHED_STATE));
    }

    #[test]
    fn file_config_overlays() {
        let file = FileConfig::parse(
            r#"
            path = "/tmp/tcpstat.csv"
            interval_ms = 250
            count = 3
            fields = "laddr,rtt"
            parsable = true
            no_loopback = true
            filters = ["state=ESTABLISHED", "lport=80"]
            delimiter = ";"
            "#,
        )
        .unwrap();
        let mut cfg = StatConfig::default();
        cfg.apply_file(file).unwrap();
        assert_eq!(cfg.path, PathBuf::from("/tmp/tcpstat.csv"));
        assert_eq!(cfg.interval_ms, 250);
        assert_eq!(cfg.count, 3);
        assert_eq!(cfg.fields, FieldsSpec::parse("laddr,rtt"));
        assert!(cfg.parsable && cfg.exclude_loopback);
        assert_eq!(cfg.filters.len(), 2);
        assert_eq!(cfg.delimiter, ';');
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn file_config_rejects_unknown_keys_and_bad_delimiter() {
        assert!(FileConfig::parse("colour = true").is_err());
        let mut cfg = StatConfig::default();
        let file = FileConfig::parse(r#"delimiter = "::""#).unwrap();
        assert!(cfg.apply_file(file).is_err());
    }

    #[test]
    fn display_mentions_mode_and_filters() {
        let s = StatConfig::default()
            .with_parsable(true)
            .with_filter("lport", "22")
            .to_string();
        assert!(s.contains("mode: parsable"));
        assert!(s.contains("filters: [lport=22]"));
        assert!(s.contains("count: inf"));
    }
}
