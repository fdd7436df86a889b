use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use log::{debug, info};

use crate::config::{parse_filter_spec, FieldsSpec, FileConfig, StatConfig};
use crate::field::FieldRegistry;
use crate::source::FileSource;

#[derive(Parser, Debug)]
#[command(
    name = "tcpstat",
    version,
    about = "Periodic view of the kernel TCP connection-statistics table"
)]
pub struct Cli {
    /// Seconds between snapshots (fractions allowed, e.g. 0.5)
    #[arg(short, long)]
    pub interval: Option<f64>,

    /// Number of snapshots (0 = until interrupted)
    #[arg(short, long)]
    pub count: Option<u64>,

    /// Columns to print: comma-separated names, or "all"
    #[arg(short, long)]
    pub fields: Option<String>,

    /// CSV output without header (requires an explicit --fields list)
    #[arg(short, long, default_value_t = false)]
    pub parsable: bool,

    /// Hide connections whose local address starts with 127.
    #[arg(short = 'l', long, default_value_t = false)]
    pub no_loopback: bool,

    /// Only ESTABLISHED connections (same as --filter state=ESTABLISHED)
    #[arg(short, long, default_value_t = false)]
    pub established: bool,

    /// Exact-match filter name=value (repeatable, or comma-separated)
    #[arg(short = 'F', long = "filter")]
    pub filters: Vec<String>,

    /// Do not print the caption row (human-readable mode)
    #[arg(short = 'H', long, default_value_t = false)]
    pub no_header: bool,

    /// Print a local-time marker line before each snapshot
    #[arg(short, long, default_value_t = false)]
    pub timestamp: bool,

    /// Statistics table to read
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Config file (TOML). CLI flags override config values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the known columns and exit
    #[arg(long, default_value_t = false)]
    pub list_fields: bool,

    /// With --list-fields: JSON output
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Effective configuration: env, then config file, then flags.
pub fn config_from_args(args: &Cli) -> Result<StatConfig> {
    apply_args(StatConfig::from_env(), args)
}

/// Layer the config file and the flags of `args` over `cfg`.
pub fn apply_args(mut cfg: StatConfig, args: &Cli) -> Result<StatConfig> {
    if let Some(p) = &args.config {
        cfg.apply_file(FileConfig::load(p)?)?;
    }

    if let Some(secs) = args.interval {
        if !secs.is_finite() || secs < 0.0 {
            return Err(anyhow!("invalid --interval {}: must be a non-negative number", secs));
        }
        let ms = (secs * 1000.0).round() as u64;
        // sub-millisecond values mean "as fast as possible", not a single shot
        cfg.interval_ms = if secs > 0.0 { ms.max(1) } else { ms };
    }
    if let Some(n) = args.count {
        cfg.count = n;
    }
    if let Some(s) = &args.fields {
        cfg.fields = FieldsSpec::parse(s);
    }
    if let Some(p) = &args.path {
        cfg.path = p.clone();
    }
    for f in &args.filters {
        cfg.filters.extend(parse_filter_spec(f)?);
    }
    cfg.parsable |= args.parsable;
    cfg.exclude_loopback |= args.no_loopback;
    cfg.established |= args.established;
    cfg.no_header |= args.no_header;
    cfg.timestamp |= args.timestamp;

    Ok(cfg)
}

/// `--list-fields` output.
pub fn write_field_list<W: Write>(out: &mut W, json: bool) -> Result<()> {
    let registry = FieldRegistry::default();
    if json {
        let s = serde_json::to_string_pretty(registry.all_fields())?;
        writeln!(out, "{}", s)?;
        return Ok(());
    }
    writeln!(out, "{:>3}  {:<10}{:>6}  {}", "idx", "name", "width", "description")?;
    for f in registry.all_fields() {
        writeln!(
            out,
            "{:>3}  {:<10}{:>6}  {}",
            f.index(),
            f.name(),
            f.width(),
            f.def().about
        )?;
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let args = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.list_fields {
        return write_field_list(&mut out, args.json);
    }

    let cfg = config_from_args(&args)?;
    debug!("{}", cfg);

    let poller = cfg.poller().context("invalid configuration")?;
    let mut source = FileSource::new(cfg.path.clone());
    let n = poller.run(&mut source, &mut out)?;
    info!("done: {} snapshot(s) from {}", n, source.path().display());
    Ok(())
}
