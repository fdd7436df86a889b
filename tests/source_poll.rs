use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;

use tcpstat::consts::FIELD_COUNT;
use tcpstat::field::FIELD_DEFS;
use tcpstat::{
    FieldsSpec, FileConfig, FileSource, LineSource, MemorySource, StatConfig,
};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("tcpstat-test-{prefix}-{pid}-{t}-{id}"))
}

fn header() -> String {
    FIELD_DEFS.iter().map(|d| d.name).collect::<Vec<_>>().join(",")
}

fn row(laddr: &str, lport: &str, state: &str) -> String {
    let mut cols = vec![laddr, lport, "10.9.9.9", "443", state];
    cols.extend(std::iter::repeat("1").take(FIELD_COUNT - 5));
    cols.join(",")
}

#[test]
fn file_source_reads_all_lines() -> Result<()> {
    let root = unique_root("file");
    fs::create_dir_all(&root)?;
    let path = root.join("tcpstat");
    let body = format!("{}\r\n{}\n{}\n", header(), row("10.0.0.1", "80", "ESTABLISHED"), row("10.0.0.2", "81", "LISTEN"));
    fs::write(&path, body)?;

    let mut src = FileSource::new(&path);
    let lines = src.read_lines()?;
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], header());
    assert!(lines[2].starts_with("10.0.0.2,81,"));
    Ok(())
}

#[test]
fn invalid_utf8_spoils_only_its_row() -> Result<()> {
    let root = unique_root("utf8");
    fs::create_dir_all(&root)?;
    let path = root.join("tcpstat");
    let mut body = format!("{}\n{}\n", header(), row("10.0.0.1", "80", "ESTABLISHED")).into_bytes();
    let mut bad = row("10.0.0.2", "81", "ESTABLISHED").into_bytes();
    bad[0] = 0xFF;
    body.extend_from_slice(&bad);
    body.push(b'\n');
    fs::write(&path, body)?;

    let mut src = FileSource::new(&path);
    let lines = src.read_lines()?;
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], row("10.0.0.1", "80", "ESTABLISHED"));
    assert!(lines[2].starts_with('\u{FFFD}'));

    let poller = StatConfig::default()
        .with_fields(FieldsSpec::parse("laddr,lport"))
        .with_parsable(true)
        .with_count(1)
        .poller()?;
    let mut out: Vec<u8> = Vec::new();
    poller.run(&mut src, &mut out)?;
    assert_eq!(String::from_utf8(out)?, "10.0.0.1,80\n\u{FFFD}0.0.0.2,81\n");
    Ok(())
}

#[test]
fn missing_file_hints_at_module() -> Result<()> {
    let path = unique_root("missing").join("tcpstat");
    let mut src = FileSource::new(&path);
    let err = src.read_lines().unwrap_err();
    assert!(format!("{:#}", err).contains("kernel module"));
    Ok(())
}

#[test]
fn poller_runs_count_iterations_without_leaking_dedup_state() -> Result<()> {
    let poller = StatConfig::default()
        .with_fields(FieldsSpec::parse("laddr,lport"))
        .with_parsable(true)
        .with_count(3)
        .with_interval_ms(1)
        .poller()?;

    let mut src = MemorySource::new(vec![
        header(),
        row("10.0.0.1", "80", "ESTABLISHED"),
        row("10.0.0.1", "80", "ESTABLISHED"),
    ]);
    let mut out: Vec<u8> = Vec::new();
    let n = poller.run(&mut src, &mut out)?;

    assert_eq!(n, 3);
    // One row per iteration: the key seen in iteration 1 is not remembered later.
    assert_eq!(String::from_utf8(out)?, "10.0.0.1,80\n".repeat(3));
    Ok(())
}

#[test]
fn poller_with_timestamp_prefixes_each_block() -> Result<()> {
    let poller = StatConfig::default()
        .with_fields(FieldsSpec::parse("lport"))
        .with_parsable(true)
        .with_timestamp(true)
        .with_count(2)
        .with_interval_ms(1)
        .poller()?;

    let mut src = MemorySource::new(vec![header(), row("10.0.0.1", "80", "ESTABLISHED")]);
    let mut out: Vec<u8> = Vec::new();
    poller.run(&mut src, &mut out)?;

    let text = String::from_utf8(out)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("--- ") && lines[2].starts_with("--- "));
    assert_eq!(lines[1], "80");
    assert_eq!(lines[3], "80");
    Ok(())
}

#[test]
fn source_failure_stops_polling() -> Result<()> {
    let poller = StatConfig::default()
        .with_count(5)
        .with_interval_ms(1)
        .poller()?;
    let mut src = FileSource::new(unique_root("gone").join("tcpstat"));
    let mut out: Vec<u8> = Vec::new();
    assert!(poller.run(&mut src, &mut out).is_err());
    assert!(out.is_empty());
    Ok(())
}

#[test]
fn established_and_loopback_from_config_file() -> Result<()> {
    let root = unique_root("cfg");
    fs::create_dir_all(&root)?;
    let data = root.join("tcpstat");
    fs::write(
        &data,
        [
            header(),
            row("10.0.0.1", "80", "ESTABLISHED"),
            row("127.0.0.1", "22", "ESTABLISHED"),
            row("10.0.0.3", "25", "TIME_WAIT"),
        ]
        .join("\n"),
    )?;
    let cfg_path = root.join("tcpstat.toml");
    fs::write(
        &cfg_path,
        format!(
            "path = {:?}\ncount = 1\nfields = \"laddr,lport,state\"\nparsable = true\nno_loopback = true\nestablished = true\n",
            data.display().to_string()
        ),
    )?;

    let mut cfg = StatConfig::default();
    cfg.apply_file(FileConfig::load(&cfg_path)?)?;
    assert_eq!(cfg.interval(), Duration::from_millis(1000));

    let poller = cfg.poller()?;
    let mut src = FileSource::new(cfg.path.clone());
    let mut out: Vec<u8> = Vec::new();
    assert_eq!(poller.run(&mut src, &mut out)?, 1);
    assert_eq!(String::from_utf8(out)?, "10.0.0.1,80,ESTABLISHED\n");
    Ok(())
}
