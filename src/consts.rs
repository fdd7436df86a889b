//! Общие константы: источник данных, формат строк, значения по умолчанию.

// -------- Data source --------
/// Connection-statistics table exported by the kernel module.
pub const DEFAULT_STATS_PATH: &str = "/proc/net/tcpstat";
pub const FIELD_DELIMITER: char = ',';

// -------- Record layout --------
pub const FIELD_COUNT: usize = 18;

// -------- Filters --------
pub const LOOPBACK_OCTET: &str = "127";
pub const ESTABLISHED_STATE: &str = "ESTABLISHED";

// -------- Selection --------
/// Keyword accepted by --fields to request every column in canonical order.
pub const ALL_FIELDS_KEYWORD: &str = "all";
pub const DEFAULT_OUTPUT_FIELDS: &[&str] = &[
    "laddr", "lport", "raddr", "rport", "state", "txbytes", "rxbytes", "retrans", "cwnd", "rtt",
];

// -------- Polling --------
pub const DEFAULT_INTERVAL_MS: u64 = 1000;
/// 0 = poll until the process is stopped.
pub const DEFAULT_COUNT: u64 = 0;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// -------- Environment --------
pub const ENV_PATH: &str = "TCPSTAT_PATH";
pub const ENV_INTERVAL_MS: &str = "TCPSTAT_INTERVAL_MS";
pub const ENV_COUNT: &str = "TCPSTAT_COUNT";
pub const ENV_TIMESTAMP: &str = "TCPSTAT_TIMESTAMP";
