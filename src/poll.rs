//! Polling loop: sample → render → write, `count` times, `interval` apart.

use anyhow::{Context, Result};
use std::io::Write;
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::consts::TIMESTAMP_FORMAT;
use crate::snapshot::{Pipeline, SnapshotStats};
use crate::source::LineSource;

/// Marker line printed before each snapshot when timestamps are on.
pub fn timestamp_marker() -> String {
    format!("--- {} ---", chrono::Local::now().format(TIMESTAMP_FORMAT))
}

#[derive(Debug, Clone)]
pub struct Poller {
    pipeline: Pipeline,
    interval: Duration,
    /// 0 = until the process is stopped.
    count: u64,
    timestamp: bool,
}

impl Poller {
    pub fn new(pipeline: Pipeline, interval: Duration, count: u64) -> Self {
        Self {
            pipeline,
            interval,
            count,
            timestamp: false,
        }
    }

    pub fn with_timestamp(mut self, on: bool) -> Self {
        self.timestamp = on;
        self
    }

    /// Run one iteration and write its block to `out`.
    pub fn poll_once<S, W>(&self, source: &mut S, out: &mut W) -> Result<SnapshotStats>
    where
        S: LineSource + ?Sized,
        W: Write + ?Sized,
    {
        let lines = source.read_lines()?;
        let marker = self.timestamp.then(timestamp_marker);
        let snap = self.pipeline.render(&lines, marker.as_deref());
        out.write_all(snap.text.as_bytes())
            .context("write snapshot")?;
        out.flush().context("flush output")?;
        Ok(snap.stats)
    }

    /// Run all iterations. Returns the number of snapshots rendered.
    /// Source and output errors stop the loop.
    pub fn run<S, W>(&self, source: &mut S, out: &mut W) -> Result<u64>
    where
        S: LineSource + ?Sized,
        W: Write + ?Sized,
    {
        info!(
            "polling: mode={} interval={} ms count={}",
            self.pipeline.mode(),
            self.interval.as_millis(),
            if self.count == 0 { "inf".to_string() } else { self.count.to_string() }
        );

        let mut done: u64 = 0;
        loop {
            let stats = self.poll_once(source, out)?;
            done += 1;
            debug!("polling: iteration {} kept {} record(s)", done, stats.kept);

            if self.count != 0 && done >= self.count {
                break;
            }
            thread::sleep(self.interval);
        }
        Ok(done)
    }
}
