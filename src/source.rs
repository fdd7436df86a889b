//! Источники сырых строк таблицы.

use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use log::debug;

/// Produces the raw lines of one snapshot (header first).
pub trait LineSource {
    fn read_lines(&mut self) -> Result<Vec<String>>;
}

/// Reads the whole statistics file on every call.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSource for FileSource {
    fn read_lines(&mut self) -> Result<Vec<String>> {
        let mut f = match OpenOptions::new().read(true).open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(anyhow!(
                    "{} not found: is the tcpstat kernel module loaded?",
                    self.path.display()
                ));
            }
            Err(e) => {
                return Err(e).with_context(|| format!("open {}", self.path.display()));
            }
        };
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)
            .with_context(|| format!("read {}", self.path.display()))?;
        // Invalid UTF-8 only spoils the row it sits in; parsing decides its fate.
        let lines: Vec<String> = String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect();
        debug!("source: {} line(s) from {}", lines.len(), self.path.display());
        Ok(lines)
    }
}

/// Replays the same lines on every call.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    lines: Vec<String>,
}

impl MemorySource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for MemorySource {
    fn read_lines(&mut self) -> Result<Vec<String>> {
        Ok(self.lines.clone())
    }
}
