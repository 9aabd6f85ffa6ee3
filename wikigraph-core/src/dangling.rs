//! Dangling-reference log.
//!
//! Every run that discards links writes an audit file listing them, one
//! `source -> target` line each, so the loss is explicit.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::graph::DanglingReference;

/// First line of every log file.
pub const LOG_HEADER: &str = "Discarded relationships:";

/// Writes dangling references to timestamp-named files in one directory.
#[derive(Debug, Clone)]
pub struct DanglingLog {
    dir: PathBuf,
}

impl DanglingLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `references` to a new log file and return its path.
    ///
    /// The directory is created if missing. An existing file is never
    /// overwritten.
    pub fn write(&self, references: &[DanglingReference]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|source| CoreError::LogWrite {
            path: self.dir.clone(),
            source,
        })?;

        let stamp = Local::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
        let (path, file) = self.create_unique(&stamp)?;

        let to_log_error = |source| CoreError::LogWrite {
            path: path.clone(),
            source,
        };

        let mut out = BufWriter::new(file);
        writeln!(out, "{}", LOG_HEADER).map_err(to_log_error)?;
        for reference in references {
            writeln!(out, "{} -> {}", reference.source, reference.target).map_err(to_log_error)?;
        }
        out.flush().map_err(to_log_error)?;

        tracing::info!(
            "Logged {} dangling references to {:?}",
            references.len(),
            path
        );
        Ok(path)
    }

    /// Open `dangling-<stamp>.log`, or the first free `dangling-<stamp>-N.log`
    /// when runs land on the same millisecond.
    fn create_unique(&self, stamp: &str) -> Result<(PathBuf, File)> {
        let mut attempt = 0usize;
        loop {
            let name = match attempt {
                0 => format!("dangling-{}.log", stamp),
                n => format!("dangling-{}-{}.log", stamp, n),
            };
            let path = self.dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(source) => return Err(CoreError::LogWrite { path, source }),
            }
        }
    }
}
