// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text log files with rotation.
//!
//! A [`RotatingFileHandler`] appends one rendered record per line. When the file grows
//! past a size limit, or when a time interval has elapsed, the file is moved aside and a
//! fresh one is started. Moved-aside files are optionally gzip-compressed, and only the
//! newest `backup_count` of them are kept.
//!
//! | Rotation           | Backup names                                   |
//! |--------------------|------------------------------------------------|
//! | [`Rotation::Size`] | `app.log.1` (newest) .. `app.log.N`            |
//! | [`Rotation::Timed`]| `app.log.2024-05-01`, `app.log.2024-05-01_13-00`, ... by period start |
//!
//! With compression each backup name gains `.gz`.
//!
//! Rotated files are best effort: a crash or an I/O error between moving and compressing
//! leaves an uncompressed backup behind. The live file is reopened before compression
//! starts, so a failed rotation is reported once and later records are still written.

use crate::error::Result;
use crate::formatter::LevelFormatter;
use crate::handler::Handler;
use crate::level::Rank;
use crate::log_record::LogRecord;
use chrono::{DateTime, Local, TimeDelta};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// When the current file is rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    /// Before a write would take the file past `max_bytes`.
    Size { max_bytes: u64 },
    /// Once `interval` has passed since the current file was started.
    Timed { interval: Duration },
}

impl Rotation {
    pub const fn daily() -> Self {
        Rotation::Timed {
            interval: Duration::from_secs(24 * 60 * 60),
        }
    }

    pub const fn hourly() -> Self {
        Rotation::Timed {
            interval: Duration::from_secs(60 * 60),
        }
    }

    /// strftime suffix for timed backups, as fine-grained as the interval needs.
    fn suffix_format(&self) -> &'static str {
        match self {
            Rotation::Timed { interval } if interval.as_secs() < 60 => "%Y-%m-%d_%H-%M-%S",
            Rotation::Timed { interval } if interval.as_secs() < 24 * 60 * 60 => "%Y-%m-%d_%H-%M",
            _ => "%Y-%m-%d",
        }
    }
}

#[derive(Debug)]
struct FileState {
    writer: BufWriter<File>,
    size: u64,
    period_start: DateTime<Local>,
    next_rollover: Option<DateTime<Local>>,
}

/// A handler writing to a file that rotates by size or time.
#[derive(Debug)]
pub struct RotatingFileHandler {
    formatter: Arc<LevelFormatter>,
    threshold: Rank,
    path: PathBuf,
    rotation: Rotation,
    backup_count: usize,
    compress: bool,
    compressor: fn(&Path) -> io::Result<PathBuf>,
    state: Mutex<FileState>,
}

impl RotatingFileHandler {
    /// Opens `path` for appending, creating it if needed.
    ///
    /// Keeps 7 backups and compresses them; see [`Self::with_backup_count`] and
    /// [`Self::with_compression`].
    pub fn new(path: impl Into<PathBuf>, rotation: Rotation, formatter: Arc<LevelFormatter>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let metadata = file.metadata()?;
        // an existing file's period began when it was last written
        let period_start = metadata
            .modified()
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());
        let state = FileState {
            writer: BufWriter::new(file),
            size: metadata.len(),
            period_start,
            next_rollover: next_rollover(&rotation, period_start),
        };
        Ok(Self {
            formatter,
            threshold: Rank(0),
            path,
            rotation,
            backup_count: 7,
            compress: true,
            compressor: compress_file,
            state: Mutex::new(state),
        })
    }

    /// How many rotated files to keep. Zero keeps none: the file is truncated on rotation.
    pub fn with_backup_count(mut self, backup_count: usize) -> Self {
        self.backup_count = backup_count;
        self
    }

    /// Whether rotated files are gzip-compressed.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    #[cfg(test)]
    fn with_compressor(mut self, compressor: fn(&Path) -> io::Result<PathBuf>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_threshold(mut self, threshold: Rank) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rotates immediately, regardless of the trigger.
    pub fn rotate_now(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.rollover(&mut state, Local::now())
    }

    fn should_rollover(&self, state: &FileState, incoming: u64, now: DateTime<Local>) -> bool {
        match self.rotation {
            Rotation::Size { max_bytes } => {
                max_bytes > 0 && state.size > 0 && state.size + incoming > max_bytes
            }
            Rotation::Timed { .. } => state.next_rollover.is_some_and(|at| now >= at),
        }
    }

    fn rollover(&self, state: &mut FileState, now: DateTime<Local>) -> Result<()> {
        state.writer.flush()?;
        let moved = if self.backup_count > 0 {
            self.move_live_file(state)
        } else {
            Ok(None)
        };
        // reopen even when the move failed
        self.reopen(state, now)?;
        if let Some(dest) = moved? {
            if self.compress {
                (self.compressor)(&dest)?;
            }
        }
        if self.backup_count > 0 && matches!(self.rotation, Rotation::Timed { .. }) {
            self.remove_old_timed_backups()?;
        }
        Ok(())
    }

    /// Starts a fresh live file. With backups it is appended to, which keeps its content
    /// if it couldn't be moved; without backups it is truncated.
    fn reopen(&self, state: &mut FileState, now: DateTime<Local>) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(self.backup_count > 0)
            .write(true)
            .truncate(self.backup_count == 0)
            .open(&self.path)?;
        state.size = file.metadata()?.len();
        state.writer = BufWriter::new(file);
        state.period_start = now;
        state.next_rollover = next_rollover(&self.rotation, now);
        Ok(())
    }

    fn backup_name(&self, dest: &Path) -> PathBuf {
        if self.compress {
            suffixed(dest, "gz")
        } else {
            dest.to_path_buf()
        }
    }

    /// Renames the live file to its backup name and returns that name.
    fn move_live_file(&self, state: &FileState) -> Result<Option<PathBuf>> {
        let dest = match self.rotation {
            Rotation::Size { .. } => {
                self.shift_numbered_backups()?;
                suffixed(&self.path, "1")
            }
            Rotation::Timed { .. } => {
                let suffix = state.period_start.format(self.rotation.suffix_format());
                suffixed(&self.path, &suffix.to_string())
            }
        };
        let final_name = self.backup_name(&dest);
        if final_name.exists() {
            fs::remove_file(&final_name)?;
        }
        fs::rename(&self.path, &dest)?;
        Ok(Some(dest))
    }

    fn shift_numbered_backups(&self) -> Result<()> {
        for i in (1..self.backup_count).rev() {
            let src = self.backup_name(&suffixed(&self.path, &i.to_string()));
            let dst = self.backup_name(&suffixed(&self.path, &(i + 1).to_string()));
            if src.exists() {
                if dst.exists() {
                    fs::remove_file(&dst)?;
                }
                fs::rename(&src, &dst)?;
            }
        }
        Ok(())
    }

    fn remove_old_timed_backups(&self) -> Result<()> {
        let Some(file_name) = self.path.file_name().and_then(|n| n.to_str()) else {
            return Ok(());
        };
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = format!("{file_name}.");
        let expected_len = Local::now().format(self.rotation.suffix_format()).to_string().len();

        let mut backups: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(suffix) = name.strip_prefix(&prefix) else { continue };
            let suffix = suffix.strip_suffix(".gz").unwrap_or(suffix);
            if suffix.len() == expected_len
                && suffix.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '_')
            {
                backups.push(entry.path());
            }
        }
        // suffixes sort chronologically
        backups.sort();
        let excess = backups.len().saturating_sub(self.backup_count);
        for old in &backups[..excess] {
            fs::remove_file(old)?;
        }
        Ok(())
    }
}

fn next_rollover(rotation: &Rotation, from: DateTime<Local>) -> Option<DateTime<Local>> {
    match rotation {
        Rotation::Size { .. } => None,
        Rotation::Timed { interval } => TimeDelta::from_std(*interval)
            .ok()
            .and_then(|delta| from.checked_add_signed(delta)),
    }
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Gzips `path` to `path.gz` and removes the original.
pub fn compress_file(path: &Path) -> io::Result<PathBuf> {
    let gz_path = suffixed(path, "gz");
    let mut input = File::open(path)?;
    let output = File::create(&gz_path)?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.sync_all()?;
    fs::remove_file(path)?;
    Ok(gz_path)
}

impl Handler for RotatingFileHandler {
    fn emit(&self, record: &LogRecord) -> Result<()> {
        let mut line = self.formatter.format(record)?;
        line.push('\n');
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Local::now();
        let rotated = if self.should_rollover(&state, line.len() as u64, now) {
            self.rollover(&mut state, now)
        } else {
            Ok(())
        };
        state.writer.write_all(line.as_bytes())?;
        state.writer.flush()?;
        state.size += line.len() as u64;
        rotated
    }

    fn prepare(&self, record: &LogRecord) {
        self.formatter.prepare(record);
    }

    fn threshold(&self) -> Rank {
        self.threshold
    }

    fn prepare_to_die(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = state.writer.flush();
    }
}
