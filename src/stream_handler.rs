// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::error::Result;
use crate::formatter::LevelFormatter;
use crate::handler::Handler;
use crate::level::Rank;
use crate::log_record::LogRecord;
use std::fmt::Debug;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/**
Whether emitting a record ends the process.

Exiting is never implied by a severity name; a handler only exits when it was built with
[`ExitPolicy::On`].
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExitPolicy {
    #[default]
    Never,
    /// After writing a record at exactly `rank`, flush and exit with `code`.
    ///
    /// An exact match keeps STATUS, which ranks above CRITICAL, from ending the process.
    On { rank: Rank, code: i32 },
}

impl ExitPolicy {
    pub fn should_exit(&self, rank: Rank) -> Option<i32> {
        match *self {
            ExitPolicy::Never => None,
            ExitPolicy::On { rank: exit_rank, code } => (rank == exit_rank).then_some(code),
        }
    }
}

enum Target {
    Stderr,
    Writer(Mutex<Box<dyn Write + Send>>),
}

impl Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Stderr => f.write_str("Stderr"),
            Target::Writer(_) => f.write_str("Writer"),
        }
    }
}

/**
A console handler. Writes to stderr unless given another stream.
 */
#[derive(Debug)]
pub struct StreamHandler {
    formatter: Arc<LevelFormatter>,
    threshold: Rank,
    exit_policy: ExitPolicy,
    target: Target,
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug: derived; the boxed writer prints as "Writer"
// - Clone/Copy: NOT implemented - a boxed writer can't be duplicated
// - PartialEq/Eq/Hash: NOT implemented - no meaningful identity
// - Default: NOT implemented - needs a formatter
// - Send/Sync: automatic; the writer sits behind a Mutex

impl StreamHandler {
    pub fn new(formatter: Arc<LevelFormatter>) -> Self {
        Self {
            formatter,
            threshold: Rank(0),
            exit_policy: ExitPolicy::Never,
            target: Target::Stderr,
        }
    }

    /// Writes to `writer` instead of stderr.
    pub fn with_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.target = Target::Writer(Mutex::new(writer));
        self
    }

    pub fn with_threshold(mut self, threshold: Rank) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_exit_policy(mut self, exit_policy: ExitPolicy) -> Self {
        self.exit_policy = exit_policy;
        self
    }

    pub fn exit_policy(&self) -> ExitPolicy {
        self.exit_policy
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        match &self.target {
            Target::Stderr => {
                let mut lock = std::io::stderr().lock();
                lock.write_all(line.as_bytes())?;
                lock.write_all(b"\n")
            }
            Target::Writer(writer) => {
                let mut lock = writer.lock().unwrap_or_else(PoisonError::into_inner);
                lock.write_all(line.as_bytes())?;
                lock.write_all(b"\n")
            }
        }
    }
}

impl Handler for StreamHandler {
    fn emit(&self, record: &LogRecord) -> Result<()> {
        let line = self.formatter.format(record)?;
        self.write_line(&line)?;
        if let Some(code) = self.exit_policy.should_exit(record.rank()) {
            self.prepare_to_die();
            std::process::exit(code);
        }
        Ok(())
    }

    fn prepare(&self, record: &LogRecord) {
        self.formatter.prepare(record);
    }

    fn threshold(&self) -> Rank {
        self.threshold
    }

    fn prepare_to_die(&self) {
        // best effort; we may be on the way out already
        match &self.target {
            Target::Stderr => {
                let _ = std::io::stderr().flush();
            }
            Target::Writer(writer) => {
                let _ = writer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .flush();
            }
        }
    }
}
