// SPDX-License-Identifier: MIT OR Apache-2.0

//! # In-Memory Handler
//!
//! This module provides an in-memory handler for testing and debugging purposes.
//! The `InMemoryHandler` keeps formatted records in memory rather than writing them to
//! stderr or a file, making it ideal for:
//!
//! - Unit testing code that logs through sillylog
//! - Programmatically examining rendered output, templates and backtraces included
//! - Capturing logs while stderr is redirected or unavailable

use crate::error::Result;
use crate::formatter::LevelFormatter;
use crate::handler::Handler;
use crate::level::Rank;
use crate::log_record::LogRecord;
use std::sync::{Arc, Mutex, PoisonError};

/// A handler that stores formatted records in a `Vec<String>`.
///
/// # Example
///
/// ```rust
/// use sillylog::{FormatterOptions, InMemoryHandler, LevelFormatter, Logger, SeverityTable};
/// use std::sync::Arc;
///
/// let table = Arc::new(SeverityTable::with_defaults());
/// let formatter = Arc::new(LevelFormatter::new(&table, FormatterOptions::default()).unwrap());
/// let memory = Arc::new(InMemoryHandler::new(formatter));
///
/// let logger = Logger::new("test", table);
/// logger.add_handler(memory.clone());
/// logger.status(format_args!("Test message {}", 42));
///
/// let logs = memory.drain_logs();
/// assert_eq!(logs, "Test message 42");
/// ```
#[derive(Debug)]
pub struct InMemoryHandler {
    formatter: Arc<LevelFormatter>,
    threshold: Rank,
    logs: Mutex<Vec<String>>,
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug: Derived for diagnostic purposes and required by Handler
// - Default: NOT implemented - a handler needs a formatter
// - Clone: NOT implemented - two handlers would silently split the captured logs
// - PartialEq/Eq/Hash: NOT implemented - equality semantics unclear for handlers
// - Send/Sync: Automatically implemented due to Mutex usage (required for Handler)

impl InMemoryHandler {
    /// Creates a handler with an empty buffer that accepts every record.
    pub fn new(formatter: Arc<LevelFormatter>) -> Self {
        Self {
            formatter,
            threshold: Rank(0),
            logs: Mutex::new(Vec::new()),
        }
    }

    /// Only records at or above `threshold` are kept.
    pub fn with_threshold(mut self, threshold: Rank) -> Self {
        self.threshold = threshold;
        self
    }

    /// Drains all logs into a single string, clearing the internal buffer.
    ///
    /// Records are joined with newlines; subsequent calls return an empty string until
    /// new records arrive.
    pub fn drain_logs(&self) -> String {
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        let result = logs.join("\n");
        logs.clear();
        result
    }

    /// Drains the buffer one entry per record.
    pub fn drain_records(&self) -> Vec<String> {
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *logs)
    }

    /// Writes all logs to stderr, clearing the internal buffer.
    pub fn drain_to_console(&self) {
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        for log in logs.iter() {
            eprintln!("{}", log);
        }
        logs.clear();
    }
}

impl Handler for InMemoryHandler {
    fn emit(&self, record: &LogRecord) -> Result<()> {
        let line = self.formatter.format(record)?;
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        logs.push(line);
        Ok(())
    }

    fn prepare(&self, record: &LogRecord) {
        self.formatter.prepare(record);
    }

    fn threshold(&self) -> Rank {
        self.threshold
    }

    fn prepare_to_die(&self) {
        // nothing buffered outside memory
    }
}
