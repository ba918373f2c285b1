// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log record type for sillylog.
//!
//! A [`LogRecord`] is the structured form of one log event before it is rendered: the
//! severity, the already-interpolated message, when and where it was emitted, and an
//! optional backtrace. Loggers build one record per call and hand a reference to every
//! handler; each handler renders it with its own formatter.
//!
//! # Example
//!
//! ```rust
//! use sillylog::{LogRecord, SeverityTable, Level, callsite};
//!
//! let table = SeverityTable::with_defaults();
//! let severity = table.by_rank(Level::Info.rank()).unwrap();
//! let record = LogRecord::new(&severity, "main", callsite!(), "Processing request #42".to_string());
//! assert_eq!(record.level_name(), "INFO");
//! assert_eq!(record.message(), "Processing request #42");
//! ```

use crate::level::Rank;
use crate::severity::Severity;
use chrono::{DateTime, Local};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static INITIAL_TIMESTAMP: OnceLock<Instant> = OnceLock::new();

fn initial_timestamp() -> Instant {
    *INITIAL_TIMESTAMP.get_or_init(Instant::now)
}

/// Where a log call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub file: &'static str,
    pub module_path: &'static str,
    /// Full path of the calling function, or `"?"` when it is not known.
    pub function: &'static str,
    pub line: u32,
    pub column: u32,
}

impl CallSite {
    /// The call site of the caller, for `#[track_caller]` entry points.
    ///
    /// The function name is not available this way. Formatters that show it look it up
    /// on the stack instead, see [`LogRecord::function_name`].
    #[track_caller]
    pub fn caller() -> Self {
        let location = std::panic::Location::caller();
        Self {
            file: location.file(),
            module_path: "?",
            function: "?",
            line: location.line(),
            column: location.column(),
        }
    }

    /// Last path segment of the file, as `%(filename)s` shows it.
    pub fn file_name(&self) -> &'static str {
        let file = self.file;
        file.rsplit(['/', '\\']).next().unwrap_or(file)
    }

    /// Name of the calling function without its module path or closure suffixes.
    pub fn function_name(&self) -> &'static str {
        short_function_name(self.function)
    }

    pub fn knows_function(&self) -> bool {
        self.function != "?"
    }

    /// Last segment of the module path.
    pub fn module(&self) -> &'static str {
        self.module_path.rsplit("::").next().unwrap_or(self.module_path)
    }
}

fn short_function_name(path: &str) -> &str {
    let mut f = path;
    while let Some(stripped) = f.strip_suffix("::{{closure}}") {
        f = stripped;
    }
    f.rsplit("::").next().unwrap_or(f)
}

/// One log event.
///
/// The record is immutable once built, with two exceptions that are each filled at most
/// once: the backtrace, and the function name of a call site that didn't carry one.
/// Both are set by the first formatter that needs them. Every later reader sees the
/// same text, so rendering a record twice gives the same output.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    rank: Rank,
    level_name: String,
    logger_name: String,
    message: String,
    created: DateTime<Local>,
    relative: Duration,
    call_site: CallSite,
    process: u32,
    thread_name: String,
    exc_text: Option<String>,
    backtrace: OnceLock<String>,
    function: OnceLock<String>,
}

impl LogRecord {
    pub fn new(severity: &Severity, logger_name: &str, call_site: CallSite, message: String) -> Self {
        Self::with_rank(severity.rank, &severity.name, logger_name, call_site, message)
    }

    /// Builds a record for a rank that may not be registered anywhere.
    pub fn with_rank(
        rank: Rank,
        level_name: &str,
        logger_name: &str,
        call_site: CallSite,
        message: String,
    ) -> Self {
        let now = Instant::now();
        let thread = std::thread::current();
        Self {
            rank,
            level_name: level_name.to_string(),
            logger_name: logger_name.to_string(),
            message,
            created: Local::now(),
            relative: now.duration_since(initial_timestamp()),
            call_site,
            process: std::process::id(),
            thread_name: thread.name().unwrap_or("<unnamed>").to_string(),
            exc_text: None,
            backtrace: OnceLock::new(),
            function: OnceLock::new(),
        }
    }

    /// Attaches exception text, rendered on its own lines after the formatted message.
    pub fn with_exc_text(mut self, text: String) -> Self {
        self.exc_text = Some(text);
        self
    }

    /// Attaches a rendered backtrace unless one is already present.
    ///
    /// Returns the backtrace the record ends up with.
    pub fn attach_backtrace(&self, lines: Vec<String>) -> &str {
        self.backtrace.get_or_init(|| lines.join("\n"))
    }

    pub(crate) fn backtrace_or_init(&self, f: impl FnOnce() -> Vec<String>) -> &str {
        self.backtrace.get_or_init(|| f().join("\n"))
    }

    pub fn backtrace(&self) -> Option<&str> {
        self.backtrace.get().map(String::as_str)
    }

    /// Short name of the function that logged, as `%(funcName)s` shows it.
    ///
    /// Taken from the call site when it has one, otherwise from the stack lookup done by
    /// a formatter. `"?"` when neither is known.
    pub fn function_name(&self) -> &str {
        if self.call_site.knows_function() {
            return self.call_site.function_name();
        }
        self.function.get().map_or("?", String::as_str)
    }

    pub(crate) fn function_or_init(&self, f: impl FnOnce() -> Option<String>) -> &str {
        if self.call_site.knows_function() {
            return self.call_site.function_name();
        }
        self.function.get_or_init(|| {
            f().map_or_else(|| "?".to_string(), |path| short_function_name(&path).to_string())
        })
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }
    pub fn level_name(&self) -> &str {
        &self.level_name
    }
    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }
    pub fn message(&self) -> &str {
        &self.message
    }
    pub fn created(&self) -> DateTime<Local> {
        self.created
    }
    /// Time since the first record of this process was created.
    pub fn relative(&self) -> Duration {
        self.relative
    }
    pub fn call_site(&self) -> &CallSite {
        &self.call_site
    }
    pub fn process(&self) -> u32 {
        self.process
    }
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }
    pub fn exc_text(&self) -> Option<&str> {
        self.exc_text.as_deref()
    }
}

/*
Boilerplate notes for LogRecord:

IMPLEMENTED:
- Debug, Clone, PartialEq: derived
NOT IMPLEMENTED:
- Eq/Hash: OnceLock<String> has no Hash, and records are not map keys anyway
- Default: a record without a severity is meaningless
- Display: rendering is the formatter's job; there is no single right rendering
*/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::severity::SeverityTable;

    fn site(function: &'static str) -> CallSite {
        CallSite {
            file: "src/bin/tool.rs",
            module_path: "tool::commands",
            function,
            line: 12,
            column: 5,
        }
    }

    #[test]
    fn call_site_short_names() {
        let s = site("tool::commands::run::{{closure}}::{{closure}}");
        assert_eq!(s.file_name(), "tool.rs");
        assert_eq!(s.function_name(), "run");
        assert_eq!(s.module(), "commands");
    }

    #[test]
    fn caller_reports_this_file() {
        let s = CallSite::caller();
        assert!(s.file.ends_with("log_record.rs"));
        assert_eq!(s.function, "?");
        assert!(!s.knows_function());
    }

    #[test]
    fn function_name_is_resolved_once() {
        let table = SeverityTable::with_defaults();
        let severity = table.by_rank(Rank::WARNING).unwrap();
        let record = LogRecord::new(&severity, "t", CallSite::caller(), "m".to_string());
        assert_eq!(record.function_name(), "?");
        let resolved = record.function_or_init(|| Some("tool::jobs::sync::{{closure}}".to_string()));
        assert_eq!(resolved, "sync");
        record.function_or_init(|| Some("tool::other".to_string()));
        assert_eq!(record.function_name(), "sync");
    }

    #[test]
    fn known_call_site_wins_over_lookup() {
        let table = SeverityTable::with_defaults();
        let severity = table.by_rank(Rank::WARNING).unwrap();
        let record = LogRecord::new(&severity, "t", site("tool::commands::run"), "m".to_string());
        assert_eq!(record.function_or_init(|| Some("tool::other".to_string())), "run");
        assert_eq!(record.function_name(), "run");
    }

    #[test]
    fn backtrace_attaches_once() {
        let table = SeverityTable::with_defaults();
        let severity = table.by_rank(Level::Trace.rank()).unwrap();
        let record = LogRecord::new(&severity, "t", site("t::f"), "m".to_string());
        assert_eq!(record.backtrace(), None);
        assert_eq!(record.attach_backtrace(vec!["a".into(), "b".into()]), "a\nb");
        assert_eq!(record.attach_backtrace(vec!["c".into()]), "a\nb");
        assert_eq!(record.backtrace(), Some("a\nb"));
    }

    #[test]
    fn relative_time_is_monotonic() {
        let table = SeverityTable::builtin();
        let severity = table.by_rank(Rank::INFO).unwrap();
        let first = LogRecord::new(&severity, "t", site("t::f"), "1".to_string());
        let second = LogRecord::new(&severity, "t", site("t::f"), "2".to_string());
        assert!(second.relative() >= first.relative());
    }
}
