// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named loggers.
//!
//! A [`Logger`] turns a call like `logger.info(format_args!(..))` into a [`LogRecord`] and
//! hands it to each of its handlers. It owns nothing about rendering: each handler brings
//! its own formatter, and the severities come from the logger's [`SeverityTable`].
//!
//! ```rust
//! use sillylog::{FormatterOptions, InMemoryHandler, LevelFormatter, Logger, Rank, SeverityTable};
//! use std::sync::Arc;
//!
//! let table = Arc::new(SeverityTable::with_defaults());
//! let formatter = Arc::new(LevelFormatter::new(&table, FormatterOptions::default()).unwrap());
//! let memory = Arc::new(InMemoryHandler::new(formatter));
//!
//! let logger = Logger::new("jobs", table);
//! logger.set_level(Rank::WARNING);
//! logger.add_handler(memory.clone());
//!
//! logger.info(format_args!("not shown"));
//! logger.warning(format_args!("disk {}% full", 91));
//! let out = memory.drain_logs();
//! assert!(out.contains("(WARNING)"));
//! assert!(out.ends_with(" disk 91% full"));
//! ```

use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::level::{Level, Rank};
use crate::log_record::{CallSite, LogRecord};
use crate::severity::SeverityTable;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug)]
pub struct Logger {
    name: String,
    threshold: AtomicU32,
    table: Arc<SeverityTable>,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
}

/*
Boilerplate notes.

# Logger

Clone would split the handler list between two loggers sharing a name; share an Arc<Logger> instead.
PartialEq/Eq/Hash: a name is not an identity, two loggers may share one. Not implemented.
Default: a logger needs a name and a table.
Display is not very sensible.
Send/Sync: yes, a logger is shared between threads.
*/

impl Logger {
    /// A logger with no handlers that admits every severity.
    pub fn new(name: impl Into<String>, table: Arc<SeverityTable>) -> Self {
        Self {
            name: name.into(),
            threshold: AtomicU32::new(0),
            table,
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &Arc<SeverityTable> {
        &self.table
    }

    /// Records below `rank` are dropped before any handler sees them.
    pub fn set_level(&self, rank: impl Into<Rank>) {
        self.threshold.store(rank.into().get(), Ordering::Relaxed);
    }

    pub fn level(&self) -> Rank {
        Rank(self.threshold.load(Ordering::Relaxed))
    }

    pub fn is_enabled_for(&self, rank: Rank) -> bool {
        rank >= self.level()
    }

    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    /// Replaces every handler.
    pub fn set_handlers(&self, handlers: Vec<Arc<dyn Handler>>) {
        *self.handlers.write().unwrap_or_else(PoisonError::into_inner) = handlers;
    }

    /// A snapshot of the current handlers.
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Flushes every handler.
    pub fn flush(&self) {
        for handler in self.handlers() {
            handler.prepare_to_die();
        }
    }

    /// Builds the record for `rank`, or `None` when the logger's level filters it out.
    fn record(&self, rank: Rank, call_site: CallSite, args: fmt::Arguments<'_>) -> Result<Option<LogRecord>> {
        if !self.is_enabled_for(rank) {
            return Ok(None);
        }
        let severity = self
            .table
            .by_rank(rank)
            .ok_or_else(|| Error::UnknownSeverity(self.table.level_name(rank)))?;
        Ok(Some(LogRecord::new(&severity, &self.name, call_site, args.to_string())))
    }

    /// Handlers whose threshold admits `record`, already prepared for it.
    fn eligible(&self, record: &LogRecord) -> Vec<Arc<dyn Handler>> {
        let handlers: Vec<Arc<dyn Handler>> = self
            .handlers()
            .into_iter()
            .filter(|h| record.rank() >= h.threshold())
            .collect();
        for handler in &handlers {
            handler.prepare(record);
        }
        handlers
    }

    /// Passes `record` to every handler that admits it, bypassing the logger's level.
    ///
    /// Every handler runs; the first error is returned.
    pub fn handle(&self, record: &LogRecord) -> Result<()> {
        let mut first_error = None;
        for handler in self.eligible(record) {
            if let Err(e) = handler.emit(record) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Logs at `rank`, reporting every failure to the caller.
    ///
    /// Fails with [`Error::UnknownSeverity`] when `rank` isn't registered in the logger's
    /// table, and with whatever a handler returns otherwise.
    pub fn try_log(&self, rank: Rank, call_site: CallSite, args: fmt::Arguments<'_>) -> Result<()> {
        match self.record(rank, call_site, args)? {
            Some(record) => self.handle(&record),
            None => Ok(()),
        }
    }

    /// Logs at `rank`.
    ///
    /// # Panics
    ///
    /// When the severity or its template is misconfigured. I/O failures are reported on
    /// stderr instead.
    pub fn log(&self, rank: Rank, call_site: CallSite, args: fmt::Arguments<'_>) {
        report(self.try_log(rank, call_site, args));
    }

    /// Logs at `rank`, awaiting each handler's asynchronous path.
    ///
    /// The record, and its backtrace if any handler shows one, is built before the
    /// returned future first runs.
    pub fn log_async<'s>(
        &'s self,
        rank: Rank,
        call_site: CallSite,
        args: fmt::Arguments<'_>,
    ) -> impl Future<Output = Result<()>> + Send + use<'s> {
        let prepared = self
            .record(rank, call_site, args)
            .map(|record| record.map(|record| (self.eligible(&record), record)));
        async move {
            let Some((handlers, record)) = prepared? else {
                return Ok(());
            };
            let mut first_error = None;
            for handler in handlers {
                if let Err(e) = handler.emit_async(&record).await {
                    first_error.get_or_insert(e);
                }
            }
            first_error.map_or(Ok(()), Err)
        }
    }

    /// Logs at the severity bound to `method`, as registered with
    /// [`SeverityTable::register`].
    #[track_caller]
    pub fn log_named(&self, method: &str, args: fmt::Arguments<'_>) -> Result<()> {
        let call_site = CallSite::caller();
        let severity = self
            .table
            .by_method(method)
            .ok_or_else(|| Error::UnknownSeverity(method.to_string()))?;
        self.try_log(severity.rank, call_site, args)
    }

    /// Logs `err` at ERROR, with its chain of sources after the message.
    #[track_caller]
    pub fn exception(&self, err: &dyn std::error::Error, args: fmt::Arguments<'_>) {
        let call_site = CallSite::caller();
        let result = self
            .record(Rank::ERROR, call_site, args)
            .and_then(|record| match record {
                Some(record) => self.handle(&record.with_exc_text(error_chain(err))),
                None => Ok(()),
            });
        report(result);
    }

    #[track_caller]
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Trace.rank(), CallSite::caller(), args);
    }

    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug.rank(), CallSite::caller(), args);
    }

    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info.rank(), CallSite::caller(), args);
    }

    #[track_caller]
    pub fn warning(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warning.rank(), CallSite::caller(), args);
    }

    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error.rank(), CallSite::caller(), args);
    }

    #[track_caller]
    pub fn critical(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Critical.rank(), CallSite::caller(), args);
    }

    #[track_caller]
    pub fn status(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Status.rank(), CallSite::caller(), args);
    }
}

fn report(result: Result<()>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_misconfiguration() => panic!("{e}"),
        Err(e) => eprintln!("sillylog: {e}"),
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = format!("Error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{FormatterOptions, LevelFormatter};
    use crate::inmemory_handler::InMemoryHandler;

    fn setup(table: SeverityTable) -> (Logger, Arc<InMemoryHandler>) {
        let table = Arc::new(table);
        let formatter = Arc::new(LevelFormatter::new(&table, FormatterOptions::default()).unwrap());
        let memory = Arc::new(InMemoryHandler::new(formatter));
        let logger = Logger::new("t", table);
        logger.add_handler(memory.clone());
        (logger, memory)
    }

    #[test]
    fn level_filters_before_handlers() {
        let (logger, memory) = setup(SeverityTable::with_defaults());
        logger.set_level(Level::Warning);
        assert!(!logger.is_enabled_for(Rank::INFO));
        logger.info(format_args!("hidden"));
        logger.status(format_args!("shown"));
        assert_eq!(memory.drain_logs(), "shown");
    }

    #[test]
    fn handler_thresholds_are_independent() {
        let table = Arc::new(SeverityTable::with_defaults());
        let formatter = Arc::new(LevelFormatter::new(&table, FormatterOptions::default()).unwrap());
        let all = Arc::new(InMemoryHandler::new(formatter.clone()));
        let loud = Arc::new(InMemoryHandler::new(formatter).with_threshold(Rank::CRITICAL));
        let logger = Logger::new("t", table);
        logger.set_handlers(vec![all.clone(), loud.clone()]);
        logger.status(format_args!("a"));
        logger.log(Rank::ERROR, CallSite::caller(), format_args!("b"));
        assert_eq!(all.drain_records().len(), 2);
        assert_eq!(loud.drain_logs(), "a");
    }

    #[test]
    fn unregistered_rank_is_an_error() {
        let (logger, _memory) = setup(SeverityTable::builtin());
        let err = logger
            .try_log(Rank::STATUS, CallSite::caller(), format_args!("x"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownSeverity(ref name) if name == "Level 51"));
    }

    #[test]
    #[should_panic(expected = "unknown severity")]
    fn infallible_log_panics_on_misconfiguration() {
        let (logger, _memory) = setup(SeverityTable::builtin());
        logger.trace(format_args!("x"));
    }

    #[test]
    fn late_registration_is_misconfigured() {
        let (logger, memory) = setup(SeverityTable::with_defaults());
        logger.table().register("NOTICE", Rank(25), Some("notice")).unwrap();
        let err = logger.log_named("notice", format_args!("x")).unwrap_err();
        assert!(matches!(err, Error::MisconfiguredSeverity(Rank(25))));
        assert!(memory.drain_records().is_empty());
    }

    #[test]
    fn named_severity_logs() {
        let table = SeverityTable::with_defaults();
        table.register("NOTICE", Rank(25), Some("notice")).unwrap();
        let (logger, memory) = setup(table);
        logger.log_named("notice", format_args!("n={}", 1)).unwrap();
        assert!(memory.drain_logs().ends_with("n=1"));
        assert!(matches!(
            logger.log_named("nope", format_args!("x")),
            Err(Error::UnknownSeverity(_))
        ));
    }

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("loading config")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn exception_appends_source_chain() {
        let (logger, memory) = setup(SeverityTable::with_defaults());
        let err = Outer(std::io::Error::other("file missing"));
        logger.exception(&err, format_args!("startup failed"));
        let out = memory.drain_logs();
        assert!(out.contains("startup failed"));
        assert!(out.ends_with("Error: loading config\n  caused by: file missing"), "{out}");
    }

    #[test]
    fn handle_bypasses_logger_level() {
        let (logger, memory) = setup(SeverityTable::with_defaults());
        logger.set_level(Rank(100));
        let severity = logger.table().by_rank(Rank::STATUS).unwrap();
        logger
            .handle(&LogRecord::new(&severity, "t", CallSite::caller(), "direct".into()))
            .unwrap();
        assert_eq!(memory.drain_logs(), "direct");
    }

    #[test_executors::async_test]
    async fn async_path_reaches_handlers() {
        let (logger, memory) = setup(SeverityTable::with_defaults());
        logger
            .log_async(Rank::STATUS, CallSite::caller(), format_args!("async {}", 7))
            .await
            .unwrap();
        assert_eq!(memory.drain_logs(), "async 7");
    }
}
