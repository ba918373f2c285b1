// SPDX-License-Identifier: MIT OR Apache-2.0

//! The process-wide root logger.
//!
//! The level macros ([`info!`](crate::info), [`status!`](crate::status), ...) log here
//! when no logger is named. The root logger is created on first use, bound to
//! [`SeverityTable::global`], at DEBUG, with one [`StreamHandler`] writing to stderr.
//!
//! Severities are resolved against the global table when the default handler is built.
//! Register extension severities before the first root log call, or install handlers
//! built afterwards with [`set_root_handlers`].
//!
//! ```
//! use sillylog::{FormatterOptions, InMemoryHandler, LevelFormatter, SeverityTable};
//! use std::sync::Arc;
//!
//! let table = SeverityTable::global();
//! let formatter = Arc::new(LevelFormatter::new(&table, FormatterOptions::default()).unwrap());
//! let memory = Arc::new(InMemoryHandler::new(formatter));
//! sillylog::root::set_root_handlers(vec![memory.clone()]);
//!
//! sillylog::status!("{} files copied", 12);
//! assert_eq!(memory.drain_logs(), "12 files copied");
//! ```

use crate::error::Result;
use crate::formatter::{FormatterOptions, LevelFormatter};
use crate::handler::Handler;
use crate::level::Level;
use crate::log_record::CallSite;
use crate::logger::Logger;
use crate::severity::SeverityTable;
use crate::stream_handler::StreamHandler;
use std::fmt;
use std::sync::{Arc, OnceLock};

static ROOT_LOGGER: OnceLock<Arc<Logger>> = OnceLock::new();

/// The root logger, created on first call.
pub fn root_logger() -> Arc<Logger> {
    ROOT_LOGGER
        .get_or_init(|| {
            let table = SeverityTable::global();
            let logger = Logger::new("root", table.clone());
            logger.set_level(Level::Debug);
            match LevelFormatter::new(&table, FormatterOptions::default()) {
                Ok(formatter) => logger.add_handler(Arc::new(StreamHandler::new(Arc::new(formatter)))),
                Err(e) => eprintln!("sillylog: root logger has no console handler: {e}"),
            }
            Arc::new(logger)
        })
        .clone()
}

/// Replaces every handler of the root logger.
pub fn set_root_handlers(handlers: Vec<Arc<dyn Handler>>) {
    root_logger().set_handlers(handlers);
}

/// Adds a handler to the root logger, next to the ones it has.
pub fn add_root_handler(handler: Arc<dyn Handler>) {
    root_logger().add_handler(handler);
}

/// Logs through the root logger at the severity bound to `method`.
#[track_caller]
pub fn log_named(method: &str, args: fmt::Arguments<'_>) -> Result<()> {
    let call_site = CallSite::caller();
    let logger = root_logger();
    let severity = logger
        .table()
        .by_method(method)
        .ok_or_else(|| crate::error::Error::UnknownSeverity(method.to_string()))?;
    logger.try_log(severity.rank, call_site, args)
}
