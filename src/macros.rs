// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logging macros.
//!
//! Each level macro takes an optional logger followed by `format!`-style arguments:
//!
//! ```
//! use sillylog::{FormatterOptions, InMemoryHandler, LevelFormatter, Logger, SeverityTable};
//! use std::sync::Arc;
//!
//! let table = Arc::new(SeverityTable::with_defaults());
//! let formatter = Arc::new(LevelFormatter::new(&table, FormatterOptions::default()).unwrap());
//! let memory = Arc::new(InMemoryHandler::new(formatter));
//! let logger = Logger::new("db", table);
//! logger.add_handler(memory.clone());
//!
//! sillylog::status!(logger, "migrated {} tables", 3);
//! assert_eq!(memory.drain_logs(), "migrated 3 tables");
//! ```
//!
//! Without a logger, the message goes to [`root_logger`](crate::root_logger). Unlike the
//! typed methods on [`Logger`](crate::Logger), the macros record the name of the calling
//! function.

/// The [`CallSite`](crate::CallSite) of the macro invocation, including the enclosing
/// function's path.
///
/// ```
/// fn handler() -> sillylog::CallSite {
///     sillylog::callsite!()
/// }
/// let site = handler();
/// assert_eq!(site.function_name(), "handler");
/// assert!(site.function.ends_with("::handler"));
/// ```
#[macro_export]
macro_rules! callsite {
    () => {{
        fn __sillylog_here() {}
        let function: &'static str = ::std::any::type_name_of_val(&__sillylog_here);
        $crate::CallSite {
            file: ::core::file!(),
            module_path: ::core::module_path!(),
            function: function.strip_suffix("::__sillylog_here").unwrap_or(function),
            line: ::core::line!(),
            column: ::core::column!(),
        }
    }};
}

/// Logs at an arbitrary rank through `logger`.
///
/// The arguments are only formatted when the logger admits `rank`.
///
/// ```
/// # use sillylog::{Rank, Logger, SeverityTable};
/// # use std::sync::Arc;
/// let logger = Logger::new("quiet", Arc::new(SeverityTable::with_defaults()));
/// sillylog::log_at!(logger, Rank::INFO, "no handlers, {}", "no output");
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $rank:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let rank: $crate::Rank = ::core::convert::Into::into($rank);
        if logger.is_enabled_for(rank) {
            logger.log(rank, $crate::callsite!(), ::core::format_args!($($arg)+));
        }
    }};
}

/// The most verbose level. Records carry a backtrace with the default templates.
#[macro_export]
macro_rules! trace {
    ($fmt:literal $($arg:tt)*) => {
        $crate::log_at!($crate::root_logger(), $crate::Rank::TRACE, $fmt $($arg)*)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Rank::TRACE, $($arg)+)
    };
}

/// Logs at DEBUG.
#[macro_export]
macro_rules! debug {
    ($fmt:literal $($arg:tt)*) => {
        $crate::log_at!($crate::root_logger(), $crate::Rank::DEBUG, $fmt $($arg)*)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Rank::DEBUG, $($arg)+)
    };
}

/// Logs at INFO.
#[macro_export]
macro_rules! info {
    ($fmt:literal $($arg:tt)*) => {
        $crate::log_at!($crate::root_logger(), $crate::Rank::INFO, $fmt $($arg)*)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Rank::INFO, $($arg)+)
    };
}

/// Logs at WARNING.
#[macro_export]
macro_rules! warning {
    ($fmt:literal $($arg:tt)*) => {
        $crate::log_at!($crate::root_logger(), $crate::Rank::WARNING, $fmt $($arg)*)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Rank::WARNING, $($arg)+)
    };
}

/// Logs at ERROR.
#[macro_export]
macro_rules! error {
    ($fmt:literal $($arg:tt)*) => {
        $crate::log_at!($crate::root_logger(), $crate::Rank::ERROR, $fmt $($arg)*)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Rank::ERROR, $($arg)+)
    };
}

/// Logs at CRITICAL. Exits only when a handler has an [`ExitPolicy`](crate::ExitPolicy) for it.
#[macro_export]
macro_rules! critical {
    ($fmt:literal $($arg:tt)*) => {
        $crate::log_at!($crate::root_logger(), $crate::Rank::CRITICAL, $fmt $($arg)*)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Rank::CRITICAL, $($arg)+)
    };
}

/// Logs at STATUS: user-facing output that ranks above CRITICAL and, by default, renders
/// as the bare message.
#[macro_export]
macro_rules! status {
    ($fmt:literal $($arg:tt)*) => {
        $crate::log_at!($crate::root_logger(), $crate::Rank::STATUS, $fmt $($arg)*)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Rank::STATUS, $($arg)+)
    };
}
