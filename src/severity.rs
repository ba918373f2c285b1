// SPDX-License-Identifier: MIT OR Apache-2.0

//! The severity registry.
//!
//! A [`SeverityTable`] knows every severity a logger may emit: its name, its rank and the
//! name of the entry point bound to it. Tables are ordinary values shared through `Arc`,
//! so a logger and every formatter attached to it agree on the same set of severities.
//! For callers who don't want to thread a table around there is one process-wide
//! instance, [`SeverityTable::global`], created on first use with the default
//! extensions (TRACE and STATUS) registered.
//!
//! # Registration
//!
//! Registration is init-time work. Severities are never removed, and a second
//! registration of the same name is an error rather than an overwrite:
//!
//! ```
//! use sillylog::{Rank, SeverityTable};
//!
//! let table = SeverityTable::builtin();
//! table.register("NOTICE", Rank(25), None).unwrap();
//! assert!(table.register("NOTICE", Rank(26), None).is_err());
//! assert_eq!(table.by_name("notice").unwrap().rank, Rank(25));
//! ```
//!
//! All checks and the insertion happen under one write lock. When two threads race to
//! register the same severity, one wins and the other receives
//! [`Error::DuplicateDefinition`].

use crate::error::{DefinitionKind, Error, Result};
use crate::level::{Level, Rank};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Entry points every logger has regardless of the registered severities.
///
/// A severity may not bind its method to one of these names.
pub const RESERVED_METHOD_NAMES: &[&str] = &[
    "log",
    "try_log",
    "log_async",
    "log_named",
    "exception",
    "fatal",
    "warn",
    "name",
    "level",
    "set_level",
    "is_enabled_for",
    "add_handler",
    "set_handlers",
    "handlers",
    "flush",
    "table",
];

/// A named, ranked category of log message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Severity {
    pub name: String,
    pub rank: Rank,
    /// Name of the logger entry point that logs at this severity.
    pub method_name: String,
}

impl Severity {
    fn from_level(level: Level) -> Self {
        Self {
            name: level.name().to_string(),
            rank: level.rank(),
            method_name: level.method_name().to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct Entries {
    by_rank: BTreeMap<Rank, Severity>,
}

impl Entries {
    fn by_name(&self, name: &str) -> Option<&Severity> {
        self.by_rank
            .values()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    fn by_method(&self, method_name: &str) -> Option<&Severity> {
        self.by_rank.values().find(|s| s.method_name == method_name)
    }
}

/// The set of severities recognized by the loggers and formatters sharing it.
#[derive(Debug)]
pub struct SeverityTable {
    entries: RwLock<Entries>,
}

static GLOBAL_TABLE: OnceLock<Arc<SeverityTable>> = OnceLock::new();

impl SeverityTable {
    /// A table holding only the conventional severities, DEBUG through CRITICAL.
    pub fn builtin() -> Self {
        let by_rank = Level::ALL
            .into_iter()
            .filter(|l| l.is_builtin())
            .map(|l| (l.rank(), Severity::from_level(l)))
            .collect();
        Self {
            entries: RwLock::new(Entries { by_rank }),
        }
    }

    /// The built-in severities plus STATUS (one above CRITICAL) and TRACE (one below DEBUG).
    pub fn with_defaults() -> Self {
        let table = Self::builtin();
        // a fresh builtin table cannot already hold these
        for level in [Level::Status, Level::Trace] {
            if let Err(e) = table.register(level.name(), level.rank(), Some(level.method_name())) {
                unreachable!("default severity {level} rejected: {e}");
            }
        }
        table
    }

    /// The process-wide table, created with [`Self::with_defaults`] on first use.
    pub fn global() -> Arc<SeverityTable> {
        GLOBAL_TABLE
            .get_or_init(|| Arc::new(SeverityTable::with_defaults()))
            .clone()
    }

    /// Registers a new severity.
    ///
    /// `method_name` defaults to `name` in lower case. Fails with
    /// [`Error::DuplicateDefinition`] when the name, the method name or the rank is already
    /// taken, or when the method name is one of [`RESERVED_METHOD_NAMES`]. On failure the
    /// table is unchanged.
    pub fn register(&self, name: &str, rank: Rank, method_name: Option<&str>) -> Result<Severity> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!("invalid severity name {name:?}")));
        }
        let method_name = match method_name {
            Some(m) => m.to_string(),
            None => name.to_lowercase(),
        };

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.by_name(name).is_some() {
            return Err(Error::DuplicateDefinition {
                kind: DefinitionKind::SeverityName,
                name: name.to_string(),
            });
        }
        if entries.by_method(&method_name).is_some() {
            return Err(Error::DuplicateDefinition {
                kind: DefinitionKind::MethodName,
                name: method_name,
            });
        }
        // the typed entry points are bound to fixed ranks
        let typed_mismatch = Level::ALL
            .into_iter()
            .any(|l| l.method_name() == method_name && (l.rank() != rank || l.name() != name));
        if typed_mismatch || RESERVED_METHOD_NAMES.contains(&method_name.as_str()) {
            return Err(Error::DuplicateDefinition {
                kind: DefinitionKind::LoggerMethod,
                name: method_name,
            });
        }
        if let Some(existing) = entries.by_rank.get(&rank) {
            return Err(Error::DuplicateDefinition {
                kind: DefinitionKind::Rank,
                name: format!("{rank} ({})", existing.name),
            });
        }

        let severity = Severity {
            name: name.to_string(),
            rank,
            method_name,
        };
        entries.by_rank.insert(rank, severity.clone());
        Ok(severity)
    }

    fn read<R>(&self, f: impl FnOnce(&Entries) -> R) -> R {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        f(&entries)
    }

    /// Looks a severity up by name, ignoring ASCII case.
    pub fn by_name(&self, name: &str) -> Option<Severity> {
        self.read(|e| e.by_name(name).cloned())
    }

    pub fn by_rank(&self, rank: Rank) -> Option<Severity> {
        self.read(|e| e.by_rank.get(&rank).cloned())
    }

    pub fn by_method(&self, method_name: &str) -> Option<Severity> {
        self.read(|e| e.by_method(method_name).cloned())
    }

    pub fn contains_rank(&self, rank: Rank) -> bool {
        self.read(|e| e.by_rank.contains_key(&rank))
    }

    /// The name for `rank`, or `"Level N"` when nothing is registered there.
    pub fn level_name(&self, rank: Rank) -> String {
        self.read(|e| match e.by_rank.get(&rank) {
            Some(s) => s.name.clone(),
            None => format!("Level {rank}"),
        })
    }

    /// Every registered severity, most verbose first.
    pub fn severities(&self) -> Vec<Severity> {
        self.read(|e| e.by_rank.values().cloned().collect())
    }

    /// Parses a threshold given as a severity name (`"trace"`, `"WARNING"`) or a number.
    pub fn parse_rank(&self, text: &str) -> Result<Rank> {
        let text = text.trim();
        if let Ok(n) = text.parse::<u32>() {
            return Ok(Rank(n));
        }
        self.by_name(text)
            .map(|s| s.rank)
            .ok_or_else(|| Error::UnknownSeverity(text.to_string()))
    }
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/*
Boilerplate notes for SeverityTable.

Clone is deliberately absent: a table is shared through Arc, and a clone would silently fork
the registry so that registrations stop reaching formatters built from the original.
PartialEq/Eq/Hash would require taking the lock inside comparisons; no use for it.
Default is with_defaults(), matching global().
Send/Sync come from RwLock.
*/

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn builtin_has_conventional_levels_only() {
        let table = SeverityTable::builtin();
        let names: Vec<String> = table.severities().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]);
        assert!(!table.contains_rank(Rank::TRACE));
        assert!(!table.contains_rank(Rank::STATUS));
    }

    #[test]
    fn defaults_register_status_and_trace() {
        let table = SeverityTable::with_defaults();
        let status = table.by_name("STATUS").unwrap();
        assert_eq!(status.rank, Rank(51));
        assert_eq!(status.method_name, "status");
        let trace = table.by_method("trace").unwrap();
        assert_eq!(trace.rank, Rank(9));
        assert_eq!(table.severities().len(), 7);
    }

    #[test]
    fn duplicate_name_is_rejected_and_first_kept() {
        let table = SeverityTable::builtin();
        let first = table.register("NOTICE", Rank(25), None).unwrap();
        let err = table.register("NOTICE", Rank(26), Some("notice2")).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateDefinition { kind: DefinitionKind::SeverityName, .. }
        ));
        assert_eq!(table.by_name("NOTICE"), Some(first));
        assert!(!table.contains_rank(Rank(26)));
    }

    #[test]
    fn duplicate_method_is_rejected() {
        let table = SeverityTable::builtin();
        let err = table.register("VERBOSE", Rank(15), Some("debug")).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateDefinition { kind: DefinitionKind::MethodName, .. }
        ));
    }

    #[test]
    fn reserved_logger_method_is_rejected() {
        let table = SeverityTable::builtin();
        let err = table.register("LOG", Rank(15), None).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateDefinition { kind: DefinitionKind::LoggerMethod, .. }
        ));
        assert!(table.by_name("LOG").is_none());
    }

    #[test]
    fn typed_entry_point_needs_its_own_rank() {
        let table = SeverityTable::builtin();
        assert!(table.register("VERBOSE", Rank(5), Some("trace")).is_err());
        let trace = table.register("TRACE", Rank::TRACE, None).unwrap();
        assert_eq!(trace.method_name, "trace");
    }

    #[test]
    fn rank_collision_is_rejected() {
        let table = SeverityTable::builtin();
        let err = table.register("ALSO_INFO", Rank::INFO, None).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateDefinition { kind: DefinitionKind::Rank, .. }
        ));
        assert_eq!(table.level_name(Rank::INFO), "INFO");
    }

    #[test]
    fn level_name_falls_back_for_unknown_rank() {
        let table = SeverityTable::builtin();
        assert_eq!(table.level_name(Rank(33)), "Level 33");
    }

    #[test]
    fn parse_rank_accepts_names_and_numbers() {
        let table = SeverityTable::with_defaults();
        assert_eq!(table.parse_rank("trace").unwrap(), Rank::TRACE);
        assert_eq!(table.parse_rank(" Warning ").unwrap(), Rank::WARNING);
        assert_eq!(table.parse_rank("42").unwrap(), Rank(42));
        assert!(matches!(
            table.parse_rank("loud"),
            Err(Error::UnknownSeverity(_))
        ));
    }

    #[test]
    fn concurrent_registration_has_one_winner() {
        let table = Arc::new(SeverityTable::builtin());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = table.clone();
                thread::spawn(move || table.register("RACE", Rank(100 + i), None).is_ok())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().expect("thread should complete"))
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(
            table
                .severities()
                .iter()
                .filter(|s| s.name == "RACE")
                .count(),
            1
        );
    }

    #[test]
    fn global_is_shared() {
        let a = SeverityTable::global();
        let b = SeverityTable::global();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.contains_rank(Rank::TRACE));
        assert!(a.contains_rank(Rank::STATUS));
    }
}
