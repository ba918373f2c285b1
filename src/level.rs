// SPDX-License-Identifier: MIT OR Apache-2.0

//! Severity ranks and the closed set of levels sillylog ships entry points for.

use serde::Deserialize;
use std::fmt::Display;

/// The numeric ordering of a severity. Lower is more verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Rank(pub u32);

impl Rank {
    pub const TRACE: Rank = Rank(Self::DEBUG.0 - 1);
    pub const DEBUG: Rank = Rank(10);
    pub const INFO: Rank = Rank(20);
    pub const WARNING: Rank = Rank(30);
    pub const ERROR: Rank = Rank(40);
    pub const CRITICAL: Rank = Rank(50);
    /// One above CRITICAL, so it fires under any conventional threshold.
    pub const STATUS: Rank = Rank(Self::CRITICAL.0 + 1);

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Rank {
    fn from(value: u32) -> Self {
        Rank(value)
    }
}

impl From<Level> for Rank {
    fn from(level: Level) -> Self {
        level.rank()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Super-verbose debugging; records carry a backtrace
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    /// `print()` through the logging system; always fires
    Status,
}

impl Level {
    pub const ALL: [Level; 7] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
        Level::Status,
    ];

    pub const fn rank(self) -> Rank {
        match self {
            Level::Trace => Rank::TRACE,
            Level::Debug => Rank::DEBUG,
            Level::Info => Rank::INFO,
            Level::Warning => Rank::WARNING,
            Level::Error => Rank::ERROR,
            Level::Critical => Rank::CRITICAL,
            Level::Status => Rank::STATUS,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Status => "STATUS",
        }
    }

    /// The name of the logger entry point bound to this level.
    pub const fn method_name(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Critical => "critical",
            Level::Status => "status",
        }
    }

    /// Whether the level exists before any registration happens.
    ///
    /// `Trace` and `Status` are extensions and are only recognized once registered in a
    /// [`SeverityTable`](crate::SeverityTable).
    pub const fn is_builtin(self) -> bool {
        !matches!(self, Level::Trace | Level::Status)
    }

    pub fn from_rank(rank: Rank) -> Option<Level> {
        Self::ALL.into_iter().find(|l| l.rank() == rank)
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_ranks_bracket_builtins() {
        assert_eq!(Rank::TRACE.get(), 9);
        assert_eq!(Rank::STATUS.get(), 51);
        let builtins: Vec<Rank> = Level::ALL
            .into_iter()
            .filter(|l| l.is_builtin())
            .map(Level::rank)
            .collect();
        assert!(builtins.iter().all(|r| *r > Rank::TRACE && *r < Rank::STATUS));
    }

    #[test]
    fn levels_are_ordered_by_rank() {
        let mut ranks: Vec<Rank> = Level::ALL.into_iter().map(Level::rank).collect();
        let sorted = {
            let mut s = ranks.clone();
            s.sort();
            s
        };
        assert_eq!(ranks, sorted);
        ranks.dedup();
        assert_eq!(ranks.len(), Level::ALL.len());
    }

    #[test]
    fn from_rank_round_trips() {
        for level in Level::ALL {
            assert_eq!(Level::from_rank(level.rank()), Some(level));
        }
        assert_eq!(Level::from_rank(Rank(25)), None);
    }
}
