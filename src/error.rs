// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for sillylog.
//!
//! Two classes of failure live here. Configuration mistakes (a duplicate severity, a
//! template naming a field that doesn't exist, a record whose rank has no template) are
//! programmer errors and are reported as soon as they are detected. I/O failures from the
//! file and console handlers are passed through unchanged.

use crate::level::Rank;
use std::io;
use thiserror::Error;

/// What a [`Error::DuplicateDefinition`] collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    /// A severity with this name is already registered.
    SeverityName,
    /// A severity already binds this method name.
    MethodName,
    /// The method name is one of the logger's own entry points.
    LoggerMethod,
    /// A severity with this rank is already registered.
    Rank,
}

impl std::fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DefinitionKind::SeverityName => "severity name",
            DefinitionKind::MethodName => "severity method",
            DefinitionKind::LoggerMethod => "logger method",
            DefinitionKind::Rank => "severity rank",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} {name} already defined")]
    DuplicateDefinition { kind: DefinitionKind, name: String },

    #[error("misconfigured severity: no template for rank {0}")]
    MisconfiguredSeverity(Rank),

    #[error("unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("bad template {template:?}: {reason}")]
    Template { template: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error is a programmer error rather than a runtime condition.
    pub fn is_misconfiguration(&self) -> bool {
        !matches!(self, Error::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
