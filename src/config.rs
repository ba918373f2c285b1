// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-call logger setup.
//!
//! [`get_logger`] builds a logger with a console handler and, when a log file is
//! configured, a rotating file handler, both rendering through one shared
//! [`LevelFormatter`]. The settings come from a [`LoggerConfig`], which can be written by
//! hand or read from TOML:
//!
//! ```toml
//! name = "backup"
//! level = "info"
//! file_level = "trace"
//! logfile_path = "~/.local/state/backup/backup.log"
//! auto_mkdir = true
//! exit_on = "critical"
//!
//! [rotation]
//! when = "daily"
//! backup_count = 14
//!
//! [templates]
//! info = "%(asctime)s %(message)s"
//! ```
//!
//! Every field is optional. `SILLYLOG_LEVEL` and `SILLYLOG_FILE` override `level` and
//! `logfile_path` when [`LoggerConfig::with_env_overrides`] is applied.

use crate::error::{Error, Result};
use crate::file_handler::{RotatingFileHandler, Rotation};
use crate::formatter::{FormatterOptions, LevelFormatter, app_name};
use crate::level::Rank;
use crate::logger::Logger;
use crate::paths;
use crate::severity::SeverityTable;
use crate::stream_handler::{ExitPolicy, StreamHandler};
use crate::template::Style;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable overriding [`LoggerConfig::level`].
pub const LEVEL_ENV: &str = "SILLYLOG_LEVEL";
/// Environment variable overriding [`LoggerConfig::logfile_path`].
pub const FILE_ENV: &str = "SILLYLOG_FILE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotateWhen {
    #[default]
    Daily,
    Hourly,
    Size,
}

/// `[rotation]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub when: RotateWhen,
    /// Days or hours per file, for timed rotation.
    pub interval: u32,
    /// Size limit per file, for size rotation.
    pub max_bytes: u64,
    pub backup_count: usize,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            when: RotateWhen::Daily,
            interval: 1,
            max_bytes: 10 * 1024 * 1024,
            backup_count: 7,
        }
    }
}

impl RotationConfig {
    pub fn rotation(&self) -> Result<Rotation> {
        let unit = match self.when {
            RotateWhen::Size if self.max_bytes == 0 => {
                return Err(Error::Config("rotation.max_bytes must be positive".to_string()));
            }
            RotateWhen::Size => {
                return Ok(Rotation::Size {
                    max_bytes: self.max_bytes,
                });
            }
            RotateWhen::Daily => 24 * 60 * 60,
            RotateWhen::Hourly => 60 * 60,
        };
        if self.interval == 0 {
            return Err(Error::Config("rotation.interval must be positive".to_string()));
        }
        Ok(Rotation::Timed {
            interval: Duration::from_secs(unit * u64::from(self.interval)),
        })
    }
}

/// Settings for [`get_logger`].
///
/// Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Logger name; the program name when absent.
    pub name: Option<String>,
    /// Console threshold, as a severity name or a number.
    pub level: String,
    /// File threshold; `level` when absent.
    pub file_level: Option<String>,
    pub datefmt: String,
    pub logfile_path: Option<String>,
    /// Create the log file's directory if it's missing.
    pub auto_mkdir: bool,
    /// Expand `~` and `$VAR` in `logfile_path`.
    pub shell_expand: bool,
    /// gzip rotated log files.
    pub compress: bool,
    pub rotation: RotationConfig,
    /// Severity after which the console handler exits the process.
    pub exit_on: Option<String>,
    pub exit_code: i32,
    /// Template overrides keyed by severity name.
    pub templates: BTreeMap<String, String>,
    /// Placeholder style of `templates`.
    pub style: Style,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: None,
            level: "DEBUG".to_string(),
            file_level: None,
            datefmt: FormatterOptions::default().datefmt,
            logfile_path: None,
            auto_mkdir: false,
            shell_expand: true,
            compress: true,
            rotation: RotationConfig::default(),
            exit_on: None,
            exit_code: 1,
            templates: BTreeMap::new(),
            style: Style::Percent,
        }
    }
}

impl LoggerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Applies `SILLYLOG_LEVEL` and `SILLYLOG_FILE` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides found through `lookup`, which maps variable names to values.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = lookup(LEVEL_ENV) {
            self.level = level;
        }
        if let Some(file) = lookup(FILE_ENV) {
            self.logfile_path = Some(file);
        }
        self
    }

    fn formatter_options(&self, table: &SeverityTable) -> Result<FormatterOptions> {
        let mut options = FormatterOptions::default()
            .with_datefmt(self.datefmt.clone())
            .with_style(self.style);
        for (severity, template) in &self.templates {
            options = options.with_override(table.parse_rank(severity)?, template.clone());
        }
        Ok(options)
    }

    /// The log file location after expansion and, if configured, directory creation.
    pub fn resolved_logfile(&self) -> Result<Option<PathBuf>> {
        let Some(raw) = &self.logfile_path else {
            return Ok(None);
        };
        let mut path = if self.shell_expand {
            paths::expand(raw)
        } else {
            PathBuf::from(raw)
        };
        if self.auto_mkdir {
            path = paths::flex_mkdir(&path, true)?;
        }
        Ok(Some(path))
    }

    /// Builds the logger against `table`.
    ///
    /// Severities registered in `table` after this call can't be rendered by the
    /// logger's handlers.
    pub fn build(&self, table: Arc<SeverityTable>) -> Result<Logger> {
        let level = table.parse_rank(&self.level)?;
        let file_level = match &self.file_level {
            Some(file_level) => table.parse_rank(file_level)?,
            None => level,
        };
        let exit_policy = match &self.exit_on {
            Some(severity) => ExitPolicy::On {
                rank: table.parse_rank(severity)?,
                code: self.exit_code,
            },
            None => ExitPolicy::Never,
        };
        let formatter = Arc::new(LevelFormatter::new(&table, self.formatter_options(&table)?)?);

        let name = self.name.clone().unwrap_or_else(app_name);
        let logger = Logger::new(name, table);
        // the file handler goes first so a record that exits the process is on disk
        if let Some(path) = self.resolved_logfile()? {
            let handler = RotatingFileHandler::new(path, self.rotation.rotation()?, formatter.clone())?
                .with_backup_count(self.rotation.backup_count)
                .with_compression(self.compress)
                .with_threshold(file_level);
            logger.add_handler(Arc::new(handler));
            logger.set_level(Rank(level.get().min(file_level.get())));
        } else {
            logger.set_level(level);
        }
        let console = StreamHandler::new(formatter)
            .with_threshold(level)
            .with_exit_policy(exit_policy);
        logger.add_handler(Arc::new(console));
        Ok(logger)
    }
}

/// Builds a logger from `config` against [`SeverityTable::global`].
pub fn get_logger(config: &LoggerConfig) -> Result<Arc<Logger>> {
    Ok(Arc::new(config.build(SeverityTable::global())?))
}
