// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-severity formatting.
//!
//! A [`LevelFormatter`] holds one compiled [`Template`] per severity rank and picks the
//! right one for each record. The map is built once and never changes afterwards, so
//! [`LevelFormatter::format`] is a pure function of the record and the map. One formatter
//! can be shared by every handler of a logger and used from any number of threads.
//!
//! # Default templates
//!
//! | Severity          | Template                                                  |
//! |-------------------|-----------------------------------------------------------|
//! | STATUS            | message only                                              |
//! | INFO              | time, level, app name, message                            |
//! | WARNING, ERROR    | adds logger name, file and function                       |
//! | DEBUG             | adds the line number                                      |
//! | CRITICAL          | the DEBUG layout set off by blank lines                   |
//! | TRACE             | the DEBUG layout followed by a backtrace                  |
//!
//! Any other severity registered in the table gets [`FormatterOptions::default_template`],
//! or [`EXTENSION_TEMPLATE`] when none is set.
//! Overrides are merged per rank on top of all of this.
//!
//! # Example
//!
//! ```
//! use sillylog::{FormatterOptions, LevelFormatter, LogRecord, Rank, SeverityTable, callsite};
//!
//! let table = SeverityTable::with_defaults();
//! let options = FormatterOptions::default()
//!     .with_override(Rank::INFO, "%(levelname)s %(message)s");
//! let formatter = LevelFormatter::new(&table, options).unwrap();
//!
//! let info = table.by_rank(Rank::INFO).unwrap();
//! let record = LogRecord::new(&info, "main", callsite!(), "ready".to_string());
//! assert_eq!(formatter.format(&record).unwrap(), "INFO ready");
//!
//! let status = table.by_rank(Rank::STATUS).unwrap();
//! let record = LogRecord::new(&status, "main", callsite!(), "42 files".to_string());
//! assert_eq!(formatter.format(&record).unwrap(), "42 files");
//! ```

use crate::error::{Error, Result};
use crate::level::{Level, Rank};
use crate::log_record::LogRecord;
use crate::severity::SeverityTable;
use crate::stack::{StackOptions, caller_function};
use crate::template::{Style, Template, validate_datefmt};
use std::collections::HashMap;
use std::path::Path;

macro_rules! verbose_head {
    () => {
        "%(asctime)s(%(levelname)s)\t%(appname)s %(name)8s %(filename)s::%(funcName)s"
    };
}

const PLAIN: &str = "%(message)s";
const BASIC: &str = "%(asctime)s(%(levelname)s) %(appname)s %(message)s";
const VERBOSE: &str = concat!(verbose_head!(), " %(message)s");
const EXTRA_VERBOSE: &str = concat!(verbose_head!(), "::%(lineno)d %(message)s");
const EXTREME_VERBOSE: &str = concat!(verbose_head!(), "::%(lineno)d %(message)s\n%(backtrace)s");
const ERROR_BLOCK: &str = concat!("\n...", verbose_head!(), "::%(lineno)d %(message)s\n");

/// Template for registered severities without a built-in one, in [`Style::Percent`].
pub const EXTENSION_TEMPLATE: &str = "%(levelname)s: %(message)s";

/// The built-in template for `level`, in [`Style::Percent`].
pub const fn default_template(level: Level) -> &'static str {
    match level {
        Level::Trace => EXTREME_VERBOSE,
        Level::Debug => EXTRA_VERBOSE,
        Level::Info => BASIC,
        Level::Warning | Level::Error => VERBOSE,
        Level::Critical => ERROR_BLOCK,
        Level::Status => PLAIN,
    }
}

/// The name templates see as `appname`: the file name of `argv[0]`.
pub fn app_name() -> String {
    std::env::args_os()
        .next()
        .and_then(|arg| {
            Path::new(&arg)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

/// Construction parameters for [`LevelFormatter`].
#[derive(Debug, Clone, PartialEq)]
pub struct FormatterOptions {
    /// Templates replacing (or adding to) the defaults, keyed by rank.
    pub overrides: HashMap<Rank, String>,
    /// Template for registered severities that have no built-in template. `None` uses
    /// [`EXTENSION_TEMPLATE`].
    pub default_template: Option<String>,
    /// strftime format for `asctime`.
    pub datefmt: String,
    /// Placeholder style of `overrides` and `default_template`. The built-in templates,
    /// [`EXTENSION_TEMPLATE`] included, are always [`Style::Percent`].
    pub style: Style,
    /// Replaces [`app_name`] in templates.
    pub app_name: Option<String>,
    pub stack: StackOptions,
}

impl Default for FormatterOptions {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
            default_template: None,
            datefmt: "%H:%M".to_string(),
            style: Style::Percent,
            app_name: None,
            stack: StackOptions::default(),
        }
    }
}

impl FormatterOptions {
    pub fn with_override(mut self, rank: impl Into<Rank>, template: impl Into<String>) -> Self {
        self.overrides.insert(rank.into(), template.into());
        self
    }

    pub fn with_default_template(mut self, template: impl Into<String>) -> Self {
        self.default_template = Some(template.into());
        self
    }

    pub fn with_datefmt(mut self, datefmt: impl Into<String>) -> Self {
        self.datefmt = datefmt.into();
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn with_stack(mut self, stack: StackOptions) -> Self {
        self.stack = stack;
        self
    }
}

/// Renders records with a template chosen by severity.
#[derive(Debug, Clone)]
pub struct LevelFormatter {
    templates: HashMap<Rank, Template>,
    datefmt: String,
    stack: StackOptions,
}

impl LevelFormatter {
    /// Builds the template map for the severities currently in `table`.
    ///
    /// Severities registered in `table` after this call have no template; records at
    /// those ranks fail with [`Error::MisconfiguredSeverity`].
    pub fn new(table: &SeverityTable, options: FormatterOptions) -> Result<Self> {
        validate_datefmt(&options.datefmt)?;
        let app_name = options.app_name.unwrap_or_else(app_name);

        let extension = match &options.default_template {
            Some(template) => (template.clone(), options.style),
            None => (EXTENSION_TEMPLATE.to_string(), Style::Percent),
        };
        let mut sources: HashMap<Rank, (String, Style)> = HashMap::new();
        for severity in table.severities() {
            let entry = match Level::from_rank(severity.rank) {
                Some(level) => (default_template(level).to_string(), Style::Percent),
                None => extension.clone(),
            };
            sources.insert(severity.rank, entry);
        }
        for (rank, template) in options.overrides {
            sources.insert(rank, (template, options.style));
        }

        let mut templates = HashMap::with_capacity(sources.len());
        for (rank, (source, style)) in sources {
            let template = Template::parse(&source, style)?.with_app_name(&app_name);
            templates.insert(rank, template);
        }
        Ok(Self {
            templates,
            datefmt: options.datefmt,
            stack: options.stack,
        })
    }

    /// Renders `record` with the template for its rank.
    ///
    /// When that template shows a backtrace and the record has none yet, the current stack
    /// is captured and attached to the record first. The same goes for the function name
    /// of a call site that doesn't know it. Exception text, if any, follows the rendered
    /// template on a new line.
    pub fn format(&self, record: &LogRecord) -> Result<String> {
        let template = self
            .templates
            .get(&record.rank())
            .ok_or(Error::MisconfiguredSeverity(record.rank()))?;
        self.complete(template, record);
        let mut out = template.render(record, &self.datefmt);
        if let Some(exc_text) = record.exc_text() {
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(exc_text);
        }
        Ok(out)
    }

    /// Captures the backtrace and the calling function now if the template for `record`
    /// shows them.
    ///
    /// Handlers that render on another thread or inside a future call this first, so the
    /// stack is the one of the log call rather than the one of the executor.
    pub fn prepare(&self, record: &LogRecord) {
        if let Some(template) = self.templates.get(&record.rank()) {
            self.complete(template, record);
        }
    }

    fn complete(&self, template: &Template, record: &LogRecord) {
        if template.references("backtrace") {
            record.backtrace_or_init(|| self.stack.render());
        }
        if template.references("funcName") && !record.call_site().knows_function() {
            record.function_or_init(|| caller_function(&self.stack.boundary));
        }
    }

    /// Whether records at `rank` are rendered with a backtrace.
    pub fn wants_backtrace(&self, rank: Rank) -> bool {
        self.templates
            .get(&rank)
            .is_some_and(|t| t.references("backtrace"))
    }

    pub fn template_for(&self, rank: Rank) -> Option<&Template> {
        self.templates.get(&rank)
    }

    /// Every rank this formatter can render, most verbose first.
    pub fn ranks(&self) -> Vec<Rank> {
        let mut ranks: Vec<Rank> = self.templates.keys().copied().collect();
        ranks.sort();
        ranks
    }

    pub fn stack_options(&self) -> &StackOptions {
        &self.stack
    }
}
