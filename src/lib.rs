// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# sillylog

sillylog is a level-aware logging library for command line tools.

# The problem

Typical loggers render every record with one template. That's a poor fit for a CLI:

* Messages meant for the *user* ("12 files copied") shouldn't be prefixed with a
  timestamp, a level and a module path.
* Messages meant for the *developer* chasing a bug want the opposite: file, function,
  line, and for the noisiest level the whole call stack.

One template can't be terse and detailed at once, so sillylog picks the template by
severity.

# Severities

| Name      | Rank | Default rendering                                   |
|-----------|------|-----------------------------------------------------|
| TRACE     | 9    | debug layout plus a gdb-style backtrace              |
| DEBUG     | 10   | time, level, app, logger, file, function and line    |
| INFO      | 20   | time, level, app and message                         |
| WARNING   | 30   | time, level, app, logger, file and function          |
| ERROR     | 40   | as WARNING                                           |
| CRITICAL  | 50   | as DEBUG, set off by blank lines                     |
| STATUS    | 51   | the message alone                                    |

TRACE and STATUS are registered on top of the five conventional levels. STATUS ranks
above everything else, so user-facing output is never filtered away. More severities can
be registered in a [`SeverityTable`]; registering a name, method or rank twice is an
error.

# The API

```rust
use sillylog::{FormatterOptions, InMemoryHandler, LevelFormatter, Logger, SeverityTable};
use std::sync::Arc;

let table = Arc::new(SeverityTable::with_defaults());
let formatter = Arc::new(LevelFormatter::new(&table, FormatterOptions::default()).unwrap());
let memory = Arc::new(InMemoryHandler::new(formatter));

let logger = Logger::new("copy", table);
logger.add_handler(memory.clone());

sillylog::status!(logger, "{} files copied", 12);
sillylog::warning!(logger, "skipped {}", "a.tmp");

let lines = memory.drain_records();
assert_eq!(lines[0], "12 files copied");
assert!(lines[1].contains("(WARNING)"));
assert!(lines[1].ends_with("skipped a.tmp"));
```

For a ready-made console and rotating-file setup see [`get_logger`] and
[`LoggerConfig`]. Without a logger argument the macros log through [`root_logger`].

# Multithreading

Tables, formatters, handlers and loggers are all `Send + Sync` and meant to be shared
through `Arc`. A [`LevelFormatter`] never changes after construction, so one instance can
render for every thread at once.
*/

mod config;
mod error;
mod file_handler;
mod formatter;
mod handler;
mod inmemory_handler;
mod level;
mod log_record;
mod logger;
mod macros;
pub mod paths;
pub mod root;
mod severity;
pub mod stack;
mod stream_handler;
pub mod template;

pub use config::{FILE_ENV, LEVEL_ENV, LoggerConfig, RotateWhen, RotationConfig, get_logger};
pub use error::{DefinitionKind, Error, Result};
pub use file_handler::{RotatingFileHandler, Rotation, compress_file};
pub use formatter::{EXTENSION_TEMPLATE, FormatterOptions, LevelFormatter, app_name, default_template};
pub use handler::{EmitFuture, Handler};
pub use inmemory_handler::InMemoryHandler;
pub use level::{Level, Rank};
pub use log_record::{CallSite, LogRecord};
pub use logger::Logger;
pub use root::{add_root_handler, root_logger, set_root_handlers};
pub use severity::{RESERVED_METHOD_NAMES, Severity, SeverityTable};
pub use stack::{StackBoundary, StackOptions};
pub use stream_handler::{ExitPolicy, StreamHandler};
pub use template::{Style, Template};
