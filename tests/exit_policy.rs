// SPDX-License-Identifier: MIT OR Apache-2.0
//! The exit path ends the process, so each test re-runs itself in a child process and
//! checks the exit code and what the child left behind.
use sillylog::{
    ExitPolicy, FormatterOptions, LevelFormatter, Logger, LoggerConfig, Rank, SeverityTable, StreamHandler,
};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;

/// Set in the child to the file it should log to.
const CHILD_LOG: &str = "SILLYLOG_EXIT_TEST_LOG";

fn run_child(test_name: &str, logfile: &Path) -> Output {
    Command::new(std::env::current_exe().unwrap())
        .args(["--exact", test_name, "--nocapture", "--test-threads=1"])
        .env(CHILD_LOG, logfile)
        .output()
        .unwrap()
}

fn log_until_exit(logger: &Logger) -> ! {
    logger.error(format_args!("still running"));
    logger.critical(format_args!("shutting down"));
    logger.status(format_args!("after exit"));
    unreachable!("the exit policy did not end the process");
}

#[test]
fn buffered_writer_is_flushed_before_exit() {
    if let Some(logfile) = std::env::var_os(CHILD_LOG) {
        let table = Arc::new(SeverityTable::with_defaults());
        let formatter = Arc::new(LevelFormatter::new(&table, FormatterOptions::default()).unwrap());
        let writer = BufWriter::new(File::create(logfile).unwrap());
        let handler = StreamHandler::new(formatter)
            .with_writer(Box::new(writer))
            .with_exit_policy(ExitPolicy::On {
                rank: Rank::CRITICAL,
                code: 7,
            });
        let logger = Logger::new("child", table);
        logger.add_handler(Arc::new(handler));
        log_until_exit(&logger);
    }

    let dir = tempfile::tempdir().unwrap();
    let logfile = dir.path().join("exit.log");
    let output = run_child("buffered_writer_is_flushed_before_exit", &logfile);
    assert_eq!(output.status.code(), Some(7), "{}", String::from_utf8_lossy(&output.stderr));
    let written = fs::read_to_string(&logfile).unwrap();
    assert!(written.contains("still running"), "{written}");
    assert!(written.contains("(CRITICAL)"), "{written}");
    assert!(written.contains("shutting down"), "{written}");
    assert!(!written.contains("after exit"), "{written}");
}

#[test]
fn configured_exit_writes_file_and_console() {
    if let Some(logfile) = std::env::var_os(CHILD_LOG) {
        let config = LoggerConfig {
            level: "info".to_string(),
            file_level: Some("debug".to_string()),
            logfile_path: Some(logfile.to_string_lossy().into_owned()),
            exit_on: Some("critical".to_string()),
            exit_code: 9,
            ..LoggerConfig::default()
        };
        let logger = config.build(Arc::new(SeverityTable::with_defaults())).unwrap();
        log_until_exit(&logger);
    }

    let dir = tempfile::tempdir().unwrap();
    let logfile = dir.path().join("exit.log");
    let output = run_child("configured_exit_writes_file_and_console", &logfile);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(9), "{stderr}");
    assert!(stderr.contains("shutting down"), "{stderr}");
    assert!(!stderr.contains("after exit"), "{stderr}");
    let written = fs::read_to_string(&logfile).unwrap();
    assert!(written.contains("shutting down"), "{written}");
    assert!(!written.contains("after exit"), "{written}");
}
