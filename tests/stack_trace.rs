// SPDX-License-Identifier: MIT OR Apache-2.0
use sillylog::stack::{StackBoundary, StackOptions, render_stack};
use sillylog::{FormatterOptions, InMemoryHandler, LevelFormatter, Logger, Rank, SeverityTable};
use std::sync::Arc;

fn traced_logger(stack: StackOptions) -> (Logger, Arc<InMemoryHandler>) {
    let table = Arc::new(SeverityTable::with_defaults());
    let options = FormatterOptions::default()
        .with_override(Rank::TRACE, "%(message)s\n%(backtrace)s")
        .with_stack(stack);
    let formatter = Arc::new(LevelFormatter::new(&table, options).unwrap());
    let memory = Arc::new(InMemoryHandler::new(formatter));
    let logger = Logger::new("stack", table);
    logger.add_handler(memory.clone());
    (logger, memory)
}

#[inline(never)]
fn level_two(logger: &Logger) {
    logger.trace(format_args!("deep"));
}

#[inline(never)]
fn level_one(logger: &Logger) {
    level_two(logger);
}

#[test]
fn innermost_caller_is_frame_zero() {
    let (logger, memory) = traced_logger(StackOptions::default());
    level_one(&logger);
    let out = memory.drain_logs();
    let mut lines = out.lines();
    assert_eq!(lines.next(), Some("deep"));
    let frames: Vec<&str> = lines.collect();
    assert!(frames.len() >= 3, "{out}");
    assert!(frames[0].starts_with("  #0 "));
    assert!(frames[0].contains("stack_trace::level_two"), "{out}");
    assert!(frames[1].starts_with("  #1 "));
    assert!(frames[1].contains("stack_trace::level_one"), "{out}");
    assert!(frames[2].contains("stack_trace::innermost_caller_is_frame_zero"), "{out}");
    assert!(!out.contains("sillylog::"), "{out}");
}

#[test]
fn frame_lines_carry_location_and_source() {
    let (logger, memory) = traced_logger(StackOptions::default());
    level_one(&logger);
    let out = memory.drain_logs();
    let frame = out.lines().nth(1).unwrap();
    assert!(frame.contains("stack_trace.rs:"), "{frame}");
    assert!(frame.ends_with("logger.trace(format_args!(\"deep\"));"), "{frame}");
}

#[test]
fn backtrace_is_captured_once_per_record() {
    let table = Arc::new(SeverityTable::with_defaults());
    let options = FormatterOptions::default().with_override(Rank::TRACE, "%(backtrace)s");
    let formatter = Arc::new(LevelFormatter::new(&table, options).unwrap());
    let first = Arc::new(InMemoryHandler::new(formatter.clone()));
    let second = Arc::new(InMemoryHandler::new(formatter));
    let logger = Logger::new("twice", table);
    logger.set_handlers(vec![first.clone(), second.clone()]);
    level_one(&logger);
    assert_eq!(first.drain_logs(), second.drain_logs());
}

#[test]
fn skip_boundary_keeps_internal_frames() {
    let lines = render_stack(&StackBoundary::Skip(0), 24, "");
    assert!(lines.first().is_some_and(|l| l.starts_with("#0 ")));
    assert!(lines.iter().any(|l| l.contains("sillylog::stack::render_stack")));
    let skipped = render_stack(&StackBoundary::Skip(1), 24, "");
    assert_eq!(skipped.len() + 1, lines.len());
}

#[test]
fn unmatched_marker_keeps_everything() {
    let all = render_stack(&StackBoundary::Skip(0), 24, "");
    let unmatched = render_stack(&StackBoundary::After("no_such_crate::".to_string()), 24, "");
    assert_eq!(all.len(), unmatched.len());
}
