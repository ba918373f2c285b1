// SPDX-License-Identifier: MIT OR Apache-2.0

//! gdb-style backtraces for log records.
//!
//! ```text
//!   #0 tests/stack_trace.rs:stack_trace::level_two:14 logger.trace(format_args!("deep"));
//!   #1 tests/stack_trace.rs:stack_trace::level_one:19 level_two(&logger);
//!   #2 tests/stack_trace.rs:stack_trace::renders:25 level_one(&logger);
//! ```
//!
//! Frame `#0` is the first frame past the [`StackBoundary`], normally the line that made
//! the log call. Each following line is one caller further out.
//!
//! The boundary is what keeps the logging machinery itself out of the trace. Rather than
//! counting internal frames, which breaks whenever the call layering changes, the logger
//! uses [`StackBoundary::After`] with this crate's path: every frame up to and including
//! the outermost `sillylog::` frame is dropped.
//!
//! Nothing is cached; each call captures the stack again.

use std::backtrace::Backtrace;

/// Marker matching every function in this crate.
pub const CRATE_MARKER: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

/// One captured frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackFrame {
    pub file: String,
    pub function: String,
    pub line: u32,
    /// The trimmed source line, empty when the file can't be read.
    pub source: String,
}

/// Where the interesting part of a stack starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StackBoundary {
    /// Drop this many innermost frames.
    Skip(usize),
    /// Drop every frame up to and including the outermost one whose function name
    /// contains the marker. Nothing is dropped when no frame matches.
    After(String),
}

impl Default for StackBoundary {
    fn default() -> Self {
        StackBoundary::After(CRATE_MARKER.to_string())
    }
}

/// How backtraces are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackOptions {
    pub boundary: StackBoundary,
    /// Column the source text starts at.
    pub width: usize,
    pub indent: String,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            boundary: StackBoundary::default(),
            width: 24,
            indent: "  ".to_string(),
        }
    }
}

impl StackOptions {
    /// Captures and renders the current stack.
    pub fn render(&self) -> Vec<String> {
        render_stack(&self.boundary, self.width, &self.indent)
    }
}

/// Captures the current stack, innermost frame first.
///
/// The first frame is the caller of this function. An empty vector means the platform
/// couldn't produce a backtrace.
#[inline(never)]
pub fn capture_frames() -> Vec<StackFrame> {
    let mut frames = capture_from("stack::capture_frames");
    for frame in &mut frames {
        frame.source = source_line(&frame.file, frame.line);
    }
    frames
}

/// Full path of the first function past `boundary` on the current stack.
///
/// This is how records built without a function name get one. `None` when the stack
/// ends at the boundary or can't be captured.
#[inline(never)]
pub fn caller_function(boundary: &StackBoundary) -> Option<String> {
    let frames = capture_from("stack::caller_function");
    let skip = boundary_skip(&frames, boundary);
    frames.into_iter().nth(skip).map(|frame| frame.function)
}

/// Parses the current stack and drops every frame up to and including `entry`.
fn capture_from(entry: &str) -> Vec<StackFrame> {
    let text = Backtrace::force_capture().to_string();
    let mut frames = parse_backtrace(&text);
    let own = frames
        .iter()
        .take(6)
        .position(|f| f.function.ends_with(entry));
    if let Some(idx) = own {
        frames.drain(..=idx);
    }
    frames
}

fn boundary_skip(frames: &[StackFrame], boundary: &StackBoundary) -> usize {
    match boundary {
        StackBoundary::Skip(n) => *n,
        StackBoundary::After(marker) => frames
            .iter()
            .rposition(|f| f.function.contains(marker.as_str()))
            .map_or(0, |idx| idx + 1),
    }
}

/// Renders frames as backtrace lines, dropping everything up to `boundary`.
///
/// Numbering restarts at `#0` after the boundary. A boundary past the end of the stack
/// yields no lines.
pub fn render_frames(
    frames: &[StackFrame],
    boundary: &StackBoundary,
    width: usize,
    indent: &str,
) -> Vec<String> {
    frames
        .iter()
        .skip(boundary_skip(frames, boundary))
        .enumerate()
        .map(|(n, frame)| {
            let head = format!("{indent}#{n} {}:{}:{}", frame.file, frame.function, frame.line);
            format!("{head:<width$} {}", frame.source)
        })
        .collect()
}

/// Captures the current stack and renders it.
#[inline(never)]
pub fn render_stack(boundary: &StackBoundary, width: usize, indent: &str) -> Vec<String> {
    render_frames(&capture_frames(), boundary, width, indent)
}

fn parse_backtrace(text: &str) -> Vec<StackFrame> {
    let mut frames: Vec<StackFrame> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                if let Some((file, line_no)) = parse_location(location) {
                    frame.file = file;
                    frame.line = line_no;
                }
            }
            continue;
        }
        let Some((index, function)) = line.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        frames.push(StackFrame {
            file: "??".to_string(),
            function: function.trim().to_string(),
            line: 0,
            source: String::new(),
        });
    }
    frames
}

/// Splits `path:line:column` (column optional).
fn parse_location(location: &str) -> Option<(String, u32)> {
    let (rest, last) = location.rsplit_once(':')?;
    let last: u32 = last.parse().ok()?;
    let (path, line) = match rest.rsplit_once(':') {
        Some((path, line)) => match line.parse::<u32>() {
            Ok(line) => (path, line),
            Err(_) => (rest, last),
        },
        None => (rest, last),
    };
    let path = path.strip_prefix("./").unwrap_or(path);
    Some((path.to_string(), line))
}

fn source_line(file: &str, line: u32) -> String {
    if line == 0 {
        return String::new();
    }
    std::fs::read_to_string(file)
        .ok()
        .and_then(|text| {
            text.lines()
                .nth(line as usize - 1)
                .map(|l| l.trim().to_string())
        })
        .unwrap_or_default()
}
