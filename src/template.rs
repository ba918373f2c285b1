// SPDX-License-Identifier: MIT OR Apache-2.0

//! Format templates.
//!
//! A template describes how one record is rendered, for example
//! `%(asctime)s(%(levelname)s) %(message)s`. Templates are compiled once into a list of
//! literal and field segments; rendering walks that list and never parses again.
//!
//! Three placeholder styles are understood:
//!
//! | Style              | Placeholder                           | Escape |
//! |--------------------|---------------------------------------|--------|
//! | [`Style::Percent`] | `%(name)s`, `%(name)-8s`, `%(lineno)4d`, `%(created).3f` | `%%` |
//! | [`Style::Brace`]   | `{name}`, `{name:>8}`, `{created:.3f}` | `{{` `}}` |
//! | [`Style::Dollar`]  | `$name`, `${name}`                    | `$$` |
//!
//! ```
//! use sillylog::template::{Style, Template};
//!
//! let t = Template::parse("%(levelname)-8s|%(message)s", Style::Percent).unwrap();
//! assert!(t.references("message"));
//! assert!(Template::parse("%(colour)s", Style::Percent).is_err());
//! ```

use crate::error::{Error, Result};
use crate::log_record::LogRecord;
use serde::Deserialize;
use std::fmt::Write;

/// Placeholder syntax of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum Style {
    #[default]
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "{")]
    Brace,
    #[serde(rename = "$")]
    Dollar,
}

impl Style {
    /// Parses the marker character used in configuration: `%`, `{` or `$`.
    pub fn from_marker(marker: &str) -> Result<Style> {
        match marker {
            "%" => Ok(Style::Percent),
            "{" => Ok(Style::Brace),
            "$" => Ok(Style::Dollar),
            other => Err(Error::Config(format!("style must be one of %, {{ or $, not {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    AscTime,
    Created,
    Msecs,
    RelativeCreated,
    LevelName,
    LevelNo,
    Name,
    AppName,
    PathName,
    FileName,
    Module,
    FuncName,
    LineNo,
    Message,
    Backtrace,
    Process,
    ThreadName,
}

impl Field {
    fn from_name(name: &str) -> Option<Field> {
        Some(match name {
            "asctime" => Field::AscTime,
            "created" => Field::Created,
            "msecs" => Field::Msecs,
            "relativeCreated" => Field::RelativeCreated,
            "levelname" => Field::LevelName,
            "levelno" => Field::LevelNo,
            "name" => Field::Name,
            "appname" => Field::AppName,
            "pathname" => Field::PathName,
            "filename" => Field::FileName,
            "module" => Field::Module,
            "funcName" => Field::FuncName,
            "lineno" => Field::LineNo,
            // `msg` is accepted as an alias
            "message" | "msg" => Field::Message,
            "backtrace" => Field::Backtrace,
            "process" => Field::Process,
            "threadName" => Field::ThreadName,
            _ => return None,
        })
    }

    fn is_numeric(self) -> bool {
        matches!(
            self,
            Field::Created | Field::Msecs | Field::RelativeCreated | Field::LevelNo | Field::LineNo | Field::Process
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Str,
    Repr,
    Int,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Spec {
    align: Option<Align>,
    width: usize,
    precision: Option<usize>,
    conversion: Conversion,
}

impl Spec {
    const PLAIN: Spec = Spec {
        align: None,
        width: 0,
        precision: None,
        conversion: Conversion::Str,
    };
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field(Field, Spec),
}

enum Value<'a> {
    Str(&'a str),
    Owned(String),
    Int(i64),
    Float(f64),
}

/// A compiled format template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    style: Style,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str, style: Style) -> Result<Template> {
        let segments = match style {
            Style::Percent => parse_percent(source),
            Style::Brace => parse_brace(source),
            Style::Dollar => parse_dollar(source),
        }
        .map_err(|reason| Error::Template {
            template: source.to_string(),
            reason,
        })?;
        Ok(Template {
            source: source.to_string(),
            style,
            segments: coalesce(segments),
        })
    }

    /// Replaces every `appname` placeholder with `app_name`.
    pub fn with_app_name(mut self, app_name: &str) -> Template {
        let segments = self
            .segments
            .into_iter()
            .map(|segment| match segment {
                Segment::Field(Field::AppName, spec) => {
                    Segment::Literal(apply_spec(Value::Str(app_name), &spec))
                }
                other => other,
            })
            .collect();
        self.segments = coalesce(segments);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Whether a placeholder for `field` is still present.
    pub fn references(&self, field: &str) -> bool {
        match Field::from_name(field) {
            Some(wanted) => self
                .segments
                .iter()
                .any(|s| matches!(s, Segment::Field(f, _) if *f == wanted)),
            None => false,
        }
    }

    /// Renders `record`. `datefmt` is a validated strftime format for `asctime`.
    pub fn render(&self, record: &LogRecord, datefmt: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field, spec) => {
                    out.push_str(&apply_spec(field_value(*field, record, datefmt), spec));
                }
            }
        }
        out
    }
}

/// Checks that `datefmt` is a strftime format chrono understands.
pub fn validate_datefmt(datefmt: &str) -> Result<()> {
    use chrono::format::{Item, StrftimeItems};
    if StrftimeItems::new(datefmt).any(|item| matches!(item, Item::Error)) {
        return Err(Error::Template {
            template: datefmt.to_string(),
            reason: "invalid date format".to_string(),
        });
    }
    Ok(())
}

fn field_value<'r>(field: Field, record: &'r LogRecord, datefmt: &str) -> Value<'r> {
    let site = record.call_site();
    match field {
        Field::AscTime => {
            let mut s = String::new();
            // the format was validated when the formatter was built
            let _ = write!(s, "{}", record.created().format(datefmt));
            Value::Owned(s)
        }
        Field::Created => Value::Float(record.created().timestamp_micros() as f64 / 1e6),
        Field::Msecs => Value::Int(i64::from(record.created().timestamp_subsec_millis())),
        Field::RelativeCreated => Value::Float(record.relative().as_secs_f64() * 1000.0),
        Field::LevelName => Value::Str(record.level_name()),
        Field::LevelNo => Value::Int(i64::from(record.rank().get())),
        Field::Name => Value::Str(record.logger_name()),
        // unreachable once with_app_name ran; formatters always run it
        Field::AppName => Value::Str("?"),
        Field::PathName => Value::Str(site.file),
        Field::FileName => Value::Str(site.file_name()),
        Field::Module => Value::Str(site.module()),
        Field::FuncName => Value::Str(record.function_name()),
        Field::LineNo => Value::Int(i64::from(site.line)),
        Field::Message => Value::Str(record.message()),
        Field::Backtrace => Value::Str(record.backtrace().unwrap_or("")),
        Field::Process => Value::Int(i64::from(record.process())),
        Field::ThreadName => Value::Str(record.thread_name()),
    }
}

fn apply_spec(value: Value<'_>, spec: &Spec) -> String {
    let numeric = matches!(value, Value::Int(_) | Value::Float(_));
    let text = match (value, spec.conversion) {
        (Value::Int(i), Conversion::Float) => format!("{:.*}", spec.precision.unwrap_or(6), i as f64),
        (Value::Float(f), Conversion::Float) => format!("{:.*}", spec.precision.unwrap_or(6), f),
        (Value::Float(f), Conversion::Int) => format!("{}", f.trunc() as i64),
        (Value::Float(f), _) => match spec.precision {
            Some(p) => format!("{f:.p$}"),
            None => format!("{f}"),
        },
        (Value::Int(i), _) => i.to_string(),
        (Value::Str(s), Conversion::Repr) => format!("{s:?}"),
        (Value::Owned(s), Conversion::Repr) => format!("{s:?}"),
        (Value::Str(s), _) => truncate(s, spec.precision).to_string(),
        (Value::Owned(s), _) => truncate(&s, spec.precision).to_string(),
    };
    let len = text.chars().count();
    if len >= spec.width {
        return text;
    }
    let fill = spec.width - len;
    let align = spec
        .align
        .unwrap_or(if numeric { Align::Right } else { Align::Left });
    match align {
        Align::Left => format!("{text}{}", " ".repeat(fill)),
        Align::Right => format!("{}{text}", " ".repeat(fill)),
        Align::Center => {
            let left = fill / 2;
            format!("{}{text}{}", " ".repeat(left), " ".repeat(fill - left))
        }
    }
}

fn truncate(s: &str, precision: Option<usize>) -> &str {
    match precision.and_then(|p| s.char_indices().nth(p)) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn coalesce(segments: Vec<Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        if let Segment::Literal(text) = &segment {
            if text.is_empty() {
                continue;
            }
            if let Some(Segment::Literal(prev)) = out.last_mut() {
                prev.push_str(text);
                continue;
            }
        }
        out.push(segment);
    }
    out
}

fn field(name: &str, spec: Spec) -> std::result::Result<Segment, String> {
    let field = Field::from_name(name).ok_or_else(|| format!("unknown field {name:?}"))?;
    if spec.conversion == Conversion::Int && !field.is_numeric() {
        return Err(format!("field {name:?} is not numeric"));
    }
    Ok(Segment::Field(field, spec))
}

fn parse_percent(source: &str) -> std::result::Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => literal.push('%'),
            Some('(') => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some(')') => break,
                        Some(c) => name.push(c),
                        None => return Err("unterminated %( placeholder".to_string()),
                    }
                }
                let mut spec = Spec::PLAIN;
                spec.align = match chars.next_if_eq(&'-') {
                    Some(_) => Some(Align::Left),
                    None => Some(Align::Right),
                };
                spec.width = take_number(&mut chars).unwrap_or(0);
                if chars.next_if_eq(&'.').is_some() {
                    spec.precision = Some(take_number(&mut chars).unwrap_or(0));
                }
                spec.conversion = match chars.next() {
                    Some('s') => Conversion::Str,
                    Some('r') => Conversion::Repr,
                    Some('d' | 'i') => Conversion::Int,
                    Some('f' | 'F') => Conversion::Float,
                    Some(other) => return Err(format!("unsupported conversion {other:?}")),
                    None => return Err("missing conversion after placeholder".to_string()),
                };
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
                segments.push(field(&name, spec)?);
            }
            _ => return Err("'%' must be followed by '(' or '%'".to_string()),
        }
    }
    segments.push(Segment::Literal(literal));
    Ok(segments)
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut digits = String::new();
    while let Some(d) = chars.next_if(char::is_ascii_digit) {
        digits.push(d);
    }
    digits.parse().ok()
}

fn parse_brace(source: &str) -> std::result::Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.next_if_eq(&'{').is_some() => literal.push('{'),
            '}' if chars.next_if_eq(&'}').is_some() => literal.push('}'),
            '}' => return Err("single '}' encountered".to_string()),
            '{' => {
                let mut body = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => body.push(c),
                        None => return Err("unterminated { placeholder".to_string()),
                    }
                }
                let (name, spec_text) = match body.split_once(':') {
                    Some((name, spec)) => (name, spec),
                    None => (body.as_str(), ""),
                };
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
                segments.push(field(name, parse_brace_spec(spec_text)?)?);
            }
            c => literal.push(c),
        }
    }
    segments.push(Segment::Literal(literal));
    Ok(segments)
}

fn parse_brace_spec(text: &str) -> std::result::Result<Spec, String> {
    let mut spec = Spec::PLAIN;
    let mut chars = text.chars().peekable();
    spec.align = match chars.peek() {
        Some('<') => Some(Align::Left),
        Some('>') => Some(Align::Right),
        Some('^') => Some(Align::Center),
        _ => None,
    };
    if spec.align.is_some() {
        chars.next();
    }
    spec.width = take_number(&mut chars).unwrap_or(0);
    if chars.next_if_eq(&'.').is_some() {
        spec.precision = Some(take_number(&mut chars).unwrap_or(0));
    }
    spec.conversion = match chars.next() {
        None | Some('s') => Conversion::Str,
        Some('d') => Conversion::Int,
        Some('f') => Conversion::Float,
        Some(other) => return Err(format!("unsupported format type {other:?}")),
    };
    if chars.next().is_some() {
        return Err(format!("bad format spec {text:?}"));
    }
    Ok(spec)
}

fn parse_dollar(source: &str) -> std::result::Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            literal.push(c);
            continue;
        }
        if chars.next_if_eq(&'$').is_some() {
            literal.push('$');
            continue;
        }
        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        while let Some(c) = chars.next_if(|c| c.is_ascii_alphanumeric() || *c == '_') {
            name.push(c);
        }
        if braced && chars.next_if_eq(&'}').is_none() {
            return Err("unterminated ${ placeholder".to_string());
        }
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err("invalid placeholder after '$'".to_string());
        }
        segments.push(Segment::Literal(std::mem::take(&mut literal)));
        segments.push(field(&name, Spec::PLAIN)?);
    }
    segments.push(Segment::Literal(literal));
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_record::CallSite;
    use crate::severity::SeverityTable;
    use crate::level::Rank;

    fn record(message: &str) -> LogRecord {
        let table = SeverityTable::with_defaults();
        let severity = table.by_rank(Rank::WARNING).unwrap();
        let site = CallSite {
            file: "src/net/client.rs",
            module_path: "app::net::client",
            function: "app::net::client::connect",
            line: 77,
            column: 9,
        };
        LogRecord::new(&severity, "app", site, message.to_string())
    }

    #[test]
    fn percent_fields_and_padding() {
        let t = Template::parse(
            "[%(levelname)-8s] %(name)5s %(filename)s::%(funcName)s::%(lineno)4d %(message)s 100%%",
            Style::Percent,
        )
        .unwrap();
        assert_eq!(
            t.render(&record("refused"), "%H:%M"),
            "[WARNING ]   app client.rs::connect::  77 refused 100%"
        );
    }

    #[test]
    fn percent_rejects_bad_placeholders() {
        assert!(Template::parse("%(message)", Style::Percent).is_err());
        assert!(Template::parse("%(message", Style::Percent).is_err());
        assert!(Template::parse("50% done", Style::Percent).is_err());
        assert!(Template::parse("%(message)d", Style::Percent).is_err());
        assert!(Template::parse("%(nope)s", Style::Percent).is_err());
    }

    #[test]
    fn brace_style() {
        let t = Template::parse("{levelname:>8}|{module}|{lineno:d}|{{x}}", Style::Brace).unwrap();
        assert_eq!(t.render(&record("m"), "%H"), " WARNING|client|77|{x}");
        assert!(Template::parse("{message", Style::Brace).is_err());
        assert!(Template::parse("oops }", Style::Brace).is_err());
    }

    #[test]
    fn dollar_style() {
        let t = Template::parse("$levelname: ${message}$$", Style::Dollar).unwrap();
        assert_eq!(t.render(&record("hi"), "%H"), "WARNING: hi$");
        assert!(Template::parse("cost $5", Style::Dollar).is_err());
        assert!(Template::parse("${message", Style::Dollar).is_err());
    }

    #[test]
    fn app_name_is_baked_in() {
        let t = Template::parse("%(appname)s %(message)s", Style::Percent)
            .unwrap()
            .with_app_name("tool");
        assert!(!t.references("appname"));
        assert!(t.references("message"));
        assert_eq!(t.render(&record("x"), "%H"), "tool x");
    }

    #[test]
    fn msg_alias_and_float_precision() {
        let t = Template::parse("%(msg)s %(created).2f", Style::Percent).unwrap();
        let r = record("m");
        let out = t.render(&r, "%H");
        let (msg, created) = out.split_once(' ').unwrap();
        assert_eq!(msg, "m");
        assert_eq!(created.split_once('.').unwrap().1.len(), 2);
    }

    #[test]
    fn asctime_uses_datefmt() {
        let t = Template::parse("%(asctime)s", Style::Percent).unwrap();
        let r = record("m");
        assert_eq!(t.render(&r, "%Y"), r.created().format("%Y").to_string());
    }

    #[test]
    fn datefmt_validation() {
        assert!(validate_datefmt("%Y-%m-%d %H:%M:%S").is_ok());
        assert!(validate_datefmt("%Q").is_err());
    }

    #[test]
    fn style_markers() {
        assert_eq!(Style::from_marker("{").unwrap(), Style::Brace);
        assert!(Style::from_marker("#").is_err());
    }
}
