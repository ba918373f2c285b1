// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shell-style path helpers for log file locations.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Expands a leading `~` and any `$VAR` or `${VAR}` the way a shell would.
///
/// Variables that aren't set are left as written.
///
/// ```
/// let path = sillylog::paths::expand("/var/log/$SILLYLOG_DOC_UNSET/app.log");
/// assert_eq!(path, std::path::PathBuf::from("/var/log/$SILLYLOG_DOC_UNSET/app.log"));
/// ```
pub fn expand(path: &str) -> PathBuf {
    expand_with(path, dirs::home_dir(), |name| std::env::var(name).ok())
}

pub(crate) fn expand_with(
    path: &str,
    home: Option<PathBuf>,
    lookup: impl Fn(&str) -> Option<String>,
) -> PathBuf {
    let path = match (path.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            format!("{}{rest}", home.to_string_lossy())
        }
        _ => path.to_string(),
    };
    PathBuf::from(expand_vars(&path, lookup))
}

fn expand_vars(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('$') {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];
        let (name, written_len) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };
        match (!name.is_empty()).then(|| lookup(name)).flatten() {
            Some(value) => out.push_str(&value),
            None => {
                out.push('$');
                out.push_str(&after[..written_len]);
            }
        }
        rest = &after[written_len..];
    }
    out.push_str(rest);
    out
}

/// `mkdir -p` for a directory, or for the parent of a file when `is_filename` is set.
///
/// Returns `path` made absolute: the file path when `is_filename` is set, the directory
/// otherwise.
pub fn flex_mkdir(path: &Path, is_filename: bool) -> Result<PathBuf> {
    let path = std::path::absolute(path)?;
    let directory = if is_filename {
        path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone())
    } else {
        path.clone()
    };
    fs::create_dir_all(&directory)?;
    Ok(path)
}
