//! Record normalization: raw decoder output into canonical [`Comment`] values.

use super::error::{LayoutError, Result};

/// One comment record as handed over by the source decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// Comma separated positional attributes; the first one is the timestamp in seconds.
    pub attributes: String,
    pub author: Option<String>,
    pub text: Option<String>,
}

#[cfg(test)]
impl RawRecord {
    pub fn new(
        attributes: impl Into<String>,
        author: Option<&str>,
        text: Option<&str>,
    ) -> Self {
        Self {
            attributes: attributes.into(),
            author: author.map(str::to_string),
            text: text.map(str::to_string),
        }
    }
}

/// A normalized comment. `author` and `body` are already escaped for ASS markup.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub timestamp: f64,
    pub author: String,
    pub body: String,
}

impl Comment {
    /// Length used by the display duration heuristic, in characters of the escaped text.
    pub fn text_len(&self) -> usize {
        self.author.chars().count() + self.body.chars().count()
    }
}

/// Convert a raw record into a [`Comment`].
///
/// The timestamp is checked before the content, so a record that is broken in
/// both ways counts as malformed.
pub fn normalize_record(record: &RawRecord, default_author: &str) -> Result<Comment> {
    let timestamp = parse_timestamp(&record.attributes)?;

    let author = record.author.as_deref().unwrap_or(default_author);
    let text = record.text.as_deref().unwrap_or_default();
    if text.trim().is_empty() {
        return Err(LayoutError::EmptyContent);
    }

    Ok(Comment {
        timestamp,
        author: escape_markup(author),
        body: escape_markup(text),
    })
}

fn parse_timestamp(attributes: &str) -> Result<f64> {
    let first = attributes.split(',').next().unwrap_or_default().trim();
    match first.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(LayoutError::MalformedRecord(first.to_string())),
    }
}

/// Escape characters that would otherwise start override blocks in ASS text.
///
/// Line breaks become the ASS hard break `\N` so one comment stays on one line.
pub fn escape_markup(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace('}', "\\}")
        .replace("\r\n", "\\N")
        .replace(['\r', '\n'], "\\N")
}

/// Inverse of [`escape_markup`], with hard breaks read back as `\n`.
/// Backslash sequences it did not produce are kept as-is.
#[cfg(test)]
pub fn unescape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next @ ('\\' | '{' | '}')) => {
                    out.push(next);
                    chars.next();
                    continue;
                }
                Some(&'N') => {
                    out.push('\n');
                    chars.next();
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}
