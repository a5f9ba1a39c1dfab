//! Presentational wrappers around field content
//!
//! A [`Wrapper`] is the rendered header/footer written around a field value
//! for local readability. It is never part of the field value:
//! `wrapper.unwrap(kind, &wrapper.wrap(content)) == content` for every
//! content string.
//!
//! When the user edited the header or footer, [`Wrapper::unwrap`] falls back
//! to recognizing the wrapper shape for the file kind (comment blocks,
//! self-invoking function opener/closer, or line counts for plain text).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Local file category, derived from the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// JavaScript
    Script,
    /// HTML / XML
    Markup,
    /// CSS / SCSS / LESS
    Stylesheet,
    /// JSON
    Json,
    /// Anything else
    Text,
}

impl FileKind {
    /// Derive kind from a file extension (without dot, case-insensitive)
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "js" | "mjs" | "ts" => Self::Script,
            "html" | "htm" | "xml" => Self::Markup,
            "css" | "scss" | "less" => Self::Stylesheet,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Stable tag
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Markup => "markup",
            Self::Stylesheet => "stylesheet",
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendered header and footer around one file's content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wrapper {
    header: String,
    footer: String,
}

impl Wrapper {
    /// Create wrapper from rendered header/footer text
    #[inline]
    #[must_use]
    pub fn new(header: impl Into<String>, footer: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            footer: footer.into(),
        }
    }

    /// Wrapper that adds nothing
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Rendered header
    #[inline]
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Rendered footer
    #[inline]
    #[must_use]
    pub fn footer(&self) -> &str {
        &self.footer
    }

    /// True when neither header nor footer adds text
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.footer.is_empty()
    }

    /// Text written to disk for `content`
    #[must_use]
    pub fn wrap(&self, content: &str) -> String {
        let mut out = String::with_capacity(self.header.len() + content.len() + self.footer.len());
        out.push_str(&self.header);
        out.push_str(content);
        out.push_str(&self.footer);
        out
    }

    /// Field value recovered from on-disk text
    #[must_use]
    pub fn unwrap(&self, kind: FileKind, text: &str) -> String {
        if self.is_empty() {
            return text.to_string();
        }
        if let Some(inner) = self.strip_exact(text) {
            return inner.to_string();
        }
        self.strip_recognized(kind, text)
    }

    fn strip_exact<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.strip_prefix(self.header.as_str())?
            .strip_suffix(self.footer.as_str())
    }

    fn strip_recognized(&self, kind: FileKind, text: &str) -> String {
        let mut body = text;
        let has_header = !self.header.is_empty();
        let has_footer = !self.footer.is_empty();

        match kind {
            FileKind::Script => {
                if has_header && self.header.contains("/*") {
                    body = strip_leading_delimited(body, "/*", "*/").unwrap_or(body);
                }
                if has_header && self.header.contains("(function") {
                    body = strip_leading_iife(body).unwrap_or(body);
                }
                if has_footer && self.footer.contains("*/") {
                    body = strip_trailing_delimited(body, "/*", "*/").unwrap_or(body);
                }
                if has_footer && self.footer.contains("})") {
                    body = strip_trailing_iife(body).unwrap_or(body);
                }
            }
            FileKind::Markup => {
                if has_header {
                    body = strip_leading_delimited(body, "<!--", "-->").unwrap_or(body);
                }
                if has_footer {
                    body = strip_trailing_delimited(body, "<!--", "-->").unwrap_or(body);
                }
            }
            FileKind::Stylesheet => {
                if has_header {
                    body = strip_leading_delimited(body, "/*", "*/").unwrap_or(body);
                }
                if has_footer {
                    body = strip_trailing_delimited(body, "/*", "*/").unwrap_or(body);
                }
            }
            FileKind::Json | FileKind::Text => {
                body = strip_leading_lines(body, self.header.matches('\n').count());
                body = strip_trailing_lines(body, self.footer.matches('\n').count());
            }
        }

        body.to_string()
    }
}

/// Drop spaces/tabs and at most one line break from the start
fn skip_line_break(text: &str) -> &str {
    let text = text.trim_start_matches([' ', '\t']);
    text.strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .unwrap_or(text)
}

/// Drop spaces/tabs and at most one line break from the end
fn drop_line_break(text: &str) -> &str {
    let text = text.trim_end_matches([' ', '\t']);
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

fn strip_leading_delimited<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let rest = text.trim_start().strip_prefix(open)?;
    let end = rest.find(close)?;
    Some(skip_line_break(&rest[end + close.len()..]))
}

fn strip_trailing_delimited<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let body = text.trim_end().strip_suffix(close)?;
    let start = body.rfind(open)?;
    Some(drop_line_break(&body[..start]))
}

/// `(function(args) {` opener
fn strip_leading_iife(text: &str) -> Option<&str> {
    let rest = text.trim_start().strip_prefix("(function")?;
    let brace = rest.find('{')?;
    if rest[..brace].contains(';') {
        return None;
    }
    Some(skip_line_break(&rest[brace + 1..]))
}

/// `})(args);` closer
fn strip_trailing_iife(text: &str) -> Option<&str> {
    let trimmed = text.trim_end();
    let pos = trimmed.rfind("})")?;
    let call = trimmed[pos + 2..].trim_end_matches(';');
    let args = call.strip_prefix('(')?.strip_suffix(')')?;
    if args.contains(['(', ')']) {
        return None;
    }
    Some(drop_line_break(&trimmed[..pos]))
}

fn strip_leading_lines(text: &str, count: usize) -> &str {
    let mut rest = text;
    for _ in 0..count {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return "",
        }
    }
    rest
}

fn strip_trailing_lines(text: &str, count: usize) -> &str {
    let mut rest = text;
    for _ in 0..count {
        match rest.rfind('\n') {
            Some(pos) => rest = &rest[..pos],
            None => return "",
        }
    }
    rest
}
