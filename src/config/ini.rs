//! Line-level reader and writer for the INI-like file format.
//!
//! ```text
//! [SectionName]
//! key = value   # trailing comment, stripped
//! ```
//!
//! Only spaces and tabs count as surrounding whitespace. Everything from the
//! first `#` in a value onward is a comment, so text values cannot contain `#`.

use super::section::Section;

/// One classified line of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// Empty or whitespace only.
    Blank,
    /// Full-line comment (`#` as first non-blank character).
    Comment,
    /// `[Name]` header; the name is taken verbatim and is never empty.
    Section(&'a str),
    /// `key = value` with whitespace and trailing comment removed.
    Entry { key: &'a str, value: &'a str },
    /// Anything else, including `[]` and entries with an empty key.
    Malformed,
}

pub fn parse_line(line: &str) -> Line<'_> {
    let trimmed = trim_blank(line);

    if trimmed.is_empty() {
        return Line::Blank;
    }
    if trimmed.starts_with('#') {
        return Line::Comment;
    }
    if trimmed.len() > 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
        return Line::Section(&trimmed[1..trimmed.len() - 1]);
    }

    match trimmed.split_once('=') {
        Some((key, value)) => {
            let key = trim_blank(key);
            if key.is_empty() {
                return Line::Malformed;
            }
            Line::Entry {
                key,
                value: strip_comment(trim_blank(value)),
            }
        }
        None => Line::Malformed,
    }
}

/// Drops everything from the first `#` and trims what is left.
pub fn strip_comment(value: &str) -> &str {
    match value.find('#') {
        Some(pos) => trim_blank(&value[..pos]),
        None => value,
    }
}

fn trim_blank(s: &str) -> &str {
    s.trim_matches(|c| c == ' ' || c == '\t' || c == '\r')
}

/// Checks that a section name survives a write and re-read unchanged.
pub fn check_section_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("section name is empty");
    }
    if name.contains(['\n', '\r']) {
        return Err("section name contains a line break");
    }
    Ok(())
}

/// Checks that `key = text` survives a write and re-read unchanged.
pub fn check_entry(key: &str, text: &str) -> Result<(), &'static str> {
    if key.is_empty() || trim_blank(key) != key {
        return Err("key is empty or has leading or trailing blanks");
    }
    if key.contains(['=', '#', '\n', '\r']) || key.starts_with('[') {
        return Err("key contains '=', '#', a line break or a leading '['");
    }
    if text.contains(['#', '\n', '\r']) {
        return Err("value contains '#' or a line break");
    }
    if trim_blank(text) != text {
        return Err("value has leading or trailing blanks");
    }
    Ok(())
}

/// Serializes sections as `[name]` blocks of `key = value` lines, each block
/// followed by a blank line.
pub fn render<'a>(sections: impl IntoIterator<Item = (&'a str, &'a Section)>) -> String {
    let mut out = String::new();
    for (name, section) in sections {
        out.push_str(&format!("[{name}]\n"));
        for (key, value) in section.values() {
            out.push_str(&format!("{key} = {value}\n"));
        }
        out.push('\n');
    }
    out
}
