//! Line Classifier
//!
//! Decides what a single line of a Klipper style config file is.
//! Pure and stateless: the only context it needs is whether the parser
//! currently has a multi-line option open.

use regex::Regex;
use std::sync::LazyLock;

/// `[name]`, optionally followed by an inline comment.
static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^\]]+)\]\s*(?:[#;].*)?$").expect("section pattern is valid")
});

/// `name: rest` or `name = rest`. The rest may be empty.
static OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^;#:=\s\[]+)\s*[:=](.*)$").expect("option pattern is valid")
});

/// What a line is, given the parser's current mode.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// Empty or whitespace-only line
    Blank,
    /// `[name]` header
    Section { name: String },
    /// Full-line comment starting with `#` or `;`
    Comment,
    /// `name:` with nothing but an optional comment after the separator
    MultiLineHeader { name: String },
    /// `name: value`, value already stripped of whitespace and inline comment
    Option { name: String, value: String },
    /// Text belonging to the open multi-line option
    Continuation,
    /// Nothing above; only possible outside a multi-line block
    Unrecognized,
}

/// Classify one raw line (terminator optional).
///
/// Inside a multi-line block, any indented non-blank line is a
/// continuation, even if it looks like a section, option or comment.
pub fn classify_line(line: &str, in_block: bool) -> LineKind {
    let stripped = line.trim();

    if stripped.is_empty() {
        return LineKind::Blank;
    }

    if in_block && is_indented(line) {
        return LineKind::Continuation;
    }

    if let Some(caps) = SECTION_RE.captures(stripped) {
        return LineKind::Section {
            name: caps[1].to_string(),
        };
    }

    if is_comment(stripped) {
        return LineKind::Comment;
    }

    if let Some(caps) = OPTION_RE.captures(stripped) {
        let name = caps[1].to_string();
        let (value, _) = split_inline_comment(caps[2].trim_start());
        let value = value.trim_end();

        return if value.is_empty() {
            LineKind::MultiLineHeader { name }
        } else {
            LineKind::Option {
                name,
                value: value.to_string(),
            }
        };
    }

    if in_block {
        LineKind::Continuation
    } else {
        LineKind::Unrecognized
    }
}

/// True when the line starts with a space or a tab.
pub fn is_indented(line: &str) -> bool {
    line.starts_with([' ', '\t'])
}

/// True for text (already trimmed) that opens with a comment marker.
pub fn is_comment(stripped: &str) -> bool {
    stripped.starts_with(['#', ';'])
}

/// Split `text` at the first inline comment marker.
///
/// A `#` or `;` opens a comment only at the very start of `text` or right
/// after whitespace, so values such as `http://host/#frag` stay intact.
pub fn split_inline_comment(text: &str) -> (&str, Option<&str>) {
    let mut prev_is_space = true;
    for (idx, ch) in text.char_indices() {
        if (ch == '#' || ch == ';') && prev_is_space {
            return (&text[..idx], Some(&text[idx..]));
        }
        prev_is_space = ch.is_whitespace();
    }
    (text, None)
}

/// Semantic value of a continuation line: trimmed, inline comment removed.
pub fn continuation_value(line: &str) -> &str {
    let (value, _) = split_inline_comment(line.trim());
    value.trim_end()
}

/// Leading whitespace of `line`.
pub fn indentation(line: &str) -> &str {
    let end = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..end]
}
