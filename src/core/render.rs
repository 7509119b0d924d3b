//! Serializer
//!
//! Writes every raw line back in order. An unmodified document renders to
//! exactly the text it was parsed from.

use std::fmt;

use super::document::{BlockLine, Document, Item, Section};

/// Render the whole document to a string.
pub fn render(doc: &Document) -> String {
    let mut out = String::new();
    for line in &doc.header {
        out.push_str(line);
    }
    for section in &doc.sections {
        render_section(section, &mut out);
    }
    out
}

fn render_section(section: &Section, out: &mut String) {
    out.push_str(&section.raw);
    for item in &section.items {
        render_item(item, out);
    }
}

fn render_item(item: &Item, out: &mut String) {
    match item {
        Item::Option(opt) => out.push_str(&opt.raw),
        Item::MultiLineOption(opt) | Item::GcodeBlock(opt) => {
            out.push_str(&opt.raw);
            for line in &opt.lines {
                match line {
                    BlockLine::Value { raw, .. } | BlockLine::Comment { raw } => out.push_str(raw),
                }
            }
        }
        Item::Comment { raw } | Item::BlankLine { raw } | Item::Verbatim { raw } => {
            out.push_str(raw)
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self))
    }
}
