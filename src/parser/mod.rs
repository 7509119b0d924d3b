//! Config Parser
//!
//! Streams lines through the classifier and builds a [`Document`].
//! Parsing is all or nothing: a duplicate section or option aborts the
//! whole read.

pub mod lexer;

pub use lexer::{classify_line, LineKind};

use std::io::BufRead;
use std::path::Path;

use crate::core::document::{BlockLine, ConfigOption, Document, Item, MultiLineOption, Section};
use crate::error::{ConfigError, ConfigResult};
use lexer::{continuation_value, is_comment, is_indented};

/// Parse a whole config text.
pub fn parse_str(text: &str) -> ConfigResult<Document> {
    let mut parser = Parser::new();
    for line in text.split_inclusive('\n') {
        parser.feed(line)?;
    }
    Ok(parser.finish())
}

/// Parse from a buffered reader; `source` is only used in error messages.
pub fn parse_reader<R: BufRead>(mut reader: R, source: &Path) -> ConfigResult<Document> {
    let mut parser = Parser::new();
    let mut line = String::new();
    loop {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| ConfigError::io(source, e))?;
        if read == 0 {
            break;
        }
        parser.feed(&line)?;
    }
    Ok(parser.finish())
}

/// What the last item of the current section can still absorb.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Open {
    Nothing,
    /// A single-line option; an indented follower promotes it
    Option,
    /// A multi-line option collecting continuation lines
    Block,
}

struct Parser {
    doc: Document,
    open: Open,
    /// Comments seen while something was open. Where they belong
    /// depends on the next non-comment line.
    held: Vec<String>,
    line_no: usize,
}

impl Parser {
    fn new() -> Self {
        Self {
            doc: Document::new(),
            open: Open::Nothing,
            held: Vec::new(),
            line_no: 0,
        }
    }

    fn feed(&mut self, line: &str) -> ConfigResult<()> {
        self.line_no += 1;

        let raw = match line.strip_suffix("\r\n") {
            Some(body) => format!("{body}\n"),
            None => line.to_string(),
        };

        let kind = lexer::classify_line(&raw, self.open != Open::Nothing);

        let keeps_open = match kind {
            LineKind::Continuation => true,
            LineKind::Comment => self.open != Open::Nothing,
            _ => false,
        };
        if !keeps_open {
            self.close();
        }

        match kind {
            LineKind::Comment if self.open != Open::Nothing => self.held.push(raw),
            LineKind::Continuation => self.continue_open(raw),
            LineKind::Blank => self.push_plain(raw, |raw| Item::BlankLine { raw }),
            LineKind::Comment => self.push_plain(raw, |raw| Item::Comment { raw }),
            LineKind::Section { name } => self.open_section(name, raw)?,
            LineKind::Option { name, value } => {
                let opt = ConfigOption { name, value, raw };
                if self.push_option(Item::Option(opt))? {
                    self.open = Open::Option;
                }
            }
            LineKind::MultiLineHeader { name } => {
                let opt = MultiLineOption {
                    name,
                    raw,
                    head_value: None,
                    lines: Vec::new(),
                };
                if self.push_option(Item::multi_line(opt))? {
                    self.open = Open::Block;
                }
            }
            LineKind::Unrecognized => self.push_verbatim(raw),
        }

        Ok(())
    }

    /// A line that may extend the option opened just before it.
    fn continue_open(&mut self, raw: String) {
        if self.open == Open::Option {
            if is_comment(raw.trim_start()) {
                self.held.push(raw);
                return;
            }
            if !is_indented(&raw) {
                self.close();
                self.push_verbatim(raw);
                return;
            }
        }
        self.append_continuation(raw);
    }

    fn finish(mut self) -> Document {
        self.close();
        log::debug!(
            "parsed {} lines: {} header lines, {} sections",
            self.line_no,
            self.doc.header.len(),
            self.doc.sections.len()
        );
        self.doc
    }

    /// Stop absorbing continuation lines; held comments become section comments.
    fn close(&mut self) {
        self.open = Open::Nothing;
        let held = std::mem::take(&mut self.held);
        if let Some(section) = self.doc.sections.last_mut() {
            section
                .items
                .extend(held.into_iter().map(|raw| Item::Comment { raw }));
        }
    }

    fn open_section(&mut self, name: String, raw: String) -> ConfigResult<()> {
        if self.doc.section(&name).is_some() {
            return Err(ConfigError::DuplicateSection {
                section: name,
                line: Some(self.line_no),
            });
        }
        log::debug!("line {}: section [{}]", self.line_no, name);
        self.doc.sections.push(Section {
            name,
            raw,
            items: Vec::new(),
        });
        Ok(())
    }

    /// Blank lines and comments: header before the first section, items after.
    fn push_plain(&mut self, raw: String, make: fn(String) -> Item) {
        match self.doc.sections.last_mut() {
            Some(section) => section.items.push(make(raw)),
            None => self.doc.header.push(raw),
        }
    }

    fn push_verbatim(&mut self, raw: String) {
        match self.doc.sections.last_mut() {
            Some(section) => {
                log::warn!(
                    "line {}: unrecognized line in section [{}] kept as is",
                    self.line_no,
                    section.name
                );
                section.items.push(Item::Verbatim { raw });
            }
            None => self.push_header_content(raw),
        }
    }

    fn push_header_content(&mut self, raw: String) {
        log::warn!(
            "line {}: content before the first section kept as header text",
            self.line_no
        );
        self.doc.header.push(raw);
    }

    /// Returns false when the option landed in the header instead.
    fn push_option(&mut self, item: Item) -> ConfigResult<bool> {
        let line_no = self.line_no;
        let Some(section) = self.doc.sections.last_mut() else {
            let raw = match item {
                Item::Option(opt) => opt.raw,
                Item::MultiLineOption(opt) | Item::GcodeBlock(opt) => opt.raw,
                Item::Comment { raw } | Item::BlankLine { raw } | Item::Verbatim { raw } => raw,
            };
            self.push_header_content(raw);
            return Ok(false);
        };

        let name = item.option_name().unwrap_or_default();
        if section.find_option(name).is_some() {
            return Err(ConfigError::DuplicateOption {
                section: section.name.clone(),
                option: name.to_string(),
                line: Some(line_no),
            });
        }
        section.items.push(item);
        Ok(true)
    }

    fn append_continuation(&mut self, raw: String) {
        let Some(item) = self
            .doc
            .sections
            .last_mut()
            .and_then(|section| section.items.last_mut())
        else {
            return;
        };

        if let Item::Option(opt) = item {
            let promoted = MultiLineOption {
                name: std::mem::take(&mut opt.name),
                raw: std::mem::take(&mut opt.raw),
                head_value: Some(std::mem::take(&mut opt.value)),
                lines: Vec::new(),
            };
            *item = Item::multi_line(promoted);
            self.open = Open::Block;
        }

        let (opt, gcode) = match item {
            Item::MultiLineOption(opt) => (opt, false),
            Item::GcodeBlock(opt) => (opt, true),
            _ => return,
        };

        for held in std::mem::take(&mut self.held) {
            let line = if is_indented(&held) {
                block_line(opt, held, gcode)
            } else {
                BlockLine::Comment { raw: held }
            };
            opt.lines.push(line);
        }
        let line = block_line(opt, raw, gcode);
        opt.lines.push(line);
    }
}

/// Continuation line of a block. G-code bodies keep comment lines as values.
fn block_line(opt: &MultiLineOption, raw: String, gcode: bool) -> BlockLine {
    if gcode {
        let value = gcode_value(&raw, opt.base_indent());
        BlockLine::Value { value, raw }
    } else if is_comment(raw.trim_start()) {
        BlockLine::Comment { raw }
    } else {
        let value = continuation_value(&raw).to_string();
        BlockLine::Value { value, raw }
    }
}

/// G-code line value: indentation relative to the block's first line kept,
/// trailing whitespace and terminator removed, comments left alone.
fn gcode_value(raw: &str, base: Option<&str>) -> String {
    let line = raw.trim_end();
    match base {
        Some(base) if line.starts_with(base) => line[base.len()..].to_string(),
        _ => line.trim_start().to_string(),
    }
}
