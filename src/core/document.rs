//! Document Model
//!
//! Ordered, lossless representation of a parsed config file. Every item
//! keeps the raw text it was read from so an untouched document renders
//! back byte for byte.

use serde::Serialize;

/// A whole config file: header lines, then sections in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub(crate) header: Vec<String>,
    pub(crate) sections: Vec<Section>,
}

/// A `[name]` block and everything up to the next header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub(crate) name: String,
    pub(crate) raw: String,
    pub(crate) items: Vec<Item>,
}

/// One entry in a section body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    Option(ConfigOption),
    MultiLineOption(MultiLineOption),
    /// Multi-line option holding a G-code template (`gcode`, `*_gcode`)
    GcodeBlock(MultiLineOption),
    Comment { raw: String },
    BlankLine { raw: String },
    /// A line that matched nothing, kept so it is not lost on write
    Verbatim { raw: String },
}

/// `name: value`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigOption {
    pub(crate) name: String,
    pub(crate) value: String,
    pub(crate) raw: String,
}

/// `name:` followed by indented continuation lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiLineOption {
    pub(crate) name: String,
    pub(crate) raw: String,
    /// Value written on the header line itself (`name: first` + continuations)
    pub(crate) head_value: Option<String>,
    pub(crate) lines: Vec<BlockLine>,
}

/// A continuation line inside a multi-line option.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockLine {
    Value { value: String, raw: String },
    /// Comment carried inside the block; not part of the values
    Comment { raw: String },
}

/// Options whose body is a G-code template rather than a list of values.
pub fn is_gcode_name(name: &str) -> bool {
    name == "gcode" || name.ends_with("_gcode")
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw lines preceding the first section.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub(crate) fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    /// Terminate the final line of the document with `\n` if it lacks one.
    ///
    /// Only the last line read from a file can be unterminated, so this is
    /// needed before anything gets appended after it.
    pub(crate) fn terminate_last_line(&mut self) {
        let last = match self.sections.last_mut() {
            Some(section) => match section.items.last_mut() {
                Some(item) => item.last_raw_mut(),
                None => Some(&mut section.raw),
            },
            None => self.header.last_mut(),
        };

        if let Some(raw) = last {
            if !raw.ends_with('\n') {
                raw.push('\n');
            }
        }
    }
}

impl Section {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            raw: format!("[{name}]\n"),
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header line exactly as it will be written.
    pub fn raw_header(&self) -> &str {
        &self.raw
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Position and item of the option called `name`, first match wins.
    pub(crate) fn find_option(&self, name: &str) -> Option<(usize, &Item)> {
        self.items
            .iter()
            .enumerate()
            .find(|(_, item)| item.option_name() == Some(name))
    }

    pub(crate) fn option_names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(Item::option_name)
    }

    /// Index right after the last non-blank item.
    pub(crate) fn content_end(&self) -> usize {
        self.items
            .iter()
            .rposition(|item| !item.is_blank())
            .map_or(0, |idx| idx + 1)
    }
}

impl Item {
    /// Name of the option this item declares, if it is an option.
    pub fn option_name(&self) -> Option<&str> {
        match self {
            Item::Option(opt) => Some(opt.name.as_str()),
            Item::MultiLineOption(opt) | Item::GcodeBlock(opt) => Some(opt.name.as_str()),
            Item::Comment { .. } | Item::BlankLine { .. } | Item::Verbatim { .. } => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Item::BlankLine { .. })
    }

    pub(crate) fn blank() -> Self {
        Item::BlankLine {
            raw: "\n".to_string(),
        }
    }

    /// Build a multi-line item, choosing the G-code variant by name.
    pub(crate) fn multi_line(opt: MultiLineOption) -> Self {
        if is_gcode_name(&opt.name) {
            Item::GcodeBlock(opt)
        } else {
            Item::MultiLineOption(opt)
        }
    }

    fn last_raw_mut(&mut self) -> Option<&mut String> {
        match self {
            Item::Option(opt) => Some(&mut opt.raw),
            Item::MultiLineOption(opt) | Item::GcodeBlock(opt) => match opt.lines.last_mut() {
                Some(BlockLine::Value { raw, .. } | BlockLine::Comment { raw }) => Some(raw),
                None => Some(&mut opt.raw),
            },
            Item::Comment { raw } | Item::BlankLine { raw } | Item::Verbatim { raw } => Some(raw),
        }
    }
}

impl ConfigOption {
    pub(crate) fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            raw: format!("{name}: {value}\n"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl MultiLineOption {
    /// A freshly written option: `name:` then each value indented by four spaces.
    pub(crate) fn new<S: AsRef<str>>(name: &str, values: &[S]) -> Self {
        Self {
            name: name.to_string(),
            raw: format!("{name}:\n"),
            head_value: None,
            lines: values
                .iter()
                .map(|v| BlockLine::Value {
                    value: v.as_ref().to_string(),
                    raw: format!("    {}\n", v.as_ref()),
                })
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_header(&self) -> &str {
        &self.raw
    }

    pub fn lines(&self) -> &[BlockLine] {
        &self.lines
    }

    /// Values in order, the header-line value first when present.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.head_value.as_deref().into_iter().chain(
            self.lines.iter().filter_map(|line| match line {
                BlockLine::Value { value, .. } => Some(value.as_str()),
                BlockLine::Comment { .. } => None,
            }),
        )
    }

    /// Indentation of the first value line, the base for G-code bodies.
    pub(crate) fn base_indent(&self) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            BlockLine::Value { raw, .. } => Some(crate::parser::lexer::indentation(raw)),
            BlockLine::Comment { .. } => None,
        })
    }
}
