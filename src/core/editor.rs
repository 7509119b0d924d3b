//! Editor API
//!
//! Query and mutation surface over a parsed [`Document`]. Lookups are
//! exact string matches. Fallbacks only ever stand in for a missing
//! section or option, never for a value that fails to convert.

use super::document::{ConfigOption, Document, Item, MultiLineOption, Section, is_gcode_name};
use crate::error::{ConfigError, ConfigResult};
use crate::parser::lexer::split_inline_comment;

/// Value accepted by [`Document::set_option`].
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Written as `option: value`
    Single(String),
    /// Written as `option:` followed by one indented line per value
    Multi(Vec<String>),
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&String> for OptionValue {
    fn from(value: &String) -> Self {
        Self::Single(value.clone())
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

impl From<Vec<&str>> for OptionValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multi(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for OptionValue {
    fn from(values: &[&str]) -> Self {
        Self::Multi(values.iter().map(|v| v.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OptionValue {
    fn from(values: [&str; N]) -> Self {
        Self::Multi(values.iter().map(|v| v.to_string()).collect())
    }
}

const BOOLEAN_STATES: [(&str, bool); 8] = [
    ("1", true),
    ("yes", true),
    ("true", true),
    ("on", true),
    ("0", false),
    ("no", false),
    ("false", false),
    ("off", false),
];

/// Replace a missing section or option with `fallback`; keep other errors.
fn or_fallback<T>(result: ConfigResult<T>, fallback: T) -> ConfigResult<T> {
    match result {
        Err(ConfigError::NoSection(_) | ConfigError::NoOption { .. }) => Ok(fallback),
        other => other,
    }
}

fn check_section_name(name: &str) -> ConfigResult<()> {
    if name.is_empty() || name.contains([']', '\n', '\r']) {
        return Err(ConfigError::InvalidArgument(format!(
            "'{name}' is not a valid section name"
        )));
    }
    Ok(())
}

fn check_option_name(name: &str) -> ConfigResult<()> {
    let invalid = |c: char| c.is_whitespace() || matches!(c, ':' | '=' | '#' | ';' | '[');
    if name.is_empty() || name.contains(invalid) {
        return Err(ConfigError::InvalidArgument(format!(
            "'{name}' is not a valid option name"
        )));
    }
    Ok(())
}

fn check_value(value: &str) -> ConfigResult<()> {
    if value.contains(['\n', '\r']) {
        return Err(ConfigError::InvalidArgument(
            "option values cannot contain line breaks".to_string(),
        ));
    }
    Ok(())
}

fn unwritable(value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidArgument(format!("value '{value}' cannot be written: {reason}"))
}

/// A value written as `option: value` must read back unchanged.
fn check_single(value: &str) -> ConfigResult<()> {
    check_value(value)?;
    if value.trim() != value {
        return Err(unwritable(value, "leading or trailing whitespace"));
    }
    if split_inline_comment(value).1.is_some() {
        return Err(unwritable(value, "it would be read as a comment"));
    }
    Ok(())
}

/// Each entry is written on its own indented line.
///
/// G-code entries may hold `#` and `;` text. Only the first one must be
/// unindented: it sets the base indentation of the block.
fn check_multi(values: &[String], gcode: bool) -> ConfigResult<()> {
    for (idx, value) in values.iter().enumerate() {
        check_value(value)?;
        if value.trim().is_empty() {
            return Err(unwritable(value, "blank lines end a multi-line option"));
        }
        if gcode {
            if value.trim_end() != value || (idx == 0 && value.trim_start() != value) {
                return Err(unwritable(value, "whitespace would be lost"));
            }
        } else {
            check_single(value)?;
        }
    }
    Ok(())
}

impl Document {
    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// Section names in declaration order.
    pub fn get_sections(&self) -> Vec<&str> {
        self.sections.iter().map(Section::name).collect()
    }

    /// Append an empty section at the end of the document.
    pub fn add_section(&mut self, name: &str) -> ConfigResult<()> {
        check_section_name(name)?;
        if self.has_section(name) {
            return Err(ConfigError::DuplicateSection {
                section: name.to_string(),
                line: None,
            });
        }

        self.terminate_last_line();
        if let Some(last) = self.sections.last_mut() {
            if !last.items.last().is_some_and(Item::is_blank) {
                last.items.push(Item::blank());
            }
        }

        log::debug!("add section [{name}]");
        self.sections.push(Section::new(name));
        Ok(())
    }

    /// Insert an empty section before the first one, below the header.
    pub fn add_section_at_top(&mut self, name: &str) -> ConfigResult<()> {
        check_section_name(name)?;
        if self.has_section(name) {
            return Err(ConfigError::DuplicateSection {
                section: name.to_string(),
                line: None,
            });
        }

        let mut section = Section::new(name);
        if self.sections.is_empty() {
            self.terminate_last_line();
        } else {
            section.items.push(Item::blank());
        }

        log::debug!("add section [{name}] at top");
        self.sections.insert(0, section);
        Ok(())
    }

    /// Remove a section and everything in it.
    pub fn remove_section(&mut self, name: &str) -> ConfigResult<()> {
        let idx = self
            .sections
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| ConfigError::NoSection(name.to_string()))?;
        log::debug!("remove section [{name}]");
        self.sections.remove(idx);
        Ok(())
    }

    pub fn has_option(&self, section: &str, option: &str) -> bool {
        self.section(section)
            .is_some_and(|s| s.find_option(option).is_some())
    }

    /// Option names of `section` in declaration order.
    pub fn get_options(&self, section: &str) -> ConfigResult<Vec<&str>> {
        Ok(self.require_section(section)?.option_names().collect())
    }

    /// Single-line value of an option.
    ///
    /// A multi-line option with no continuation values reads as its header
    /// value, or as the empty string for a bare `name:`.
    pub fn getval(&self, section: &str, option: &str) -> ConfigResult<&str> {
        match self.lookup(section, option)? {
            Item::Option(opt) => Ok(opt.value.as_str()),
            Item::MultiLineOption(opt) | Item::GcodeBlock(opt) => {
                let mut values = opt.values();
                match (values.next(), values.next()) {
                    (None, _) => Ok(""),
                    (Some(value), None) if opt.head_value.is_some() => Ok(value),
                    _ => Err(ConfigError::NotSingleLine {
                        section: section.to_string(),
                        option: option.to_string(),
                    }),
                }
            }
            Item::Comment { .. } | Item::BlankLine { .. } | Item::Verbatim { .. } => {
                Err(self.no_option(section, option))
            }
        }
    }

    pub fn getval_or<'a>(
        &'a self,
        section: &str,
        option: &str,
        fallback: &'a str,
    ) -> ConfigResult<&'a str> {
        or_fallback(self.getval(section, option), fallback)
    }

    /// All values of an option in order. A single-line option yields one.
    pub fn getvals(&self, section: &str, option: &str) -> ConfigResult<Vec<&str>> {
        match self.lookup(section, option)? {
            Item::Option(opt) => Ok(vec![opt.value.as_str()]),
            Item::MultiLineOption(opt) | Item::GcodeBlock(opt) => Ok(opt.values().collect()),
            Item::Comment { .. } | Item::BlankLine { .. } | Item::Verbatim { .. } => {
                Err(self.no_option(section, option))
            }
        }
    }

    pub fn getvals_or<'a>(
        &'a self,
        section: &str,
        option: &str,
        fallback: &[&'a str],
    ) -> ConfigResult<Vec<&'a str>> {
        or_fallback(self.getvals(section, option), fallback.to_vec())
    }

    pub fn getint(&self, section: &str, option: &str) -> ConfigResult<i64> {
        let value = self.getval(section, option)?;
        value
            .parse()
            .map_err(|_| invalid_value(section, option, value, "an integer"))
    }

    pub fn getint_or(&self, section: &str, option: &str, fallback: i64) -> ConfigResult<i64> {
        or_fallback(self.getint(section, option), fallback)
    }

    pub fn getfloat(&self, section: &str, option: &str) -> ConfigResult<f64> {
        let value = self.getval(section, option)?;
        value
            .parse()
            .map_err(|_| invalid_value(section, option, value, "a float"))
    }

    pub fn getfloat_or(&self, section: &str, option: &str, fallback: f64) -> ConfigResult<f64> {
        or_fallback(self.getfloat(section, option), fallback)
    }

    /// `true/yes/1/on` and `false/no/0/off`, case-insensitive.
    pub fn getboolean(&self, section: &str, option: &str) -> ConfigResult<bool> {
        let value = self.getval(section, option)?;
        let lowered = value.to_ascii_lowercase();
        BOOLEAN_STATES
            .iter()
            .find(|(state, _)| *state == lowered)
            .map(|(_, flag)| *flag)
            .ok_or_else(|| invalid_value(section, option, value, "a boolean"))
    }

    pub fn getboolean_or(&self, section: &str, option: &str, fallback: bool) -> ConfigResult<bool> {
        or_fallback(self.getboolean(section, option), fallback)
    }

    /// Create or overwrite an option.
    ///
    /// An existing option keeps its position, a new one goes after the last
    /// non-blank item of the section. The section must already exist.
    pub fn set_option(
        &mut self,
        section: &str,
        option: &str,
        value: impl Into<OptionValue>,
    ) -> ConfigResult<()> {
        check_option_name(option)?;
        let item = match value.into() {
            OptionValue::Single(value) => {
                check_single(&value)?;
                Item::Option(ConfigOption::new(option, &value))
            }
            OptionValue::Multi(values) => {
                check_multi(&values, is_gcode_name(option))?;
                Item::multi_line(MultiLineOption::new(option, &values))
            }
        };

        let idx = self
            .sections
            .iter()
            .position(|s| s.name == section)
            .ok_or_else(|| ConfigError::NoSection(section.to_string()))?;
        let is_last = idx + 1 == self.sections.len();

        let existing = self.sections[idx].find_option(option).map(|(pos, _)| pos);
        if let Some(pos) = existing {
            log::debug!("update [{section}] {option}");
            self.sections[idx].items[pos] = item;
            return Ok(());
        }

        let at = self.sections[idx].content_end();
        if is_last && at == self.sections[idx].items.len() {
            self.terminate_last_line();
        }
        log::debug!("add [{section}] {option}");
        self.sections[idx].items.insert(at, item);
        Ok(())
    }

    /// Remove an option; the other items keep their order.
    pub fn remove_option(&mut self, section: &str, option: &str) -> ConfigResult<()> {
        let target = self
            .section_mut(section)
            .ok_or_else(|| ConfigError::NoSection(section.to_string()))?;
        let pos = target
            .find_option(option)
            .map(|(pos, _)| pos)
            .ok_or_else(|| ConfigError::NoOption {
                section: section.to_string(),
                option: option.to_string(),
            })?;
        log::debug!("remove [{section}] {option}");
        target.items.remove(pos);
        Ok(())
    }

    fn require_section(&self, name: &str) -> ConfigResult<&Section> {
        self.section(name)
            .ok_or_else(|| ConfigError::NoSection(name.to_string()))
    }

    fn lookup(&self, section: &str, option: &str) -> ConfigResult<&Item> {
        self.require_section(section)?
            .find_option(option)
            .map(|(_, item)| item)
            .ok_or_else(|| self.no_option(section, option))
    }

    fn no_option(&self, section: &str, option: &str) -> ConfigError {
        ConfigError::NoOption {
            section: section.to_string(),
            option: option.to_string(),
        }
    }
}

fn invalid_value(section: &str, option: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        option: option.to_string(),
        value: value.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::render;
    use crate::parser::parse_str;

    const SAMPLE: &str = "\
# printer.cfg
[printer]
kinematics: corexy
max_velocity: 300
square_corner_velocity = 5.0
use_firmware_retraction: Off

[authorization]
trusted_clients:
    10.0.0.0/8
    127.0.0.0/8
";

    fn sample() -> Document {
        parse_str(SAMPLE).expect("parse sample")
    }

    #[test]
    fn test_sections_and_options() {
        let doc = sample();
        assert_eq!(doc.get_sections(), ["printer", "authorization"]);
        assert!(doc.has_section("printer"));
        assert!(!doc.has_section("Printer"));
        assert_eq!(
            doc.get_options("printer").unwrap(),
            ["kinematics", "max_velocity", "square_corner_velocity", "use_firmware_retraction"]
        );
        assert!(matches!(doc.get_options("missing"), Err(ConfigError::NoSection(_))));
    }

    #[test]
    fn test_typed_getters() {
        let doc = sample();
        assert_eq!(doc.getval("printer", "kinematics").unwrap(), "corexy");
        assert_eq!(doc.getint("printer", "max_velocity").unwrap(), 300);
        assert_eq!(doc.getfloat("printer", "square_corner_velocity").unwrap(), 5.0);
        assert!(!doc.getboolean("printer", "use_firmware_retraction").unwrap());
        assert!(matches!(
            doc.getint("printer", "kinematics"),
            Err(ConfigError::InvalidValue { expected: "an integer", .. })
        ));
        assert!(matches!(
            doc.getboolean("printer", "kinematics"),
            Err(ConfigError::InvalidValue { expected: "a boolean", .. })
        ));
    }

    #[test]
    fn test_fallbacks_cover_absence_only() {
        let doc = sample();
        assert_eq!(doc.getint_or("printer", "missing_option", 99).unwrap(), 99);
        assert_eq!(doc.getint_or("nope", "max_velocity", 1).unwrap(), 1);
        assert_eq!(doc.getval_or("printer", "x", "dflt").unwrap(), "dflt");
        assert!(doc.getboolean_or("printer", "x", true).unwrap());
        assert_eq!(doc.getfloat_or("printer", "x", 1.5).unwrap(), 1.5);
        assert!(doc.getint_or("printer", "kinematics", 99).is_err());
        assert_eq!(doc.getvals_or("printer", "x", &["a"]).unwrap(), ["a"]);
        assert!(matches!(
            doc.getval("printer", "x"),
            Err(ConfigError::NoOption { .. })
        ));
    }

    #[test]
    fn test_getval_on_multiline() {
        let doc = sample();
        assert!(matches!(
            doc.getval("authorization", "trusted_clients"),
            Err(ConfigError::NotSingleLine { .. })
        ));
        assert_eq!(
            doc.getvals("authorization", "trusted_clients").unwrap(),
            ["10.0.0.0/8", "127.0.0.0/8"]
        );
        assert_eq!(doc.getvals("printer", "kinematics").unwrap(), ["corexy"]);

        let bare = parse_str("[a]\nm:\n").unwrap();
        assert_eq!(bare.getval("a", "m").unwrap(), "");
    }

    #[test]
    fn test_set_existing_keeps_position() {
        let mut doc = sample();
        doc.set_option("printer", "max_velocity", 250_i64).unwrap();
        assert_eq!(
            doc.get_options("printer").unwrap()[1],
            "max_velocity"
        );
        assert!(render(&doc).contains("kinematics: corexy\nmax_velocity: 250\nsquare"));
    }

    #[test]
    fn test_set_new_option_before_trailing_blank() {
        let mut doc = sample();
        doc.set_option("printer", "max_accel", "3000").unwrap();
        assert!(render(&doc).contains("use_firmware_retraction: Off\nmax_accel: 3000\n\n[authorization]"));
    }

    #[test]
    fn test_set_multiline_replaces_all_values() {
        let mut doc = sample();
        doc.set_option("authorization", "trusted_clients", ["a", "b", "c"])
            .unwrap();
        assert_eq!(
            doc.getvals("authorization", "trusted_clients").unwrap(),
            ["a", "b", "c"]
        );
        let out = render(&doc);
        assert!(out.ends_with("trusted_clients:\n    a\n    b\n    c\n"));
        assert!(!out.contains("10.0.0.0/8"));
    }

    #[test]
    fn test_set_switches_between_kinds() {
        let mut doc = sample();
        doc.set_option("authorization", "trusted_clients", "192.168.0.0/16")
            .unwrap();
        assert_eq!(
            doc.getval("authorization", "trusted_clients").unwrap(),
            "192.168.0.0/16"
        );
        doc.set_option("printer", "kinematics", vec!["x", "y"]).unwrap();
        assert_eq!(doc.getvals("printer", "kinematics").unwrap(), ["x", "y"]);
    }

    #[test]
    fn test_set_gcode_creates_gcode_block() {
        let mut doc = parse_str("[gcode_macro HOME]\n").unwrap();
        doc.set_option("gcode_macro HOME", "gcode", ["G28", "  G1 Z10"])
            .unwrap();
        let section = doc.section("gcode_macro HOME").unwrap();
        assert!(matches!(section.items()[0], Item::GcodeBlock(_)));
        assert_eq!(render(&doc), "[gcode_macro HOME]\ngcode:\n    G28\n      G1 Z10\n");
        let reparsed = parse_str(&render(&doc)).unwrap();
        assert_eq!(
            reparsed.getvals("gcode_macro HOME", "gcode").unwrap(),
            ["G28", "  G1 Z10"]
        );
    }

    #[test]
    fn test_set_option_requires_section() {
        let mut doc = sample();
        assert!(matches!(
            doc.set_option("missing", "x", "1"),
            Err(ConfigError::NoSection(_))
        ));
    }

    #[test]
    fn test_set_option_rejects_bad_input() {
        let mut doc = sample();
        assert!(matches!(
            doc.set_option("printer", "bad name", "1"),
            Err(ConfigError::InvalidArgument(_))
        ));
        assert!(matches!(
            doc.set_option("printer", "x", "a\nb"),
            Err(ConfigError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_set_option_rejects_values_that_read_back_differently() {
        let mut doc = parse_str("[a]\n").unwrap();
        let before = doc.clone();

        for value in ["foo ; bar", "foo # bar", "# x", " padded", "padded "] {
            assert!(
                matches!(doc.set_option("a", "s", value), Err(ConfigError::InvalidArgument(_))),
                "{value:?} accepted"
            );
        }
        for values in [vec!["x", "", "y"], vec!["x", "   "], vec!["# x", "y"], vec!["; x"], vec!["a ; b"]] {
            assert!(
                matches!(doc.set_option("a", "m", values.clone()), Err(ConfigError::InvalidArgument(_))),
                "{values:?} accepted"
            );
        }
        for values in [vec!["  G28", "G1"], vec!["G28", ""], vec!["G28 "]] {
            assert!(
                matches!(doc.set_option("a", "gcode", values.clone()), Err(ConfigError::InvalidArgument(_))),
                "{values:?} accepted"
            );
        }
        assert_eq!(doc, before);
    }

    #[test]
    fn test_written_values_read_back_unchanged() {
        let mut doc = parse_str("[a]\n").unwrap();
        doc.set_option("a", "url", "http://host/#frag").unwrap();
        doc.set_option("a", "empty", "").unwrap();
        doc.set_option("a", "list", ["x;y", "a#b", "10.0.0.0/8"]).unwrap();
        doc.set_option("a", "gcode", ["# note", "G28 ; home", "  G1 Z10"]).unwrap();

        let reparsed = parse_str(&render(&doc)).unwrap();
        assert_eq!(reparsed.getval("a", "url").unwrap(), "http://host/#frag");
        assert_eq!(reparsed.getval("a", "empty").unwrap(), "");
        assert_eq!(reparsed.getvals("a", "list").unwrap(), ["x;y", "a#b", "10.0.0.0/8"]);
        assert_eq!(
            reparsed.getvals("a", "gcode").unwrap(),
            ["# note", "G28 ; home", "  G1 Z10"]
        );
        assert_eq!(render(&reparsed), render(&doc));
    }

    #[test]
    fn test_set_option_terminates_last_line() {
        let mut doc = parse_str("[a]\nx: 1").unwrap();
        doc.set_option("a", "y", "2").unwrap();
        assert_eq!(render(&doc), "[a]\nx: 1\ny: 2\n");

        let mut doc = parse_str("[a]").unwrap();
        doc.set_option("a", "y", "2").unwrap();
        assert_eq!(render(&doc), "[a]\ny: 2\n");
    }

    #[test]
    fn test_add_section_spacing() {
        let mut doc = parse_str("[a]\nx: 1").unwrap();
        doc.add_section("b").unwrap();
        assert_eq!(render(&doc), "[a]\nx: 1\n\n[b]\n");
        doc.add_section("c").unwrap();
        assert_eq!(render(&doc), "[a]\nx: 1\n\n[b]\n\n[c]\n");
        assert!(matches!(
            doc.add_section("a"),
            Err(ConfigError::DuplicateSection { line: None, .. })
        ));
    }

    #[test]
    fn test_add_section_at_top() {
        let mut doc = sample();
        doc.add_section_at_top("include mainsail.cfg").unwrap();
        assert_eq!(doc.get_sections()[0], "include mainsail.cfg");
        assert!(render(&doc).starts_with("# printer.cfg\n[include mainsail.cfg]\n\n[printer]\n"));

        let mut empty = parse_str("# only header").unwrap();
        empty.add_section_at_top("a").unwrap();
        assert_eq!(render(&empty), "# only header\n[a]\n");
    }

    #[test]
    fn test_add_then_remove_section() {
        let mut doc = sample();
        let before = doc.section("printer").unwrap().clone();
        doc.add_section("temp").unwrap();
        doc.remove_section("temp").unwrap();
        assert!(!doc.has_section("temp"));
        assert_eq!(doc.section("printer").unwrap(), &before);
        assert!(matches!(doc.remove_section("temp"), Err(ConfigError::NoSection(_))));
    }

    #[test]
    fn test_remove_option() {
        let mut doc = parse_str("[section_1]\noption_1: value_1\n").unwrap();
        assert_eq!(doc.getval("section_1", "option_1").unwrap(), "value_1");
        doc.remove_option("section_1", "option_1").unwrap();
        assert!(!doc.has_option("section_1", "option_1"));
        assert_eq!(render(&doc), "[section_1]\n");
        assert!(matches!(
            doc.remove_option("section_1", "option_1"),
            Err(ConfigError::NoOption { .. })
        ));
        assert!(matches!(
            doc.remove_option("nope", "option_1"),
            Err(ConfigError::NoSection(_))
        ));
    }

    #[test]
    fn test_add_section_rejects_bad_name() {
        let mut doc = Document::new();
        assert!(matches!(doc.add_section(""), Err(ConfigError::InvalidArgument(_))));
        assert!(matches!(doc.add_section("a]b"), Err(ConfigError::InvalidArgument(_))));
    }
}
