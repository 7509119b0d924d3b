//! Patch Files
//!
//! A patch is a TOML file listing sections to ensure, options to set and
//! things to remove. It is applied to a document through the editor API:
//!
//! ```toml
//! [[section]]
//! name = "update_manager mainsail"
//! [section.options]
//! type = "web"
//! repo = "mainsail-crew/mainsail"
//!
//! [[remove]]
//! section = "printer"
//! option = "max_accel"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use toml::Value;

use crate::core::{Document, OptionValue};
use crate::error::{ConfigError, ConfigResult};

/// Parsed patch file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Patch {
    #[serde(default, rename = "section")]
    pub sections: Vec<SectionPatch>,
    #[serde(default, rename = "remove")]
    pub removals: Vec<Removal>,
}

/// Section to create if missing, and options to set in it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionPatch {
    pub name: String,
    /// Create the section before all others instead of at the end
    #[serde(default)]
    pub at_top: bool,
    /// Options in file order; arrays become multi-line options
    #[serde(default)]
    pub options: toml::Table,
}

/// Removes a whole section, or a single option when `option` is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Removal {
    pub section: String,
    pub option: Option<String>,
}

/// What applying a patch changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatchReport {
    pub sections_added: usize,
    pub options_set: usize,
    pub removed: usize,
    pub skipped: usize,
}

impl PatchReport {
    pub fn changed(&self) -> bool {
        self.sections_added + self.options_set + self.removed > 0
    }
}

impl Patch {
    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|e| ConfigError::Patch(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml(&text)
    }

    /// Apply section entries first, then removals, each in file order.
    ///
    /// Changes are staged on a copy and only land when every step
    /// succeeds, so a bad value leaves the document unchanged.
    pub fn apply(&self, doc: &mut Document) -> ConfigResult<PatchReport> {
        let mut planned = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            let options = section
                .options
                .iter()
                .map(|(option, value)| {
                    to_option_value(&section.name, option, value).map(|v| (option.as_str(), v))
                })
                .collect::<ConfigResult<Vec<_>>>()?;
            planned.push((section, options));
        }

        let mut report = PatchReport::default();
        let mut staged = doc.clone();

        for (section, options) in planned {
            if !staged.has_section(&section.name) {
                if section.at_top {
                    staged.add_section_at_top(&section.name)?;
                } else {
                    staged.add_section(&section.name)?;
                }
                report.sections_added += 1;
            }
            for (option, value) in options {
                staged.set_option(&section.name, option, value)?;
                report.options_set += 1;
            }
        }

        for removal in &self.removals {
            let result = match &removal.option {
                Some(option) => staged.remove_option(&removal.section, option),
                None => staged.remove_section(&removal.section),
            };
            match result {
                Ok(()) => report.removed += 1,
                Err(err @ (ConfigError::NoSection(_) | ConfigError::NoOption { .. })) => {
                    log::debug!("skipping removal: {err}");
                    report.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        *doc = staged;
        log::debug!("patch applied: {report:?}");
        Ok(report)
    }
}

fn to_option_value(section: &str, option: &str, value: &Value) -> ConfigResult<OptionValue> {
    let converted = match value {
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Option<Vec<_>>>()
            .map(OptionValue::Multi),
        other => scalar_text(other).map(OptionValue::Single),
    };

    converted.ok_or_else(|| {
        ConfigError::Patch(format!(
            "[{section}] {option}: expected a string, number, boolean or an array of those"
        ))
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(_) | Value::Array(_) | Value::Table(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render;
    use crate::parser::parse_str;

    const PATCH: &str = r#"
[[section]]
name = "update_manager mainsail"
[section.options]
type = "web"
channel = "stable"
refresh_interval = 24

[[section]]
name = "authorization"
[section.options]
cors_domains = ["*.local", "*.lan"]

[[remove]]
section = "printer"
option = "max_accel"

[[remove]]
section = "gone"
"#;

    #[test]
    fn test_decode_patch() {
        let patch = Patch::from_toml(PATCH).unwrap();
        assert_eq!(patch.sections.len(), 2);
        assert_eq!(patch.removals.len(), 2);
        let keys: Vec<_> = patch.sections[0].options.keys().map(String::as_str).collect();
        assert_eq!(keys, ["type", "channel", "refresh_interval"]);
    }

    #[test]
    fn test_apply_patch() {
        let mut doc = parse_str("[printer]\nmax_accel: 3000\n\n[authorization]\n").unwrap();
        let report = Patch::from_toml(PATCH).unwrap().apply(&mut doc).unwrap();

        assert_eq!(
            report,
            PatchReport {
                sections_added: 1,
                options_set: 4,
                removed: 1,
                skipped: 1,
            }
        );
        assert!(!doc.has_option("printer", "max_accel"));
        assert_eq!(doc.getint("update_manager mainsail", "refresh_interval").unwrap(), 24);
        assert_eq!(doc.getvals("authorization", "cors_domains").unwrap(), ["*.local", "*.lan"]);
        assert_eq!(
            render(&doc),
            "[printer]\n\n[authorization]\ncors_domains:\n    *.local\n    *.lan\n\n[update_manager mainsail]\ntype: web\nchannel: stable\nrefresh_interval: 24\n"
        );
    }

    #[test]
    fn test_bad_value_leaves_document_untouched() {
        let patch = Patch::from_toml("[[section]]\nname = \"a\"\n[section.options]\nx = { y = 1 }\n").unwrap();
        let mut doc = parse_str("[b]\n").unwrap();
        let before = doc.clone();
        assert!(matches!(patch.apply(&mut doc), Err(ConfigError::Patch(_))));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_unwritable_value_leaves_document_untouched() {
        let patch = Patch::from_toml(
            "[[section]]\nname = \"new\"\n[section.options]\nok = 1\nnote = \"a ; b\"\n",
        )
        .unwrap();
        let mut doc = parse_str("[b]\n").unwrap();
        let before = doc.clone();
        assert!(matches!(patch.apply(&mut doc), Err(ConfigError::InvalidArgument(_))));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            Patch::from_toml("[[section]]\nname = \"a\"\ncolour = 1\n"),
            Err(ConfigError::Patch(_))
        ));
    }
}
