//! File Level Entry Points
//!
//! Read and write documents by path, plus the one-shot helpers used by
//! call sites that edit a file and save it straight back.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use crate::core::{render, Document, OptionValue};
use crate::error::{ConfigError, ConfigResult};
use crate::parser;

/// Parse the file at `path`.
pub fn read_file(path: impl AsRef<Path>) -> ConfigResult<Document> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ConfigError::io(path, e))?;
    let doc = parser::parse_reader(BufReader::new(file), path)?;
    log::debug!("read {}", path.display());
    Ok(doc)
}

/// Render `doc` to `path`, replacing whatever is there and creating
/// missing parent directories.
pub fn write_file(doc: &Document, path: impl AsRef<Path>) -> ConfigResult<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidArgument(
            "no output path given".to_string(),
        ));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }

    fs::write(path, render(doc)).map_err(|e| ConfigError::io(path, e))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

impl Document {
    /// Same as [`read_file`].
    pub fn read_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        read_file(path)
    }

    /// Same as [`write_file`].
    pub fn write_file(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        write_file(self, path)
    }
}

/// Run `edit` on the document stored at `path` and save the result there.
pub fn edit_file<F>(path: impl AsRef<Path>, edit: F) -> ConfigResult<()>
where
    F: FnOnce(&mut Document) -> ConfigResult<()>,
{
    let path = path.as_ref();
    let mut doc = read_file(path)?;
    edit(&mut doc)?;
    write_file(&doc, path)
}

/// Add `section` with `options` to the file unless the section exists.
///
/// Returns whether the file was changed.
pub fn add_config_section<V>(
    path: impl AsRef<Path>,
    section: &str,
    options: impl IntoIterator<Item = (String, V)>,
) -> ConfigResult<bool>
where
    V: Into<OptionValue>,
{
    let path = path.as_ref();
    let mut doc = read_file(path)?;
    if doc.has_section(section) {
        log::debug!("[{section}] already present in {}", path.display());
        return Ok(false);
    }

    doc.add_section(section)?;
    for (option, value) in options {
        doc.set_option(section, &option, value)?;
    }
    write_file(&doc, path)?;
    Ok(true)
}

/// Insert an empty `section` before every other section of the file,
/// unless it already exists. Returns whether the file was changed.
pub fn add_config_section_at_top(path: impl AsRef<Path>, section: &str) -> ConfigResult<bool> {
    let path = path.as_ref();
    let mut doc = read_file(path)?;
    if doc.has_section(section) {
        log::debug!("[{section}] already present in {}", path.display());
        return Ok(false);
    }

    doc.add_section_at_top(section)?;
    write_file(&doc, path)?;
    Ok(true)
}

/// Remove `section` from the file if it is there. Returns whether the file
/// was changed.
pub fn remove_config_section(path: impl AsRef<Path>, section: &str) -> ConfigResult<bool> {
    let path = path.as_ref();
    let mut doc = read_file(path)?;
    if !doc.has_section(section) {
        log::debug!("[{section}] not present in {}", path.display());
        return Ok(false);
    }

    doc.remove_section(section)?;
    write_file(&doc, path)?;
    Ok(true)
}
