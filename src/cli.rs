//! Command dispatch for the `klipper-cfg` binary.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::config::{Command, Config, OutputArgs};
use crate::core::{render, Document, OptionValue};
use crate::files::{read_file, write_file};
use crate::patch::Patch;

/// Entry point used by the binary.
pub fn run() -> Result<()> {
    let config = Config::from_args_and_env()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    let stdout = std::io::stdout();
    run_command(&config, &mut stdout.lock())
}

/// Execute the configured subcommand, printing results to `out`.
pub fn run_command(config: &Config, out: &mut impl Write) -> Result<()> {
    match &config.command {
        Command::Sections { file } => {
            let doc = load(config, file)?;
            for name in doc.get_sections() {
                writeln!(out, "{name}")?;
            }
        }
        Command::Options { file, section } => {
            let doc = load(config, file)?;
            for name in doc.get_options(section)? {
                writeln!(out, "{name}")?;
            }
        }
        Command::Get {
            file,
            section,
            option,
            default,
        } => {
            let doc = load(config, file)?;
            let values = match default {
                Some(fallback) => doc.getvals_or(section, option, &[fallback.as_str()])?,
                None => doc.getvals(section, option)?,
            };
            for value in values {
                writeln!(out, "{value}")?;
            }
        }
        Command::Set {
            file,
            section,
            option,
            values,
            multi,
            output,
        } => {
            let value = match values.as_slice() {
                [single] if !multi => OptionValue::Single(single.clone()),
                _ => OptionValue::Multi(values.clone()),
            };
            edit(config, file, output, |doc| {
                doc.set_option(section, option, value)?;
                Ok(())
            })?;
        }
        Command::RemoveOption {
            file,
            section,
            option,
            output,
        } => {
            edit(config, file, output, |doc| {
                doc.remove_option(section, option)?;
                Ok(())
            })?;
        }
        Command::AddSection {
            file,
            section,
            top,
            output,
        } => {
            edit(config, file, output, |doc| {
                if *top {
                    doc.add_section_at_top(section)?;
                } else {
                    doc.add_section(section)?;
                }
                Ok(())
            })?;
        }
        Command::RemoveSection {
            file,
            section,
            output,
        } => {
            edit(config, file, output, |doc| {
                doc.remove_section(section)?;
                Ok(())
            })?;
        }
        Command::Apply {
            file,
            patch,
            output,
        } => {
            let patch_path = config.resolve(patch);
            let patch = Patch::load(&patch_path)
                .with_context(|| format!("loading patch {}", patch_path.display()))?;
            let mut report = None;
            edit(config, file, output, |doc| {
                report = Some(patch.apply(doc)?);
                Ok(())
            })?;
            if let Some(report) = report {
                writeln!(out, "{}", serde_json::to_string(&report)?)?;
            }
        }
        Command::Dump { file } => {
            let doc = load(config, file)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
        }
        Command::Check { file } => {
            let path = config.resolve(file);
            let doc = read_document(&path)?;
            let original = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?
                .replace("\r\n", "\n");
            let rendered = render(&doc);
            if let Some(line) = first_difference(&original, &rendered) {
                bail!("{}: rendering differs from source at line {line}", path.display());
            }
            writeln!(out, "{}: ok, {} sections", path.display(), doc.sections().len())?;
        }
    }

    Ok(())
}

fn load(config: &Config, file: &Path) -> Result<Document> {
    read_document(&config.resolve(file))
}

fn read_document(path: &Path) -> Result<Document> {
    read_file(path).map_err(|err| {
        let action = if err.is_parse_error() { "parsing" } else { "reading" };
        anyhow::Error::new(err).context(format!("{action} {}", path.display()))
    })
}

fn edit<F>(config: &Config, file: &Path, output: &OutputArgs, apply: F) -> Result<()>
where
    F: FnOnce(&mut Document) -> Result<()>,
{
    let source = config.resolve(file);
    let mut doc = read_document(&source)?;
    apply(&mut doc)?;

    let target: PathBuf = match &output.output {
        Some(path) => config.resolve(path),
        None => source,
    };
    write_file(&doc, &target).with_context(|| format!("writing {}", target.display()))
}

/// 1-based number of the first line where the two texts disagree.
fn first_difference(left: &str, right: &str) -> Option<usize> {
    if left == right {
        return None;
    }
    let mut a = left.split_inclusive('\n');
    let mut b = right.split_inclusive('\n');
    let mut line = 1;
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) if x == y => line += 1,
            _ => return Some(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_errors_name_the_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printer.cfg");
        fs::write(&path, "[a]\nx: 1\nx: 2\n").unwrap();

        let err = read_document(&path).unwrap_err();
        assert!(err.to_string().starts_with("parsing "), "{err}");
        assert!(err.root_cause().to_string().contains("line 3"));

        let err = read_document(&dir.path().join("missing.cfg")).unwrap_err();
        assert!(err.to_string().starts_with("reading "), "{err}");
    }

    #[test]
    fn test_first_difference() {
        assert_eq!(first_difference("a\nb\n", "a\nb\n"), None);
        assert_eq!(first_difference("a\nb\n", "a\nc\n"), Some(2));
        assert_eq!(first_difference("a\n", "a\nb\n"), Some(2));
    }
}
