//! Batch driver: parse, pre-pass, emit, write to disk, for a fixed manifest
//! of classes.
//!
//! The declaration pass runs for every manifest class before the definition
//! pass runs for any: the define registry and symbol table must be fully
//! populated by header emission before body emission queries them
//! cross-class. Within the run everything is strictly sequential; the first
//! fatal error aborts the whole batch.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::ast::CompilationUnit;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser::parse_java;
use crate::translate::{TargetPolicy, Translator};

/// Counts reported after a successful run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub headers_written: usize,
    pub bodies_written: usize,
    pub atoms_written: usize,
}

struct ParsedClass {
    name: String,
    unit: CompilationUnit,
    license: String,
}

/// Translate the whole manifest and write the generated files.
pub fn run(config: &Config) -> Result<RunSummary> {
    fs::create_dir_all(&config.out_dir)?;

    let mut translator = Translator::new();
    let mut summary = RunSummary::default();
    let mut parsed = Vec::with_capacity(config.header_manifest.len());

    for class in &config.header_manifest {
        let path = config.src_dir.join(format!("{}.java", class));
        let source = fs::read_to_string(&path)?;
        let unit = parse_java(&source).map_err(|e| with_file(e, &path))?;
        let license = extract_license(&source);

        let header = translator.header(&unit).map_err(|e| with_file(e, &path))?;
        let file_name = format!("{}{}.h", translator.policy().class_prefix(), class);
        let text = assemble(&license, class, &header);
        fs::write(config.out_dir.join(file_name), text)?;
        summary.headers_written += 1;

        parsed.push(ParsedClass {
            name: class.clone(),
            unit,
            license,
        });
    }

    for class in &config.body_manifest {
        let entry = parsed
            .iter()
            .find(|p| &p.name == class)
            .ok_or_else(|| {
                Error::internal(format!(
                    "definition manifest entry {} is not in the declaration manifest",
                    class
                ))
            })?;
        let body = translator
            .body(&entry.unit)
            .map_err(|e| with_file(e, &config.src_dir.join(format!("{}.java", class))))?;
        let file_name = format!("{}{}.cpp", translator.policy().class_prefix(), class);
        let text = assemble(&entry.license, class, &body);
        fs::write(config.out_dir.join(file_name), text)?;
        summary.bodies_written += 1;
    }

    if let Some(atom_path) = &config.atom_list {
        let mut atom_text = String::new();
        for (atom, literal) in translator.atom_records() {
            atom_text.push_str(&translator.policy().atom_record(atom, literal));
            atom_text.push('\n');
            summary.atoms_written += 1;
        }
        fs::write(atom_path, atom_text)?;
    }

    Ok(summary)
}

/// Manifest entries with no corresponding source file under `src_dir`.
pub fn check(config: &Config) -> Result<Vec<String>> {
    let mut present = Vec::new();
    for entry in WalkDir::new(&config.src_dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().map(|e| e == "java").unwrap_or(false) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                present.push(stem.to_string());
            }
        }
    }
    let missing = config
        .header_manifest
        .iter()
        .filter(|class| !present.iter().any(|p| &p == class))
        .cloned()
        .collect();
    Ok(missing)
}

/// License header copied verbatim from the input's leading comment block,
/// then the generated-file banner, then the emitted text.
fn assemble(license: &str, class: &str, emitted: &str) -> String {
    let mut out = String::with_capacity(license.len() + emitted.len() + 256);
    if !license.is_empty() {
        out.push_str(license);
        out.push_str("\n\n");
    }
    out.push_str(&banner(class));
    out.push('\n');
    out.push_str(emitted);
    out
}

fn banner(class: &str) -> String {
    format!(
        "/*\n * THIS IS A GENERATED FILE. PLEASE DO NOT EDIT.\n * Please edit {}.java instead and regenerate.\n */\n",
        class
    )
}

/// The leading `/* ... */` block of the source, if the file starts with one.
fn extract_license(source: &str) -> String {
    let trimmed = source.trim_start();
    if !trimmed.starts_with("/*") {
        return String::new();
    }
    match trimmed.find("*/") {
        Some(end) => trimmed[..end + 2].to_string(),
        None => String::new(),
    }
}

fn with_file(error: Error, path: &Path) -> Error {
    match error {
        Error::Parse {
            line,
            column,
            message,
        } => Error::Parse {
            line,
            column,
            message: format!("{}: {}", path.display(), message),
        },
        Error::Lexical { message } => Error::Lexical {
            message: format!("{}: {}", path.display(), message),
        },
        Error::Unsupported { construct } => Error::Unsupported {
            construct: format!("{} (in {})", construct, path.display()),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn license_extraction_takes_the_leading_block() {
        let source = "/*\n * Copyright (c) 2008 Mozilla Foundation\n */\npackage p;\npublic class C {}\n";
        let license = extract_license(source);
        assert!(license.starts_with("/*"));
        assert!(license.ends_with("*/"));
        assert!(license.contains("Mozilla Foundation"));
    }

    #[test]
    fn files_without_comment_get_no_license() {
        assert_eq!(extract_license("package p;\n"), "");
    }
}
