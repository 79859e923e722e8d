//! j2cpp: Java-to-C++ source translator
//!
//! A batch translator that turns a fixed corpus of Java parser classes into
//! C++ header and implementation files.
//!
//! ## Architecture
//!
//! - **parser**: lexical analysis and parsing of the accepted Java subset
//!   into a compilation-unit AST
//! - **translate**: the core: symbol tables, target-type mapping, the
//!   label pre-pass, the target-language policy, and the two-mode emitter
//! - **driver**: manifest-ordered batch orchestration and file output
//! - **ast**: the compilation-unit tree the passes walk
//!
//! ## Translation flow
//!
//! ```text
//! Java source → Parser → CompilationUnit → Label pre-pass → Emitter (declaration mode) → .h
//!                                        → Label pre-pass → Emitter (definition mode)  → .cpp
//! ```
//!
//! The declaration pass for every manifest class runs before the definition
//! pass for any class, so constants and member types registered during
//! header emission are visible to all cross-class references in bodies.

pub mod ast;
pub mod config;
pub mod driver;
pub mod error;
pub mod parser;
pub mod translate;

pub use config::Config;
pub use error::{Error, Result};
pub use translate::Translator;

/// Translate one class's source to header text, with a fresh translator.
///
/// Single-unit convenience for tests and tooling; batch runs share one
/// `Translator` across the manifest instead.
pub fn translate_header(source: &str) -> Result<String> {
    let unit = parser::parse_java(source)?;
    Translator::new().header(&unit)
}

/// Translate one class's source to both header and implementation text,
/// sharing one symbol table across the two passes.
pub fn translate_unit(source: &str) -> Result<(String, String)> {
    let unit = parser::parse_java(source)?;
    let mut translator = Translator::new();
    let header = translator.header(&unit)?;
    let body = translator.body(&unit)?;
    Ok((header, body))
}

/// Run the full manifest: parse, translate, and write every generated file.
pub fn run_manifest(config: &Config) -> Result<driver::RunSummary> {
    driver::run(config)
}
