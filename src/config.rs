//! Translator configuration: directories, manifests, side-channel toggles.

use std::path::PathBuf;

/// Declaration-file manifest, in translation order.
///
/// Order is load-bearing: the symbol table and define registry fill in as
/// classes are visited, so a class must come after every class whose members
/// it references. Declare-before-use across the whole manifest is a
/// precondition, not something the translator checks.
pub const HEADER_CLASSES: &[&str] = &[
    "UTF16Buffer",
    "AttributeName",
    "ElementName",
    "HtmlAttributes",
    "StackNode",
    "StateSnapshot",
    "MetaScanner",
    "Tokenizer",
    "TreeBuilder",
];

/// Definition-file manifest: the narrower subset of classes that get an
/// implementation file. Must stay a subset of `HEADER_CLASSES`.
pub const BODY_CLASSES: &[&str] = &[
    "UTF16Buffer",
    "AttributeName",
    "ElementName",
    "HtmlAttributes",
    "StackNode",
    "MetaScanner",
    "Tokenizer",
    "TreeBuilder",
];

/// Configuration for one batch run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one `<Class>.java` per manifest entry.
    pub src_dir: PathBuf,
    /// Directory the generated `.h`/`.cpp` files are written into.
    pub out_dir: PathBuf,
    /// Path of the atom side-channel file, if one should be written.
    pub atom_list: Option<PathBuf>,
    pub header_manifest: Vec<String>,
    pub body_manifest: Vec<String>,
}

impl Config {
    pub fn new(src_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            src_dir: src_dir.into(),
            out_dir: out_dir.into(),
            atom_list: None,
            header_manifest: HEADER_CLASSES.iter().map(|c| c.to_string()).collect(),
            body_manifest: BODY_CLASSES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_atom_list(mut self, path: impl Into<PathBuf>) -> Self {
        self.atom_list = Some(path.into());
        self
    }

    /// Replace both manifests, keeping the body manifest a subset.
    pub fn with_manifests(mut self, header: Vec<String>, body: Vec<String>) -> Self {
        self.header_manifest = header;
        self.body_manifest = body;
        self
    }
}
