//! Abstract syntax tree for the accepted Java subset.
//!
//! One `CompilationUnit` per source file. The tree is immutable after
//! parsing; every pass that needs derived information keeps it in sidecar
//! tables keyed by name rather than mutating nodes. Dispatch over node kinds
//! is by `match` on the `Stmt`/`Expr` sum types so the compiler checks
//! exhaustiveness for every pass.

mod nodes;

pub use nodes::*;

/// Source location information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Location {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

/// Span of source code (start and end locations)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }
}

/// Root node for one parsed Java source file
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub package: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
    pub span: Span,
}

impl CompilationUnit {
    /// The primary class of the unit, if the unit declares one.
    ///
    /// The translator processes one class per file; interfaces contribute
    /// type substitutions but produce no output of their own.
    pub fn primary_class(&self) -> Option<&ClassDecl> {
        self.types.iter().find_map(|t| match t {
            TypeDecl::Class(c) => Some(c),
            TypeDecl::Interface(_) => None,
        })
    }
}
