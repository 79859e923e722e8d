//! The translator core: symbol bookkeeping, target policy, label pre-pass,
//! and the two-mode emitter.
//!
//! One `Translator` value lives for a whole batch run. Its tables are
//! populated incrementally as classes are visited, so translation order
//! matters: the driver runs every declaration pass before any definition
//! pass, and classes referencing another class's members must come after
//! that class in the manifest.

pub mod emit;
pub mod labels;
pub mod locals;
pub mod policy;
pub mod symtab;
pub mod types;

pub use emit::{CppEmitter, Cx, Mode};
pub use locals::LocalSymbolTable;
pub use policy::{MozCpp, TargetPolicy};
pub use symtab::{AtomTable, DefineRegistry, SymbolTable};
pub use types::{map_type, CppType, Storage};

use crate::ast::CompilationUnit;
use crate::error::Result;

pub struct Translator {
    policy: Box<dyn TargetPolicy>,
    symtab: SymbolTable,
    defines: DefineRegistry,
    atoms: AtomTable,
}

impl Translator {
    pub fn new() -> Self {
        Self::with_policy(Box::new(MozCpp))
    }

    pub fn with_policy(policy: Box<dyn TargetPolicy>) -> Self {
        Self {
            policy,
            symtab: SymbolTable::new(),
            defines: DefineRegistry::new(),
            atoms: AtomTable::new(),
        }
    }

    pub fn policy(&self) -> &dyn TargetPolicy {
        self.policy.as_ref()
    }

    /// Emit the declaration (header) text for one unit.
    pub fn header(&mut self, unit: &CompilationUnit) -> Result<String> {
        self.emit(unit, Mode::Declaration)
    }

    /// Emit the definition (implementation) text for one unit.
    pub fn body(&mut self, unit: &CompilationUnit) -> Result<String> {
        self.emit(unit, Mode::Definition)
    }

    fn emit(&mut self, unit: &CompilationUnit, mode: Mode) -> Result<String> {
        // The pre-pass must finish before emission starts: the emitter's
        // label decisions depend on breaks and continues seen later in the
        // same method body.
        let labels = labels::scan_unit(unit);
        let emitter = CppEmitter::new(
            self.policy.as_ref(),
            &mut self.symtab,
            &mut self.defines,
            &mut self.atoms,
            &labels,
            mode,
        );
        emitter.emit_unit(unit)
    }

    /// Interned `(atom, literal)` records, in first-interned order.
    pub fn atom_records(&self) -> impl Iterator<Item = (&str, &str)> {
        self.atoms.records()
    }

    pub fn has_atoms(&self) -> bool {
        !self.atoms.is_empty()
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}
