//! Label pre-pass: one read-only walk over a compilation unit before any
//! emission.
//!
//! The emitter decides at a labeled loop whether to print real labels, but
//! the `break`/`continue` that justifies them may appear arbitrarily later in
//! the same method body, so the whole unit is scanned up front.

use std::collections::{HashMap, HashSet};

use crate::ast::*;

/// What the pre-pass learned about the labels of one unit.
#[derive(Debug, Default)]
pub struct LabelInfo {
    /// Labels actually targeted by some `break` or `continue`.
    referenced: HashSet<String>,
    /// For each label on a `for` loop, whether that loop carries any
    /// init/condition/update clause.
    for_clauses: HashMap<String, bool>,
}

impl LabelInfo {
    pub fn is_referenced(&self, label: &str) -> bool {
        self.referenced.contains(label)
    }

    /// `Some(true)` when the labeled loop is a `for` with clauses, the shape
    /// a labeled `continue` cannot be lowered for.
    pub fn for_has_clauses(&self, label: &str) -> Option<bool> {
        self.for_clauses.get(label).copied()
    }
}

/// Scan a unit and collect its label facts.
pub fn scan_unit(unit: &CompilationUnit) -> LabelInfo {
    let mut info = LabelInfo::default();
    for decl in &unit.types {
        let members = match decl {
            TypeDecl::Class(c) => &c.members,
            TypeDecl::Interface(i) => &i.members,
        };
        for member in members {
            match member {
                ClassMember::Method(m) => {
                    if let Some(body) = &m.body {
                        scan_block(body, &mut info);
                    }
                }
                ClassMember::Constructor(c) => scan_block(&c.body, &mut info),
                ClassMember::Field(_) => {}
            }
        }
    }
    info
}

fn scan_block(block: &Block, info: &mut LabelInfo) {
    for stmt in &block.statements {
        scan_stmt(stmt, info);
    }
}

fn scan_stmt(stmt: &Stmt, info: &mut LabelInfo) {
    match stmt {
        Stmt::Labeled(labeled) => {
            if let Stmt::For(for_stmt) = labeled.statement.as_ref() {
                info.for_clauses
                    .insert(labeled.label.clone(), for_stmt.has_clauses());
            }
            scan_stmt(&labeled.statement, info);
        }
        Stmt::Break(b) => {
            if let Some(label) = &b.label {
                info.referenced.insert(label.clone());
            }
        }
        Stmt::Continue(c) => {
            if let Some(label) = &c.label {
                info.referenced.insert(label.clone());
            }
        }
        Stmt::If(if_stmt) => {
            scan_stmt(&if_stmt.then_branch, info);
            if let Some(else_branch) = &if_stmt.else_branch {
                scan_stmt(else_branch, info);
            }
        }
        Stmt::While(w) => scan_stmt(&w.body, info),
        Stmt::DoWhile(d) => scan_stmt(&d.body, info),
        Stmt::For(f) => {
            for init in &f.init {
                scan_stmt(init, info);
            }
            scan_stmt(&f.body, info);
        }
        Stmt::Switch(s) => {
            for case in &s.cases {
                for case_stmt in &case.statements {
                    scan_stmt(case_stmt, info);
                }
            }
        }
        Stmt::Block(b) => scan_block(b, info),
        Stmt::Expression(_)
        | Stmt::Declaration(_)
        | Stmt::Return(_)
        | Stmt::Empty => {}
    }
}
