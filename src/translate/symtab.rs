//! Cross-class bookkeeping: declared member types, generated defines, and
//! the atom-interning table.
//!
//! All three tables are populated incrementally in manifest order and
//! queried by later emission. A miss is never an error here; each call site
//! has its own documented degraded path.

use std::collections::HashMap;

use super::policy::TargetPolicy;
use super::types::CppType;

/// Registry of member types discovered while visiting classes.
///
/// Classes referencing another class's members must be processed after that
/// class, or lookups come back empty and the caller falls back to the
/// generic form.
#[derive(Debug, Default)]
pub struct SymbolTable {
    field_types: HashMap<(String, String), CppType>,
    method_returns: HashMap<(String, String), CppType>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_field_type(&mut self, class: &str, name: &str, ty: CppType) {
        self.field_types
            .insert((class.to_string(), name.to_string()), ty);
    }

    pub fn put_method_return(&mut self, class: &str, name: &str, ty: CppType) {
        self.method_returns
            .insert((class.to_string(), name.to_string()), ty);
    }

    pub fn get_field_type(&self, class: &str, name: &str) -> Option<&CppType> {
        self.field_types
            .get(&(class.to_string(), name.to_string()))
    }

    pub fn get_method_return(&self, class: &str, name: &str) -> Option<&CppType> {
        self.method_returns
            .get(&(class.to_string(), name.to_string()))
    }
}

/// Map from `"Class.CONSTANT"` to the generated long-form macro name.
///
/// Populated when a `static final int` field is seen during header emission;
/// consulted whenever any expression references `Class.CONSTANT`. The driver
/// runs every header pass before any body pass so a constant is registered
/// before its cross-class uses resolve.
#[derive(Debug, Default)]
pub struct DefineRegistry {
    defines: HashMap<String, String>,
}

impl DefineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `Class.CONSTANT`, generating and returning the macro name.
    pub fn register(&mut self, policy: &dyn TargetPolicy, class: &str, constant: &str) -> String {
        let macro_name = define_name(policy, class, constant);
        self.defines
            .insert(format!("{}.{}", class, constant), macro_name.clone());
        macro_name
    }

    pub fn get(&self, class: &str, constant: &str) -> Option<&str> {
        self.defines
            .get(&format!("{}.{}", class, constant))
            .map(|s| s.as_str())
    }
}

/// Long-form macro name for a class constant, e.g.
/// `NS_HTML5_ATTRIBUTE_NAME_HTML` for `AttributeName.HTML`.
pub fn define_name(policy: &dyn TargetPolicy, class: &str, constant: &str) -> String {
    format!(
        "{}_{}_{}",
        upper_snake(policy.class_prefix()),
        upper_snake(class),
        constant
    )
}

fn upper_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            prev_lower = false;
        } else if ch.is_ascii_lowercase() {
            prev_lower = true;
        }
        out.push(ch.to_ascii_uppercase());
    }
    out
}

/// Interning table mapping string literals to generated atom names.
///
/// Insertion order is preserved so the side-channel atom list is stable
/// across runs over the same corpus.
#[derive(Debug, Default)]
pub struct AtomTable {
    by_literal: HashMap<String, String>,
    taken: HashMap<String, String>,
    order: Vec<String>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atom name for a literal; the same literal always yields the same name.
    pub fn intern(&mut self, literal: &str) -> String {
        if let Some(existing) = self.by_literal.get(literal) {
            return existing.clone();
        }
        let mut name = atom_name(literal);
        if self.taken.contains_key(&name) {
            let mut counter = 2usize;
            loop {
                let candidate = format!("{}_{}", name, counter);
                if !self.taken.contains_key(&candidate) {
                    name = candidate;
                    break;
                }
                counter += 1;
            }
        }
        self.by_literal.insert(literal.to_string(), name.clone());
        self.taken.insert(name.clone(), literal.to_string());
        self.order.push(literal.to_string());
        name
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(atom, literal)` pairs in first-interned order.
    pub fn records(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order.iter().map(move |literal| {
            (
                self.by_literal[literal].as_str(),
                literal.as_str(),
            )
        })
    }
}

/// Identifier-safe atom name for a literal string value.
fn atom_name(literal: &str) -> String {
    if literal.is_empty() {
        return "emptystring".to_string();
    }
    let mut name = String::with_capacity(literal.len());
    for ch in literal.chars() {
        if ch.is_ascii_alphanumeric() {
            name.push(ch);
        } else {
            name.push('_');
        }
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}
