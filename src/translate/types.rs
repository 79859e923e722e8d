//! Target-type model: the value type every type-bearing rule trades in, and
//! the mapping from Java type nodes plus marker annotations onto it.

use crate::ast::{has_annotation, Annotation, TypeRef};
use crate::error::{Error, Result};

use super::policy::TargetPolicy;

/// Storage qualifier of a target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Plain value, including handle spellings that carry their own `*`.
    Value,
    /// Borrowed pointer added by the generic class-reference rule.
    Pointer,
    /// Heap allocation the translated code is responsible for releasing.
    Owned,
}

/// A target-language type. Structural equality only; two equal values are
/// interchangeable everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CppType {
    pub name: String,
    pub array_arity: usize,
    pub no_length: bool,
    pub storage: Storage,
}

impl CppType {
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            array_arity: 0,
            no_length: false,
            storage: Storage::Value,
        }
    }

    pub fn is_array(&self) -> bool {
        self.array_arity > 0
    }

    /// True when a member of this type is reached through `->`.
    pub fn is_pointer(&self) -> bool {
        !self.is_array()
            && (matches!(self.storage, Storage::Pointer | Storage::Owned)
                || self.name.ends_with('*'))
    }

    /// Render the full type spelling for a declaration.
    pub fn render(&self, policy: &dyn TargetPolicy) -> String {
        let mut core = self.name.clone();
        if matches!(self.storage, Storage::Pointer | Storage::Owned) {
            core.push('*');
        }
        if self.no_length {
            for _ in 0..self.array_arity {
                core.push('*');
            }
            return core;
        }
        for _ in 0..self.array_arity {
            core = format!("{}<{},{}>", policy.array_template(), core, policy.int_type());
        }
        core
    }

    /// The element type of an array type.
    pub fn element(&self) -> CppType {
        CppType {
            name: self.name.clone(),
            array_arity: self.array_arity.saturating_sub(1),
            no_length: if self.array_arity <= 1 { false } else { self.no_length },
            storage: self.storage,
        }
    }
}

/// Map a Java type reference plus the marker annotations in scope at the
/// same declaration onto a target type.
///
/// `suppress_pointer` disables the pointer qualifier of the generic
/// class-reference rule; the surrounding context (a `new` expression) adds
/// the pointer itself.
pub fn map_type(
    type_ref: &TypeRef,
    annotations: &[Annotation],
    suppress_pointer: bool,
    policy: &dyn TargetPolicy,
) -> Result<CppType> {
    let mut mapped = map_base_type(&type_ref.name, annotations, suppress_pointer, policy)?;
    if type_ref.array_dims > 0 {
        mapped.array_arity = type_ref.array_dims;
        mapped.no_length = has_annotation(annotations, "NoLength");
        if mapped.no_length && mapped.array_arity > 1 {
            return Err(Error::unsupported(format!(
                "multi-dimensional raw array {}{}",
                type_ref.name,
                "[]".repeat(type_ref.array_dims)
            )));
        }
    }
    Ok(mapped)
}

fn map_base_type(
    name: &str,
    annotations: &[Annotation],
    suppress_pointer: bool,
    policy: &dyn TargetPolicy,
) -> Result<CppType> {
    match name {
        "boolean" => return Ok(CppType::value(policy.boolean_type())),
        "char" => return Ok(CppType::value(policy.char_type())),
        "int" => return Ok(CppType::value(policy.int_type())),
        "byte" | "short" | "long" | "float" | "double" | "void" => {
            return Err(Error::unsupported(format!("primitive type {}", name)));
        }
        _ => {}
    }

    if name == "String" {
        // Marker annotations carve four distinguished string flavors out of
        // the generic owned string.
        let spelling = if has_annotation(annotations, "Local") {
            policy.local_type()
        } else if has_annotation(annotations, "Prefix") {
            policy.prefix_type()
        } else if has_annotation(annotations, "NsUri") {
            policy.ns_uri_type()
        } else if has_annotation(annotations, "Literal") {
            policy.literal_type()
        } else {
            return Ok(CppType {
                name: policy.string_type().to_string(),
                array_arity: 0,
                no_length: false,
                storage: Storage::Owned,
            });
        };
        return Ok(CppType::value(spelling));
    }

    if name == "T" || name == "Object" {
        return Ok(CppType::value(policy.node_type()));
    }

    if let Some(substitute) = policy.interface_substitute(name) {
        return Ok(CppType::value(substitute));
    }

    Ok(CppType {
        name: format!("{}{}", policy.class_prefix(), name),
        array_arity: 0,
        no_length: false,
        storage: if suppress_pointer {
            Storage::Value
        } else {
            Storage::Pointer
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Location, Span};
    use crate::translate::policy::MozCpp;

    fn span() -> Span {
        Span::new(Location::new(1, 1, 0), Location::new(1, 1, 0))
    }

    fn type_ref(name: &str, dims: usize) -> TypeRef {
        TypeRef {
            name: name.to_string(),
            array_dims: dims,
            span: span(),
        }
    }

    fn marker(name: &str) -> Annotation {
        Annotation {
            name: name.to_string(),
            span: span(),
        }
    }

    #[test]
    fn primitives_map_through_the_fixed_table() {
        let policy = MozCpp;
        let mapped = map_type(&type_ref("int", 0), &[], false, &policy).unwrap();
        assert_eq!(mapped.render(&policy), "PRInt32");
        assert!(map_type(&type_ref("double", 0), &[], false, &policy).is_err());
        assert!(map_type(&type_ref("long", 0), &[], false, &policy).is_err());
    }

    #[test]
    fn string_markers_pick_distinguished_spellings() {
        let policy = MozCpp;
        let local = map_type(&type_ref("String", 0), &[marker("Local")], false, &policy).unwrap();
        assert_eq!(local.render(&policy), "nsIAtom*");
        let ns = map_type(&type_ref("String", 0), &[marker("NsUri")], false, &policy).unwrap();
        assert_eq!(ns.render(&policy), "PRInt32");
        let plain = map_type(&type_ref("String", 0), &[], false, &policy).unwrap();
        assert_eq!(plain.storage, Storage::Owned);
        assert_eq!(plain.render(&policy), "nsString*");
    }

    #[test]
    fn t_and_object_are_the_node_handle() {
        let policy = MozCpp;
        for name in ["T", "Object"] {
            let mapped = map_type(&type_ref(name, 0), &[], false, &policy).unwrap();
            assert_eq!(mapped.render(&policy), "nsIContent**");
        }
    }

    #[test]
    fn class_references_take_the_prefix_and_pointer() {
        let policy = MozCpp;
        let mapped = map_type(&type_ref("ElementName", 0), &[], false, &policy).unwrap();
        assert_eq!(mapped.render(&policy), "nsHtml5ElementName*");
        let suppressed = map_type(&type_ref("ElementName", 0), &[], true, &policy).unwrap();
        assert_eq!(suppressed.render(&policy), "nsHtml5ElementName");
    }

    #[test]
    fn bounded_arrays_nest_the_container_per_dimension() {
        let policy = MozCpp;
        let one = map_type(&type_ref("char", 1), &[], false, &policy).unwrap();
        assert_eq!(one.render(&policy), "jArray<PRUnichar,PRInt32>");
        let two = map_type(&type_ref("int", 2), &[], false, &policy).unwrap();
        assert_eq!(two.render(&policy), "jArray<jArray<PRInt32,PRInt32>,PRInt32>");
    }

    #[test]
    fn no_length_arrays_degrade_to_raw_pointers() {
        let policy = MozCpp;
        let raw = map_type(&type_ref("char", 1), &[marker("NoLength")], false, &policy).unwrap();
        assert_eq!(raw.render(&policy), "PRUnichar*");
        assert!(raw.no_length);
        assert!(map_type(&type_ref("char", 2), &[marker("NoLength")], false, &policy).is_err());
    }
}
