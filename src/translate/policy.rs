//! Target-language policy: every "what does the target call this" decision.
//!
//! The tree-walking rules in the emitter never spell out a C++ name
//! themselves; they ask the policy. Retargeting the translator to a different
//! output dialect means swapping this one component.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Lexical choices of the output dialect.
pub trait TargetPolicy {
    /// Prefix applied to every translated class name.
    fn class_prefix(&self) -> &str;

    // Primitive spellings
    fn boolean_type(&self) -> &str;
    fn char_type(&self) -> &str;
    fn int_type(&self) -> &str;

    // Literal spellings
    fn true_literal(&self) -> &str;
    fn false_literal(&self) -> &str;
    fn null_literal(&self) -> &str;
    fn max_integer(&self) -> &str;

    // Distinguished string specializations
    fn local_type(&self) -> &str;
    fn prefix_type(&self) -> &str;
    fn ns_uri_type(&self) -> &str;
    fn literal_type(&self) -> &str;
    fn string_type(&self) -> &str;

    /// The homogeneous node handle standing in for `T` and `Object`.
    fn node_type(&self) -> &str;

    /// Fixed concrete handle for one of the closed set of interface names.
    fn interface_substitute(&self, name: &str) -> Option<&str>;

    /// Name of the bounded array container template.
    fn array_template(&self) -> &str;

    /// Namespace-id constant for one of the recognized namespace URIs.
    fn namespace_constant(&self, uri: &str) -> Option<&str>;

    /// The "no namespace" constant and the class whose empty string literals
    /// mean it.
    fn no_namespace_constant(&self) -> &str;
    fn no_namespace_class(&self) -> &str;

    /// Spelling of a reference to an interned atom.
    fn atom_ref(&self, atom: &str) -> String;

    /// One side-channel record declaring an interned atom.
    fn atom_record(&self, atom: &str, literal: &str) -> String;

    /// Tracing statements opening every constructor/destructor body.
    fn constructor_trace(&self, class: &str) -> String;
    fn destructor_trace(&self, class: &str) -> String;

    /// Classes whose generated files pull in a hand-written supplement.
    fn needs_supplement(&self, class: &str) -> bool;

    /// Include lines for the generated header of `class`.
    fn header_includes(&self, class: &str) -> Vec<String>;

    /// Include lines for the generated implementation file of `class`.
    fn body_includes(&self, class: &str) -> Vec<String>;
}

/// Gecko-flavored C++ output.
pub struct MozCpp;

static NAMESPACE_CONSTANTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert("http://www.w3.org/1999/xhtml", "kNameSpaceID_XHTML");
    map.insert("http://www.w3.org/2000/svg", "kNameSpaceID_SVG");
    map.insert("http://www.w3.org/2000/xmlns/", "kNameSpaceID_XMLNS");
    map.insert("http://www.w3.org/XML/1998/namespace", "kNameSpaceID_XML");
    map.insert("http://www.w3.org/1999/xlink", "kNameSpaceID_XLink");
    map.insert("http://www.w3.org/1998/Math/MathML", "kNameSpaceID_MathML");
    map
});

static INTERFACE_SUBSTITUTES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert("TokenHandler", "nsHtml5TreeBuilder*");
    map.insert("EncodingDeclarationHandler", "nsHtml5StreamParser*");
    map.insert("DocumentModeHandler", "nsHtml5TreeBuilder*");
    map.insert("DocumentMode", "nsHtml5DocumentMode");
    map
});

/// Classes whose generated code is paired with a hand-written part.
const SUPPLEMENTED_CLASSES: &[&str] = &["Tokenizer", "TreeBuilder"];

/// Headers every generated header pulls in, before per-class extras.
const COMMON_HEADER_INCLUDES: &[&str] = &[
    "prtypes.h",
    "nsIAtom.h",
    "nsString.h",
    "jArray.h",
    "nsHtml5AtomTable.h",
    "nsHtml5NamedCharacters.h",
];

static EXTRA_HEADER_INCLUDES: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        let mut map: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        map.insert(
            "Tokenizer",
            &["nsHtml5TreeBuilder.h", "nsHtml5UTF16Buffer.h"] as &[&str],
        );
        map.insert(
            "TreeBuilder",
            &["nsHtml5StackNode.h", "nsHtml5DocumentMode.h"] as &[&str],
        );
        map.insert("StackNode", &["nsHtml5ElementName.h"] as &[&str]);
        map.insert("MetaScanner", &["nsHtml5ByteReadable.h"] as &[&str]);
        map
    });

impl TargetPolicy for MozCpp {
    fn class_prefix(&self) -> &str {
        "nsHtml5"
    }

    fn boolean_type(&self) -> &str {
        "PRBool"
    }

    fn char_type(&self) -> &str {
        "PRUnichar"
    }

    fn int_type(&self) -> &str {
        "PRInt32"
    }

    fn true_literal(&self) -> &str {
        "PR_TRUE"
    }

    fn false_literal(&self) -> &str {
        "PR_FALSE"
    }

    fn null_literal(&self) -> &str {
        "nsnull"
    }

    fn max_integer(&self) -> &str {
        "PR_INT32_MAX"
    }

    fn local_type(&self) -> &str {
        "nsIAtom*"
    }

    fn prefix_type(&self) -> &str {
        "nsIAtom*"
    }

    fn ns_uri_type(&self) -> &str {
        "PRInt32"
    }

    fn literal_type(&self) -> &str {
        "const char*"
    }

    fn string_type(&self) -> &str {
        "nsString"
    }

    fn node_type(&self) -> &str {
        "nsIContent**"
    }

    fn interface_substitute(&self, name: &str) -> Option<&str> {
        INTERFACE_SUBSTITUTES.get(name).copied()
    }

    fn array_template(&self) -> &str {
        "jArray"
    }

    fn namespace_constant(&self, uri: &str) -> Option<&str> {
        NAMESPACE_CONSTANTS.get(uri).copied()
    }

    fn no_namespace_constant(&self) -> &str {
        "kNameSpaceID_None"
    }

    fn no_namespace_class(&self) -> &str {
        "AttributeName"
    }

    fn atom_ref(&self, atom: &str) -> String {
        format!("nsHtml5Atoms::{}", atom)
    }

    fn atom_record(&self, atom: &str, literal: &str) -> String {
        format!("HTML5_ATOM({}, \"{}\")", atom, literal)
    }

    fn constructor_trace(&self, class: &str) -> String {
        format!("MOZ_COUNT_CTOR({}{});", self.class_prefix(), class)
    }

    fn destructor_trace(&self, class: &str) -> String {
        format!("MOZ_COUNT_DTOR({}{});", self.class_prefix(), class)
    }

    fn needs_supplement(&self, class: &str) -> bool {
        SUPPLEMENTED_CLASSES.contains(&class)
    }

    fn header_includes(&self, class: &str) -> Vec<String> {
        let mut includes: Vec<String> = COMMON_HEADER_INCLUDES
            .iter()
            .map(|h| h.to_string())
            .collect();
        if let Some(extra) = EXTRA_HEADER_INCLUDES.get(class) {
            includes.extend(extra.iter().map(|h| h.to_string()));
        }
        includes
    }

    fn body_includes(&self, class: &str) -> Vec<String> {
        vec![format!("{}{}.h", self.class_prefix(), class)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_constants_cover_the_six_uris() {
        let policy = MozCpp;
        for uri in [
            "http://www.w3.org/1999/xhtml",
            "http://www.w3.org/2000/svg",
            "http://www.w3.org/2000/xmlns/",
            "http://www.w3.org/XML/1998/namespace",
            "http://www.w3.org/1999/xlink",
            "http://www.w3.org/1998/Math/MathML",
        ] {
            assert!(policy.namespace_constant(uri).is_some(), "missing {}", uri);
        }
        assert!(policy.namespace_constant("http://example.com/").is_none());
    }

    #[test]
    fn interface_substitutes_are_closed() {
        let policy = MozCpp;
        assert_eq!(
            policy.interface_substitute("TokenHandler"),
            Some("nsHtml5TreeBuilder*")
        );
        assert_eq!(policy.interface_substitute("Runnable"), None);
    }
}
