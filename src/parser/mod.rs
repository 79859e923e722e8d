//! Java front end: lexical analysis and parsing into a compilation unit.
//!
//! The front end accepts exactly the Java subset the translator knows how to
//! lower. Parse errors are fatal per file; there is no recovery.

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::ParseError;
pub use lexer::{Lexer, LexicalToken, Token};
pub use parser::Parser;

use crate::ast::CompilationUnit;
use crate::error::Result;

/// Parse one Java source file into a compilation unit.
pub fn parse_java(source: &str) -> Result<CompilationUnit> {
    Parser::new(source)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ClassMember, Stmt, TypeDecl};

    #[test]
    fn parse_simple_class() {
        let source = r#"
package nu.validator.htmlparser.impl;

public class Tokenizer {
    private int state;

    public Tokenizer() {
        this.state = 0;
    }

    public int getState() {
        return state;
    }
}
"#;
        let unit = parse_java(source).expect("Failed to parse");
        assert_eq!(unit.package.as_deref(), Some("nu.validator.htmlparser.impl"));
        let class = unit.primary_class().expect("no class");
        assert_eq!(class.name, "Tokenizer");
        assert_eq!(class.members.len(), 3);
    }

    #[test]
    fn parse_annotated_field_and_imports() {
        let source = r#"
package nu.validator.htmlparser.impl;

import nu.validator.htmlparser.annotation.NoLength;

public class UTF16Buffer {
    private final @NoLength char[] buffer;
    private int start;
    private int end;
}
"#;
        let unit = parse_java(source).expect("Failed to parse");
        assert_eq!(unit.imports.len(), 1);
        let class = unit.primary_class().expect("no class");
        match &class.members[0] {
            ClassMember::Field(f) => {
                assert_eq!(f.name, "buffer");
                assert_eq!(f.type_ref.array_dims, 1);
                assert!(f.annotations.iter().any(|a| a.name == "NoLength"));
            }
            other => panic!("expected field, got {:?}", other),
        }
    }

    #[test]
    fn parse_multi_declarator_field_splits() {
        let source = r#"
public class C {
    private int a, b, c;
}
"#;
        let unit = parse_java(source).expect("Failed to parse");
        let class = unit.primary_class().expect("no class");
        assert_eq!(class.members.len(), 3);
    }

    #[test]
    fn parse_labeled_for_and_switch() {
        let source = r#"
public class C {
    void run(int c) {
        stateloop: for (;;) {
            switch (c) {
                case 1:
                    break stateloop;
                default:
                    continue stateloop;
            }
        }
    }
}
"#;
        let unit = parse_java(source).expect("Failed to parse");
        let class = unit.primary_class().expect("no class");
        let method = match &class.members[0] {
            ClassMember::Method(m) => m,
            other => panic!("expected method, got {:?}", other),
        };
        let body = method.body.as_ref().expect("no body");
        assert!(matches!(body.statements[0], Stmt::Labeled(_)));
    }

    #[test]
    fn parse_interface() {
        let source = r#"
public interface TokenHandler {
    void startTokenization(Tokenizer self);
    void eof();
}
"#;
        let unit = parse_java(source).expect("Failed to parse");
        match &unit.types[0] {
            TypeDecl::Interface(i) => {
                assert_eq!(i.name, "TokenHandler");
                assert_eq!(i.members.len(), 2);
            }
            other => panic!("expected interface, got {:?}", other),
        }
    }

    #[test]
    fn reject_try_statement() {
        let source = r#"
public class C {
    void run() {
        try {
            step();
        } finally {
            cleanup();
        }
    }
}
"#;
        assert!(parse_java(source).is_err());
    }

    #[test]
    fn reject_enum_declaration() {
        let source = "public enum Mode { A, B }";
        assert!(parse_java(source).is_err());
    }
}
