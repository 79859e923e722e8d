use j2cpp::ast::{BinaryOp, ClassMember, Expr, Literal, Stmt};
use j2cpp::parser::parse_java;

fn first_method_body(source: &str) -> Vec<Stmt> {
    let unit = parse_java(source).expect("parse");
    let class = unit.primary_class().expect("class").clone();
    for member in class.members {
        if let ClassMember::Method(method) = member {
            if let Some(body) = method.body {
                return body.statements;
            }
        }
    }
    panic!("no method body");
}

#[test]
fn precedence_nests_shift_below_comparison() {
    let statements = first_method_body(
        r#"
public class C {
    boolean f(int c) {
        return (c << 2) > 0 && c != 5;
    }
}
"#,
    );
    match &statements[0] {
        Stmt::Return(ret) => {
            // Top node is &&, not one of its operands.
            assert!(matches!(ret.value.as_ref().unwrap(), Expr::Binary(b)
                if matches!(b.operator, BinaryOp::AndAnd)));
        }
        other => panic!("expected return, got {:?}", other),
    }
}

#[test]
fn casts_and_parenthesized_expressions_disambiguate() {
    let statements = first_method_body(
        r#"
public class C {
    int f(int c, int d) {
        int x = (char) c;
        int y = (c) + d;
        return x + y;
    }
}
"#,
    );
    match &statements[0] {
        Stmt::Declaration(decl) => {
            assert!(matches!(
                decl.declarators[0].initializer.as_ref().unwrap(),
                Expr::Cast(_)
            ));
        }
        other => panic!("expected declaration, got {:?}", other),
    }
    match &statements[1] {
        Stmt::Declaration(decl) => {
            assert!(matches!(
                decl.declarators[0].initializer.as_ref().unwrap(),
                Expr::Binary(_)
            ));
        }
        other => panic!("expected declaration, got {:?}", other),
    }
}

#[test]
fn char_and_string_escapes_unescape() {
    let statements = first_method_body(
        r#"
public class C {
    void f() {
        char c = '\n';
        char u = 'A';
        String s = "a\\b";
    }
}
"#,
    );
    match &statements[0] {
        Stmt::Declaration(decl) => match decl.declarators[0].initializer.as_ref().unwrap() {
            Expr::Literal(lit) => assert!(matches!(lit.value, Literal::Char('\n'))),
            other => panic!("expected literal, got {:?}", other),
        },
        other => panic!("expected declaration, got {:?}", other),
    }
    match &statements[1] {
        Stmt::Declaration(decl) => match decl.declarators[0].initializer.as_ref().unwrap() {
            Expr::Literal(lit) => assert!(matches!(lit.value, Literal::Char('A'))),
            other => panic!("expected literal, got {:?}", other),
        },
        other => panic!("expected declaration, got {:?}", other),
    }
    match &statements[2] {
        Stmt::Declaration(decl) => match decl.declarators[0].initializer.as_ref().unwrap() {
            Expr::Literal(lit) => match &lit.value {
                Literal::String(s) => assert_eq!(s, "a\\b"),
                other => panic!("expected string, got {:?}", other),
            },
            other => panic!("expected literal, got {:?}", other),
        },
        other => panic!("expected declaration, got {:?}", other),
    }
}

#[test]
fn hex_literals_keep_their_spelling() {
    let statements = first_method_body(
        r#"
public class C {
    int f() {
        return 0x1F00;
    }
}
"#,
    );
    match &statements[0] {
        Stmt::Return(ret) => match ret.value.as_ref().unwrap() {
            Expr::Literal(lit) => match &lit.value {
                Literal::HexInt(spelling) => assert_eq!(spelling, "0x1F00"),
                other => panic!("expected hex literal, got {:?}", other),
            },
            other => panic!("expected literal, got {:?}", other),
        },
        other => panic!("expected return, got {:?}", other),
    }
}

#[test]
fn do_while_and_switch_parse() {
    let statements = first_method_body(
        r#"
public class C {
    void f(int c) {
        do {
            c--;
        } while (c > 0);
        switch (c) {
            case 0:
            case 1:
                c++;
                break;
            default:
                c = 2;
        }
    }
}
"#,
    );
    assert!(matches!(statements[0], Stmt::DoWhile(_)));
    match &statements[1] {
        Stmt::Switch(switch_stmt) => {
            assert_eq!(switch_stmt.cases.len(), 2);
            assert_eq!(switch_stmt.cases[0].labels.len(), 2);
            assert!(switch_stmt.cases[1].labels.is_empty());
        }
        other => panic!("expected switch, got {:?}", other),
    }
}

#[test]
fn comments_and_javadoc_are_trivia() {
    let source = r#"
/*
 * Leading license block.
 */
package p;

public class C {
    /**
     * Javadoc with <code>markup</code> and * stars.
     */
    public void f() {
        // line comment
        step(); /* trailing */
    }

    private void step() {
    }
}
"#;
    let unit = parse_java(source).expect("parse");
    assert_eq!(unit.package.as_deref(), Some("p"));
}

#[test]
fn array_creation_shapes_parse() {
    let statements = first_method_body(
        r#"
public class C {
    void f(int n) {
        char[] buf = new char[n];
        int[][] grid = new int[n][n];
    }
}
"#,
    );
    match &statements[0] {
        Stmt::Declaration(decl) => match decl.declarators[0].initializer.as_ref().unwrap() {
            Expr::NewArray(new_array) => {
                assert_eq!(new_array.dims.len(), 1);
                assert_eq!(new_array.extra_dims, 0);
            }
            other => panic!("expected array creation, got {:?}", other),
        },
        other => panic!("expected declaration, got {:?}", other),
    }
    match &statements[1] {
        Stmt::Declaration(decl) => match decl.declarators[0].initializer.as_ref().unwrap() {
            Expr::NewArray(new_array) => assert_eq!(new_array.dims.len(), 2),
            other => panic!("expected array creation, got {:?}", other),
        },
        other => panic!("expected declaration, got {:?}", other),
    }
}

#[test]
fn constructs_outside_the_subset_are_rejected() {
    assert!(parse_java("public class C { void f() { super.f(); } }").is_err());
    assert!(
        parse_java("public class C { void f(Object o) { boolean b = o instanceof C; } }").is_err()
    );
    assert!(parse_java("public class C { void f() { throw new C(); } }").is_err());
    assert!(parse_java("public class C { class D { } }").is_err());
}
