use j2cpp::parser::parse_java;
use j2cpp::{translate_unit, Error, Translator};

#[test]
fn referenced_labels_become_gotos_with_end_companions() {
    let source = r#"
public class Tokenizer {
    public void run() {
        stateloop: for (;;) {
            if (done()) {
                break stateloop;
            }
            continue stateloop;
        }
    }

    private boolean done() {
        return true;
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(body.contains("stateloop: for (; ; ) {"));
    assert!(body.contains("goto stateloop_end;"));
    assert!(body.contains("goto stateloop;"));
    assert!(body.contains("stateloop_end: ;"));
}

#[test]
fn unreferenced_labels_downgrade_to_plain_loops() {
    let source = r#"
public class Tokenizer {
    public void run() {
        unused: for (;;) {
            if (done()) {
                return;
            }
        }
    }

    private boolean done() {
        return true;
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(!body.contains("unused:"));
    assert!(!body.contains("unused_end"));
    assert!(body.contains("for (; ; ) {"));
}

#[test]
fn continue_to_a_bare_for_emits_a_restart_goto() {
    let source = r#"
public class Tokenizer {
    public void run() {
        bare: for (;;) {
            if (skip()) {
                continue bare;
            }
            return;
        }
    }

    private boolean skip() {
        return false;
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(body.contains("bare: for (; ; ) {"));
    assert!(body.contains("goto bare;"));
}

#[test]
fn continue_to_a_clause_bearing_for_is_fatal() {
    let source = r#"
public class Tokenizer {
    public void run() {
        counted: for (int i = 0; i < 10; i++) {
            if (skip(i)) {
                continue counted;
            }
        }
    }

    private boolean skip(int i) {
        return false;
    }
}
"#;
    let unit = parse_java(source).expect("parse");
    let mut translator = Translator::new();
    translator.header(&unit).expect("header");
    let err = translator.body(&unit).expect_err("should fail");
    assert!(matches!(err, Error::Unsupported { .. }));
}

#[test]
fn break_to_a_clause_bearing_for_is_fine() {
    let source = r#"
public class Tokenizer {
    public void run() {
        counted: for (int i = 0; i < 10; i++) {
            if (skip(i)) {
                break counted;
            }
        }
    }

    private boolean skip(int i) {
        return false;
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(body.contains("counted: for (PRInt32 i = 0; i < 10; i++) {"));
    assert!(body.contains("goto counted_end;"));
    assert!(body.contains("counted_end: ;"));
}

#[test]
fn labels_on_non_for_statements_are_fatal() {
    let source = r#"
public class Tokenizer {
    public void run() {
        spin: while (true) {
            break spin;
        }
    }
}
"#;
    let unit = parse_java(source).expect("parse");
    let mut translator = Translator::new();
    translator.header(&unit).expect("header");
    let err = translator.body(&unit).expect_err("should fail");
    assert!(matches!(err, Error::Unsupported { .. }));
}
