use j2cpp::{translate_unit, Error};

#[test]
fn primitive_array_statics_use_the_two_step_lowering() {
    let source = r#"
public class Tokenizer {
    private static final int[] CASES = { 1, 2, 3 };
}
"#;
    let (header, body) = translate_unit(source).expect("translate");
    assert!(header.contains("static jArray<PRInt32,PRInt32> CASES;"));
    // Raw storage at translation-unit scope, wrapped at static-init time.
    assert!(body.contains("static PRInt32 const CASES_DATA[] = { 1, 2, 3 };"));
    assert!(body.contains("jArray<PRInt32,PRInt32> nsHtml5Tokenizer::CASES;"));
    assert!(body.contains("CASES = jArray<PRInt32,PRInt32>((PRInt32*)CASES_DATA, 3);"));
}

#[test]
fn reference_statics_are_lowered_into_the_statics_procedures() {
    let source = r#"
public class ElementName {
    static final ElementName NULL_ELEMENT_NAME = new ElementName();

    public ElementName() {
    }
}
"#;
    let (header, body) = translate_unit(source).expect("translate");
    assert!(header.contains("static nsHtml5ElementName* NULL_ELEMENT_NAME;"));
    assert!(body.contains("nsHtml5ElementName* nsHtml5ElementName::NULL_ELEMENT_NAME = nsnull;"));
    // Initialization and teardown are paired, not inlined at the member.
    assert!(body.contains("NULL_ELEMENT_NAME = new nsHtml5ElementName();"));
    assert!(body.contains("delete NULL_ELEMENT_NAME;"));
}

#[test]
fn reference_array_statics_fill_elementwise() {
    let source = r#"
public class ElementName {
    static final ElementName A = new ElementName();
    static final ElementName B = new ElementName();
    static final ElementName[] ELEMENT_NAMES = { A, B };

    public ElementName() {
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(body.contains("ELEMENT_NAMES = jArray<nsHtml5ElementName*,PRInt32>::newJArray(2);"));
    assert!(body.contains("ELEMENT_NAMES[0] = A;"));
    assert!(body.contains("ELEMENT_NAMES[1] = B;"));
    assert!(body.contains("ELEMENT_NAMES.release();"));
}

#[test]
fn static_procedures_exist_even_without_statics() {
    let source = r#"
public class StackNode {
    public StackNode() {
    }
}
"#;
    let (header, body) = translate_unit(source).expect("translate");
    assert!(header.contains("static void initializeStatics();"));
    assert!(header.contains("static void releaseStatics();"));
    assert!(body.contains("nsHtml5StackNode::initializeStatics()"));
    assert!(body.contains("nsHtml5StackNode::releaseStatics()"));
}

#[test]
fn non_int_primitive_statics_with_initializers_are_fatal() {
    let source = r#"
public class Tokenizer {
    private static final boolean REPORT = true;
}
"#;
    let err = translate_unit(source).expect_err("should fail");
    assert!(matches!(err, Error::Unsupported { .. }));
}

#[test]
fn instance_field_initializers_are_fatal() {
    let source = r#"
public class Tokenizer {
    private int state = 0;
}
"#;
    let err = translate_unit(source).expect_err("should fail");
    assert!(matches!(err, Error::Unsupported { .. }));
}
