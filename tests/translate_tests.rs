use j2cpp::parser::parse_java;
use j2cpp::{translate_header, translate_unit, Error, Translator};

#[test]
fn null_and_zero_comparisons_become_boolean_idioms() {
    let source = r#"
public class Tokenizer {
    private ElementName contextName;
    private int count;

    public void step() {
        if (contextName != null) {
            advance();
        }
        if (contextName == null) {
            advance();
        }
        if (count != 0) {
            advance();
        }
        if (count == 0) {
            advance();
        }
    }

    private void advance() {
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(body.contains("if (!!contextName) {"));
    assert!(body.contains("if (!contextName) {"));
    assert!(body.contains("if (!!count) {"));
    assert!(body.contains("if (!count) {"));
    // The literal comparison forms must not leak through.
    assert!(!body.contains("!= nsnull"));
    assert!(!body.contains("== nsnull"));
    assert!(!body.contains("!= 0"));
    assert!(!body.contains("== 0"));
}

#[test]
fn comparisons_against_other_literals_stay_literal() {
    let source = r#"
public class Tokenizer {
    public boolean check(int count) {
        return count == 1;
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(body.contains("count == 1"));
}

#[test]
fn namespace_uris_become_namespace_constants() {
    let cases = [
        ("http://www.w3.org/1999/xhtml", "kNameSpaceID_XHTML"),
        ("http://www.w3.org/2000/svg", "kNameSpaceID_SVG"),
        ("http://www.w3.org/2000/xmlns/", "kNameSpaceID_XMLNS"),
        ("http://www.w3.org/XML/1998/namespace", "kNameSpaceID_XML"),
        ("http://www.w3.org/1999/xlink", "kNameSpaceID_XLink"),
        ("http://www.w3.org/1998/Math/MathML", "kNameSpaceID_MathML"),
    ];
    for (uri, constant) in cases {
        let source = format!(
            r#"
public class TreeBuilder {{
    public void mark() {{
        setNamespace("{}");
    }}

    private void setNamespace(String ns) {{
    }}
}}
"#,
            uri
        );
        let (_, body) = translate_unit(&source).expect("translate");
        assert!(
            body.contains(&format!("setNamespace({});", constant)),
            "{} should emit {}, got:\n{}",
            uri,
            constant,
            body
        );
        assert!(!body.contains(&format!("\"{}\"", uri)));
    }
}

#[test]
fn empty_string_in_the_namespace_class_is_the_none_constant() {
    let source = r#"
public class AttributeName {
    public void mark() {
        setNamespace("");
    }

    private void setNamespace(String ns) {
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(body.contains("setNamespace(kNameSpaceID_None);"));
}

#[test]
fn format_shaped_literals_stay_quoted_strings() {
    let source = r#"
public class TreeBuilder {
    public void check(String publicId) {
        compare(publicId, "-//W3C//DTD HTML 4.01//EN");
        compare(publicId, "+//Silmaril//dtd html Pro v0r11 19970101//");
        compare(publicId, "http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd");
        compare(publicId, "XSLT");
    }

    private void compare(String a, String b) {
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(body.contains("\"-//W3C//DTD HTML 4.01//EN\""));
    assert!(body.contains("\"+//Silmaril//dtd html Pro v0r11 19970101//\""));
    assert!(body.contains("\"http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd\""));
    assert!(body.contains("\"XSLT\""));
}

#[test]
fn quirky_literals_are_scoped_to_the_quirky_method() {
    let source = r#"
public class TreeBuilder {
    public boolean isQuirky(String name) {
        return name == "HTML";
    }

    public void elsewhere() {
        record("HTML");
    }

    private void record(String name) {
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    // Inside isQuirky the literal stays a quoted string; everywhere else the
    // same literal goes through the atom table.
    assert!(body.contains("name == \"HTML\""));
    assert!(body.contains("record(nsHtml5Atoms::HTML);"));
}

#[test]
fn other_string_literals_are_interned_once() {
    let source = r#"
public class MetaScanner {
    public void scan() {
        mark("accept-charset");
        mark("accept-charset");
        mark("content-type");
    }

    private void mark(String name) {
    }
}
"#;
    let unit = parse_java(source).expect("parse");
    let mut translator = Translator::new();
    translator.header(&unit).expect("header");
    let body = translator.body(&unit).expect("body");
    assert!(body.contains("mark(nsHtml5Atoms::accept_charset);"));
    let records: Vec<_> = translator.atom_records().collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], ("accept_charset", "accept-charset"));
    assert_eq!(records[1], ("content_type", "content-type"));
}

#[test]
fn define_round_trip_within_one_class() {
    let source = r#"
public class Tokenizer {
    private static final int DATA = 0;

    public int initial() {
        return Tokenizer.DATA;
    }

    public int bare() {
        return DATA;
    }
}
"#;
    let (header, body) = translate_unit(source).expect("translate");
    assert!(header.contains("#define NS_HTML5_TOKENIZER_DATA 0"));
    assert!(body.contains("return NS_HTML5_TOKENIZER_DATA;"));
    assert!(!body.contains("Tokenizer.DATA"));
}

#[test]
fn defines_resolve_across_classes_in_manifest_order() {
    let attribute_name = r#"
public class AttributeName {
    static final int HTML = 3;
}
"#;
    let tokenizer = r#"
public class Tokenizer {
    public int pick() {
        return AttributeName.HTML;
    }
}
"#;
    let mut translator = Translator::new();
    let first = parse_java(attribute_name).expect("parse");
    let second = parse_java(tokenizer).expect("parse");
    translator.header(&first).expect("header");
    translator.header(&second).expect("header");
    let body = translator.body(&second).expect("body");
    assert!(body.contains("return NS_HTML5_ATTRIBUTE_NAME_HTML;"));
}

#[test]
fn missing_define_falls_back_to_the_qualified_spelling() {
    // Tokenizer is processed before the declaring class, so the constant is
    // not registered yet; the reference degrades to the qualified form
    // instead of silently minting a macro.
    let tokenizer = r#"
public class Tokenizer {
    public int pick() {
        return AttributeName.HTML;
    }
}
"#;
    let mut translator = Translator::new();
    let unit = parse_java(tokenizer).expect("parse");
    translator.header(&unit).expect("header");
    let body = translator.body(&unit).expect("body");
    assert!(body.contains("nsHtml5AttributeName::ATTR_HTML"));
    assert!(!body.contains("NS_HTML5_ATTRIBUTE_NAME_HTML"));
}

#[test]
fn constructor_initializer_list_is_extracted_in_order() {
    let source = r#"
public class StackNode {
    private int group;
    private ElementName name;
    private boolean tainted;

    public StackNode(int group, ElementName name) {
        this.group = group;
        this.name = name;
        this.tainted = false;
        prime();
        settle();
    }

    private void prime() {
    }

    private void settle() {
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(body.contains("nsHtml5StackNode::nsHtml5StackNode(PRInt32 group, nsHtml5ElementName* name)"));
    assert!(body.contains("  : group(group),"));
    assert!(body.contains("    name(name),"));
    assert!(body.contains("    tainted(PR_FALSE)"));
    assert!(body.contains("prime();"));
    assert!(body.contains("settle();"));
    // Nothing duplicated into the body.
    assert!(!body.contains("group = group;"));
    assert!(!body.contains("tainted = PR_FALSE;"));
}

#[test]
fn end_to_end_minimal_class() {
    let source = r#"
public class MetaScanner {
    private static final int FOO = 3;
    private int state;

    public MetaScanner() {
        this.state = 0;
    }

    public void destructor() {
    }
}
"#;
    let (header, body) = translate_unit(source).expect("translate");

    assert!(header.contains("#ifndef nsHtml5MetaScanner_h__"));
    assert!(header.contains("#define NS_HTML5_META_SCANNER_FOO 3"));
    assert!(header.contains("PRInt32 state;"));
    assert!(header.contains("nsHtml5MetaScanner();"));
    assert!(header.contains("~nsHtml5MetaScanner();"));
    assert!(header.contains("static void initializeStatics();"));
    assert!(header.contains("static void releaseStatics();"));

    assert!(body.contains("  : state(0)"));
    assert!(body.contains("MOZ_COUNT_CTOR(nsHtml5MetaScanner);"));
    assert!(body.contains("nsHtml5MetaScanner::~nsHtml5MetaScanner()"));
    assert!(body.contains("MOZ_COUNT_DTOR(nsHtml5MetaScanner);"));
    assert!(body.contains("nsHtml5MetaScanner::initializeStatics()"));
    assert!(body.contains("nsHtml5MetaScanner::releaseStatics()"));
}

#[test]
fn diagnostic_calls_are_dropped() {
    let source = r#"
public class Tokenizer {
    public void step(int c) {
        errStrayStartTag(c);
        warnAboutPrivateUse(c);
        fatalDoctype(c);
        maybeErrSlash(c);
        maybeWarnPrivateUse(c);
        advance(c);
    }

    private void advance(int c) {
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(!body.contains("errStrayStartTag"));
    assert!(!body.contains("warnAboutPrivateUse"));
    assert!(!body.contains("fatalDoctype"));
    assert!(!body.contains("maybeErrSlash"));
    assert!(!body.contains("maybeWarnPrivateUse"));
    assert!(body.contains("advance(c);"));
}

#[test]
fn diagnostic_only_switch_case_keeps_a_fallthrough_comment() {
    let source = r#"
public class Tokenizer {
    public void dispatch(int state) {
        switch (state) {
            case 1:
                errStray();
            case 2:
                advance();
                break;
            default:
                advance();
        }
    }

    private void advance() {
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(body.contains("case 1:"));
    assert!(body.contains("/* fall through */"));
    assert!(!body.contains("errStray"));
}

#[test]
fn helper_namespace_calls_are_rewritten() {
    let source = r#"
public class UTF16Buffer {
    private char[] buffer;
    private @NoLength char[] raw;

    public void shuffle(char[] other, int start, int len, ElementName node) {
        System.arraycopy(buffer, 0, other, 0, len);
        System.arraycopy(buffer, start, buffer, 0, len);
        System.arraycopy(buffer, start, other, 2, len);
        Portability.releaseArray(buffer);
        Portability.deleteArray(raw);
        Portability.delete(node);
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(body.contains("nsHtml5ArrayCopy::arraycopy(buffer, other, len);"));
    assert!(body.contains("nsHtml5ArrayCopy::arraycopy(buffer, start, 0, len);"));
    assert!(body.contains("nsHtml5ArrayCopy::arraycopy(buffer, start, other, 2, len);"));
    assert!(body.contains("buffer.release();"));
    assert!(body.contains("delete[] raw;"));
    assert!(body.contains("delete node;"));
}

#[test]
fn binary_search_goes_through_the_container() {
    let source = r#"
public class NamedCharacters {
    private static int[] WINDOWS_1252;

    public int find(int key) {
        return Arrays.binarySearch(WINDOWS_1252, key);
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(body.contains("return WINDOWS_1252.binarySearch(key);"));
}

#[test]
fn max_value_uses_the_target_constant() {
    let source = r#"
public class Tokenizer {
    public int cap() {
        return Integer.MAX_VALUE;
    }
}
"#;
    let (_, body) = translate_unit(source).expect("translate");
    assert!(body.contains("return PR_INT32_MAX;"));
}

#[test]
fn inline_methods_live_in_the_header_only() {
    let source = r#"
public class UTF16Buffer {
    private int start;

    @Inline public int getStart() {
        return start;
    }

    public void reset() {
        start = 0;
    }
}
"#;
    let (header, body) = translate_unit(source).expect("translate");
    assert!(header.contains("inline PRInt32 getStart()"));
    assert!(header.contains("return start;"));
    assert!(!body.contains("getStart"));
    assert!(body.contains("nsHtml5UTF16Buffer::reset()"));
}

#[test]
fn unsupported_primitives_fail_fast() {
    for ty in ["byte", "double", "float", "long", "short"] {
        let source = format!(
            r#"
public class Tokenizer {{
    private {} value;
}}
"#,
            ty
        );
        let err = translate_header(&source).expect_err("should fail");
        assert!(
            matches!(err, Error::Unsupported { .. }),
            "{} should be an unsupported construct, got {:?}",
            ty,
            err
        );
    }
}

#[test]
fn unsigned_right_shift_fails_fast() {
    let source = r#"
public class Tokenizer {
    public int fold(int value) {
        return value >>> 4;
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
fn nested_array_allocation_fails_fast() {
    let source = r#"
public class Tokenizer {
    public void grow(int n, int m) {
        int[][] table = new int[n][m];
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
fn no_length_arrays_use_raw_allocation() {
    let source = r#"
public class UTF16Buffer {
    private @NoLength char[] raw;
    private char[] bounded;

    public void grow(int size) {
        raw = new char[size];
        bounded = new char[size];
    }
}
"#;
    let (header, body) = translate_unit(source).expect("translate");
    assert!(header.contains("PRUnichar* raw;"));
    assert!(header.contains("jArray<PRUnichar,PRInt32> bounded;"));
    assert!(body.contains("raw = new PRUnichar[size];"));
    assert!(body.contains("bounded = jArray<PRUnichar,PRInt32>::newJArray(size);"));
}
