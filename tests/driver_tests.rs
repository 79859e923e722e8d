use std::fs;
use std::path::PathBuf;

use j2cpp::{driver, Config};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("j2cpp-tests")
        .join(format!("{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

const ATTRIBUTE_NAME_JAVA: &str = r#"/*
 * Copyright (c) 2008 Test Authors
 */

package nu.validator.htmlparser.impl;

public class AttributeName {
    static final int HTML = 3;
}
"#;

const TOKENIZER_JAVA: &str = r#"/*
 * Copyright (c) 2008 Test Authors
 */

package nu.validator.htmlparser.impl;

public class Tokenizer {
    private int state;

    public Tokenizer() {
        this.state = AttributeName.HTML;
    }

    public void emit() {
        record("accept-charset");
        record("accept-charset");
    }

    private void record(String name) {
    }
}
"#;

fn write_sources(dir: &PathBuf) {
    fs::write(dir.join("AttributeName.java"), ATTRIBUTE_NAME_JAVA).expect("write");
    fs::write(dir.join("Tokenizer.java"), TOKENIZER_JAVA).expect("write");
}

#[test]
fn run_writes_headers_then_bodies_with_license_and_banner() {
    let src = scratch_dir("run-src");
    let out = scratch_dir("run-out");
    write_sources(&src);

    let config = Config::new(&src, &out).with_manifests(
        vec!["AttributeName".to_string(), "Tokenizer".to_string()],
        vec!["Tokenizer".to_string()],
    );
    let summary = driver::run(&config).expect("run");
    assert_eq!(summary.headers_written, 2);
    assert_eq!(summary.bodies_written, 1);

    let header = fs::read_to_string(out.join("nsHtml5Tokenizer.h")).expect("header");
    assert!(header.starts_with("/*\n * Copyright (c) 2008 Test Authors\n */"));
    assert!(header.contains("THIS IS A GENERATED FILE. PLEASE DO NOT EDIT."));
    assert!(header.contains("Please edit Tokenizer.java instead"));
    assert!(header.contains("class nsHtml5Tokenizer"));

    // The declaration pass for AttributeName ran first, so the constant
    // resolves through the define registry in Tokenizer's body.
    let body = fs::read_to_string(out.join("nsHtml5Tokenizer.cpp")).expect("body");
    assert!(body.contains("  : state(NS_HTML5_ATTRIBUTE_NAME_HTML)"));

    assert!(!out.join("nsHtml5AttributeName.cpp").exists());
}

#[test]
fn atom_list_has_one_record_per_unique_literal() {
    let src = scratch_dir("atoms-src");
    let out = scratch_dir("atoms-out");
    write_sources(&src);

    let atom_list = out.join("AtomList.h");
    let config = Config::new(&src, &out)
        .with_manifests(
            vec!["AttributeName".to_string(), "Tokenizer".to_string()],
            vec!["Tokenizer".to_string()],
        )
        .with_atom_list(&atom_list);
    let summary = driver::run(&config).expect("run");
    assert_eq!(summary.atoms_written, 1);

    let atoms = fs::read_to_string(&atom_list).expect("atom list");
    assert_eq!(atoms, "HTML5_ATOM(accept_charset, \"accept-charset\")\n");
}

#[test]
fn check_reports_missing_manifest_sources() {
    let src = scratch_dir("check-src");
    write_sources(&src);

    let config = Config::new(&src, ".").with_manifests(
        vec![
            "AttributeName".to_string(),
            "Tokenizer".to_string(),
            "TreeBuilder".to_string(),
        ],
        vec![],
    );
    let missing = driver::check(&config).expect("check");
    assert_eq!(missing, vec!["TreeBuilder".to_string()]);
}

#[test]
fn parse_errors_name_the_offending_file() {
    let src = scratch_dir("err-src");
    let out = scratch_dir("err-out");
    fs::write(src.join("Tokenizer.java"), "public class {").expect("write");

    let config = Config::new(&src, &out)
        .with_manifests(vec!["Tokenizer".to_string()], vec![]);
    let err = driver::run(&config).expect_err("should fail");
    assert!(err.to_string().contains("Tokenizer.java"));
}
