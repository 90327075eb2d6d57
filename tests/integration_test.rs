// Integration tests for the declaration checker

use declcheck::{check, check_bytes, CheckOptions, CheckOutput, DiagnosticKind, Severity};

fn run(source: &str) -> CheckOutput {
    check(source, &CheckOptions::default())
}

fn kinds(output: &CheckOutput) -> Vec<DiagnosticKind> {
    output.diagnostics.iter().map(|d| d.kind).collect()
}

#[test]
fn test_clean_input_has_no_diagnostics() {
    let source = r#"
        #include "base.idl"
        namespace Geometry {
            typedef struct Point {
                int x = 0, y = 0;
            } Point;

            struct Rect {
                Point corners[2];
                unsigned int flags = 1 << 3 | 1;
                double area = 2.5 * 4;
            };
        }

        struct Scene {
            Geometry::Rect bounds;
            ::Geometry::Point origin;
            string name = "main\tscene";
        };
    "#;

    let output = run(source);
    assert!(output.diagnostics.is_empty(), "{:#?}", output.diagnostics);
    assert_eq!(output.symbols.type_count(), 3);
}

#[test]
fn test_syntax_errors_do_not_hide_later_problems() {
    let source = r#"
        struct A {
            short = 1;
            short ok = 70000;
            long bad = ;
            char c = "not a char";
        };
        struct B { A a; A a; };
    "#;

    let output = run(source);
    assert_eq!(
        kinds(&output),
        vec![
            DiagnosticKind::Syntax,
            DiagnosticKind::OutOfRange,
            DiagnosticKind::Syntax,
            DiagnosticKind::TypeMismatch,
            DiagnosticKind::DuplicateName,
        ]
    );
}

#[test]
fn test_broken_brace_list_keeps_later_fields() {
    let source = "struct S { short a[2] = {1 2}; short b = \"x\"; };\nstruct T { int y = 1; };";

    let output = run(source);
    assert_eq!(
        kinds(&output),
        vec![DiagnosticKind::Syntax, DiagnosticKind::TypeMismatch]
    );
    assert_eq!(output.symbols.type_count(), 2);
}

#[test]
fn test_self_reference_never_overflows() {
    // Long chain ending in a cycle; containment checking must not recurse
    let mut source = String::new();
    for i in 0..2000 {
        source.push_str(&format!("struct T{} {{ T{} next; }};\n", i, i + 1));
    }
    source.push_str("struct T2000 { T0 back; };\n");

    let output = run(&source);
    assert_eq!(kinds(&output), vec![DiagnosticKind::Structural]);
}

#[test]
fn test_unresolved_in_unrelated_namespace() {
    let source = "namespace A { namespace innerModule { struct internal { int x; }; } }\nnamespace B { struct S { innerModule::internal i; A::innerModule::internal ok; }; }";

    let output = run(source);
    assert_eq!(kinds(&output), vec![DiagnosticKind::UnresolvedName]);
    assert!(output.diagnostics[0].message.contains("innerModule::internal"));
    assert_eq!(output.diagnostics[0].location.line, 2);
}

#[test]
fn test_lex_error_is_reported_with_position() {
    let output = run("struct S {\n  short a = 1 @ 2;\n};");

    assert_eq!(output.diagnostics[0].kind, DiagnosticKind::Lex);
    assert_eq!(output.diagnostics[0].location.line, 2);
    assert_eq!(output.diagnostics[0].location.column, 15);
}

#[test]
fn test_array_size_checks() {
    let output = run("struct S { short a[2] = [1, 2, 3]; short b[3] = [1]; short c[2] = 5; };");
    assert_eq!(
        kinds(&output),
        vec![DiagnosticKind::ArraySize, DiagnosticKind::TypeMismatch]
    );
}

#[test]
fn test_warning_severity() {
    let output = run("struct S { float f = 0.1d; };");

    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].severity, Severity::Warning);
    assert!(!output.has_errors());
}

#[test]
fn test_diagnostics_serialize_to_json() {
    let output = run("struct S { short x; short x; };");
    let json = serde_json::to_value(&output.diagnostics).unwrap();

    assert_eq!(json[0]["kind"], "duplicate_name");
    assert_eq!(json[0]["severity"], "error");
    assert_eq!(json[0]["related"][0]["location"]["column"], 18);
}

#[test]
fn test_non_utf8_input_is_reported_not_fatal() {
    let output = check_bytes(b"struct S {\n  short a = 1;\xc3(\n};", &CheckOptions::default());

    assert_eq!(kinds(&output), vec![DiagnosticKind::Input]);
    assert_eq!(output.diagnostics[0].location.line, 2);
    assert!(output.has_errors());
    assert!(output.unit.decls.is_empty());
}
