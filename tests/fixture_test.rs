use declcheck::emit::{emit_source, emit_symbols};
use declcheck::parser::parse::parse;
use declcheck::semantic::{FieldType, QualifiedName, ResolvedField, Value};
use declcheck::{check, CheckOptions, CheckOutput, DiagnosticKind};

const SAMPLE: &str = include_str!("fixtures/sample.decl");

fn check_sample() -> CheckOutput {
    check(SAMPLE, &CheckOptions::default())
}

fn field<'a>(output: &'a CheckOutput, ty: &str, name: &str) -> &'a ResolvedField {
    output
        .symbols
        .get(&QualifiedName::new(ty.split("::")))
        .unwrap_or_else(|| panic!("type {ty} not declared"))
        .fields
        .iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("field {name} not found in {ty}"))
}

#[test]
fn test_sample_diagnostics() {
    let output = check_sample();

    let summary: Vec<_> = output
        .diagnostics
        .iter()
        .map(|d| (d.location.line, d.kind))
        .collect();
    assert_eq!(
        summary,
        vec![
            (7, DiagnosticKind::TypeMismatch),
            (8, DiagnosticKind::OutOfRange),
            (41, DiagnosticKind::TypeMismatch),
            (51, DiagnosticKind::Structural),
            (55, DiagnosticKind::TypeMismatch),
        ],
        "{:#?}",
        output.diagnostics
    );
}

#[test]
fn test_sample_folded_values() {
    let output = check_sample();

    assert_eq!(field(&output, "C", "testInt").value, Some(Value::Int(5)));
    match field(&output, "C", "testFloat").value {
        Some(Value::Single(v)) => assert!((v - 3.6).abs() < 1e-6, "{v}"),
        ref other => panic!("Expected folded float, got {:?}", other),
    }
    assert_eq!(field(&output, "C", "c0").value, Some(Value::Char('a')));
    assert_eq!(field(&output, "C", "c1").value, Some(Value::Str("abc".into())));
    assert_eq!(field(&output, "C", "c2").value, Some(Value::Bool(true)));
    assert_eq!(
        field(&output, "C", "arr").value,
        Some(Value::Array((0..10).map(Value::Int).collect()))
    );
    assert_eq!(
        field(&output, "B::middle::inner::bottom", "i5").value,
        Some(Value::Int(1000))
    );

    // Rejected initializers leave no value behind
    assert_eq!(field(&output, "A::innerModule::internal", "i1").value, None);
    assert_eq!(field(&output, "C", "testFloat2").value, None);
}

#[test]
fn test_sample_qualified_resolution() {
    let output = check_sample();

    let internal = QualifiedName::new(["A", "innerModule", "internal"]);
    assert_eq!(
        field(&output, "A::innerStruct", "test").ty,
        FieldType::Struct(internal.clone())
    );
    assert_eq!(
        field(&output, "C", "testBool2").ty,
        FieldType::Struct(internal)
    );

    let c = output.symbols.get(&QualifiedName::new(["C"])).unwrap();
    assert!(c.self_referential);
    assert_eq!(c.alias.as_deref(), Some("C"));
}

#[test]
fn test_sample_reemits_verbatim() {
    let parsed = parse(SAMPLE);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

    let emitted = emit_source(&parsed.unit);
    assert_eq!(emitted, format!("{}\n", SAMPLE.trim_end()));
}

#[test]
fn test_sample_roundtrip_is_fixpoint() {
    let once = emit_source(&parse(SAMPLE).unit);
    let reparsed = parse(&once);
    assert!(reparsed.diagnostics.is_empty());
    assert_eq!(emit_source(&reparsed.unit), once);
}

#[test]
fn test_sample_symbol_summary() {
    let summary = emit_symbols(&check_sample().symbols);

    assert!(summary.contains("A::innerModule::internal\n  c1: short\n  i1: short\n  i2: short = 10\n"));
    assert!(summary.contains("C [self-referential]\n"));
    assert!(summary.contains("  testBool2: A::innerModule::internal\n"));
    assert!(summary.contains("  testFloat: float = 3.6\n"));
}
