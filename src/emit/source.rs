//! Source re-emission
//!
//! Writes a declaration tree back out in header layout: tab indentation,
//! braces on their own lines, typedef aliases glued to the closing brace
//! (`}Name;`) and list initializers in square brackets. Top-level
//! declarations are separated by a blank line.
//!
//! Expressions are printed with the fewest parentheses that preserve the
//! tree, so emitting and re-parsing yields the same structure.

use crate::parser::ast::*;

/// Emit a whole translation unit
pub fn emit_source(unit: &TranslationUnit) -> String {
    let mut out = String::new();
    for (i, decl) in unit.decls.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_decl(&mut out, decl, 0);
    }
    out
}

/// Print a single expression
pub fn format_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

pub fn format_initializer(init: &Initializer) -> String {
    match init {
        Initializer::Expr(expr) => format_expr(expr),
        Initializer::List { elements, .. } => {
            let items: Vec<String> = elements.iter().map(format_expr).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn write_decl(out: &mut String, decl: &Decl, depth: usize) {
    match decl {
        Decl::Namespace(ns) => {
            indent(out, depth);
            out.push_str(&format!("namespace {}\n", ns.name));
            indent(out, depth);
            out.push_str("{\n");
            for child in &ns.decls {
                write_decl(out, child, depth + 1);
            }
            indent(out, depth);
            out.push_str("}\n");
        }
        Decl::Struct(st) => write_struct(out, st, depth),
    }
}

fn write_struct(out: &mut String, st: &StructDecl, depth: usize) {
    indent(out, depth);
    match st.form {
        StructForm::Forward => {
            out.push_str(&format!("struct {};\n", st.name));
            return;
        }
        StructForm::Typedef => out.push_str(&format!("typedef struct {}\n", st.name)),
        StructForm::Plain => out.push_str(&format!("struct {}\n", st.name)),
    }

    indent(out, depth);
    out.push_str("{\n");
    for field in &st.fields {
        write_field(out, field, depth + 1);
    }
    indent(out, depth);
    out.push('}');
    if let Some(alias) = &st.alias {
        out.push_str(alias);
    }
    out.push_str(";\n");
}

fn write_field(out: &mut String, field: &FieldDecl, depth: usize) {
    indent(out, depth);
    out.push_str(&format!("{} {}", field.ty, field.name));
    if let Some(len) = field.array_len {
        out.push_str(&format!("[{}]", len));
    }
    if let Some(init) = &field.init {
        out.push_str(" = ");
        out.push_str(&format_initializer(init));
    }
    out.push_str(";\n");
}

/// Binding strength of the node at the top of `expr`
fn binding(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Literal(..) | Expr::Unary { .. } => u8::MAX,
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Literal(lit, _) => out.push_str(&lit.text),
        Expr::Unary { op, operand, .. } => {
            out.push_str(op.symbol());
            write_operand(out, operand, binding(operand) != u8::MAX);
        }
        Expr::Binary {
            op, left, right, ..
        } => {
            let prec = op.precedence();
            // Left-associative: only the right side needs parens at equal strength
            write_operand(out, left, binding(left) < prec);
            out.push_str(&format!(" {} ", op.symbol()));
            write_operand(out, right, binding(right) <= prec);
        }
    }
}

fn write_operand(out: &mut String, expr: &Expr, parenthesize: bool) {
    if parenthesize {
        out.push('(');
        write_expr(out, expr);
        out.push(')');
    } else {
        write_expr(out, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::{parse, Parser};

    fn roundtrip_expr(source: &str) -> String {
        format_expr(&Parser::new(source).parse_expression().unwrap())
    }

    #[test]
    fn test_minimal_parentheses() {
        assert_eq!(roundtrip_expr("(1 + 2) * 3"), "(1 + 2) * 3");
        assert_eq!(roundtrip_expr("1 + (2 * 3)"), "1 + 2 * 3");
        assert_eq!(roundtrip_expr("(10 - 4) - 3"), "10 - 4 - 3");
        assert_eq!(roundtrip_expr("10 - (4 - 3)"), "10 - (4 - 3)");
        assert_eq!(roundtrip_expr("-(1 + 2)"), "-(1 + 2)");
        assert_eq!(roundtrip_expr("~ - 2"), "~-2");
        assert_eq!(roundtrip_expr("(1 | 2) & 3"), "(1 | 2) & 3");
    }

    #[test]
    fn test_header_layout() {
        let out = parse(
            "namespace A { typedef struct S { short a, b[2] = {1, 2}; } S_t; struct F; }\nstruct P { int x = -1; };",
        );
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

        let expected = "namespace A\n{\n\ttypedef struct S\n\t{\n\t\tshort a;\n\t\tshort b[2] = [1, 2];\n\t}S_t;\n\tstruct F;\n}\n\nstruct P\n{\n\tint x = -1;\n};\n";
        assert_eq!(emit_source(&out.unit), expected);
    }

    #[test]
    fn test_typedef_without_alias() {
        let out = parse("typedef struct S { long double d = 1.5d; };");
        assert_eq!(
            emit_source(&out.unit),
            "typedef struct S\n{\n\tlong double d = 1.5d;\n};\n"
        );
    }

    #[test]
    fn test_scoped_names_are_kept() {
        let out = parse("struct S { ::A::B x; A::B y; };");
        let text = emit_source(&out.unit);
        assert!(text.contains("\t::A::B x;\n"));
        assert!(text.contains("\tA::B y;\n"));
    }
}
