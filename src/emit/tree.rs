//! Indented dump of the declaration tree, one node per line with its
//! source position.

use crate::emit::source::format_initializer;
use crate::parser::ast::*;

pub fn emit_tree(unit: &TranslationUnit) -> String {
    let mut out = String::from("TranslationUnit\n");
    for decl in &unit.decls {
        write_node(&mut out, decl, 1);
    }
    out
}

fn line(out: &mut String, depth: usize, text: &str, location: SourceLocation) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(text);
    out.push_str(&format!(" @{}\n", location));
}

fn write_node(out: &mut String, decl: &Decl, depth: usize) {
    match decl {
        Decl::Namespace(ns) => {
            line(out, depth, &format!("Namespace {}", ns.name), ns.location);
            for child in &ns.decls {
                write_node(out, child, depth + 1);
            }
        }
        Decl::Struct(st) => {
            let header = match (st.form, &st.alias) {
                (StructForm::Typedef, Some(alias)) => format!("Typedef {} alias {}", st.name, alias),
                (StructForm::Typedef, None) => format!("Typedef {}", st.name),
                (StructForm::Plain, _) => format!("Struct {}", st.name),
                (StructForm::Forward, _) => format!("ForwardDecl {}", st.name),
            };
            line(out, depth, &header, st.location);

            for field in &st.fields {
                let mut text = format!("Field {}: {}", field.name, field.ty);
                if let Some(len) = field.array_len {
                    text.push_str(&format!("[{}]", len));
                }
                if let Some(init) = &field.init {
                    text.push_str(" = ");
                    text.push_str(&format_initializer(init));
                }
                line(out, depth + 1, &text, field.location);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::parse;

    #[test]
    fn test_tree_dump() {
        let out = parse("namespace A {\n  typedef struct T { short x[2] = [1, 2 * 3]; } T;\n  struct F;\n}");
        let expected = "\
TranslationUnit
  Namespace A @1:1
    Typedef T alias T @2:3
      Field x: short[2] = [1, 2 * 3] @2:28
    ForwardDecl F @3:3
";
        assert_eq!(emit_tree(&out.unit), expected);
    }
}
