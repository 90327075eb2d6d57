//! Resolved symbol summary: every type by qualified name with its fields,
//! resolved field types and folded values.

use crate::semantic::symbols::SymbolTable;

pub fn emit_symbols(symbols: &SymbolTable) -> String {
    let mut out = String::new();

    for decl in symbols.types() {
        out.push_str(&decl.qualified.to_string());
        if let Some(alias) = &decl.alias {
            if alias != decl.qualified.name() {
                out.push_str(&format!(" (alias {})", alias));
            }
        }
        if !decl.complete {
            out.push_str(" [incomplete]");
        }
        if decl.self_referential {
            out.push_str(" [self-referential]");
        }
        out.push('\n');

        for field in &decl.fields {
            out.push_str(&format!("  {}: {}", field.name, field.ty));
            if let Some(len) = field.array_len {
                out.push_str(&format!("[{}]", len));
            }
            if let Some(value) = &field.value {
                out.push_str(&format!(" = {}", value));
            }
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckOptions;
    use crate::parser::parse::parse;
    use crate::semantic::analyze;

    #[test]
    fn test_summary() {
        let parsed = parse(
            "namespace A { typedef struct In { short v = 1 + 1; } In_t; }\nstruct Out { A::In_t inner; float f = 2.5; char arr[2] = ['a', 'b']; };\nstruct Fwd;",
        );
        let analysis = analyze(&parsed.unit, &CheckOptions::default());

        let expected = "\
A::In (alias In_t)
  v: short = 2
Fwd [incomplete]
Out
  inner: A::In
  f: float = 2.5
  arr: char[2] = ['a', 'b']
";
        assert_eq!(emit_symbols(&analysis.symbols), expected);
    }
}
