//! Post-parse analysis passes
//!
//! 1. **Declare**: register every namespace and type (and typedef alias) in
//!    the [`SymbolTable`]. Because this pass runs over the whole tree first,
//!    fields may name types declared further down.
//! 2. **Resolve**: resolve each field's type from its enclosing scope, reject
//!    duplicate field names and fold initializers with the [`Evaluator`].
//! 3. **Containment**: reject types that contain themselves by value, either
//!    directly or through a cycle of other types, and by-value fields of
//!    types that were only forward-declared. Cycles are found with an
//!    explicit stack, never by recursing into field types.
//!
//! Every problem becomes a diagnostic; no pass stops at the first one.

use crate::config::CheckOptions;
use crate::diagnostics::Diagnostic;
use crate::parser::ast::*;
use crate::semantic::errors::SemanticError;
use crate::semantic::eval::Evaluator;
use crate::semantic::symbols::{
    FieldType, QualifiedName, ResolvedField, ScopeId, SymbolTable, TypeDeclaration,
};
use rustc_hash::FxHashMap;

/// Symbol table and semantic diagnostics of one translation unit
#[derive(Debug, Clone)]
pub struct Analysis {
    pub symbols: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run all analysis passes over a parsed unit.
pub fn analyze(unit: &TranslationUnit, options: &CheckOptions) -> Analysis {
    let mut analyzer = Analyzer::new(options);

    analyzer.declare_decls(&unit.decls, ScopeId::ROOT);
    tracing::debug!(
        target: "analyzer",
        pass = "declare",
        namespaces = analyzer.symbols.namespace_count(),
        types = analyzer.symbols.type_count(),
        diagnostics = analyzer.diagnostics.len(),
        "pass complete"
    );

    analyzer.resolve_decls(&unit.decls, ScopeId::ROOT);
    tracing::debug!(
        target: "analyzer",
        pass = "resolve",
        diagnostics = analyzer.diagnostics.len(),
        "pass complete"
    );

    analyzer.check_containment();
    tracing::debug!(
        target: "analyzer",
        pass = "containment",
        diagnostics = analyzer.diagnostics.len(),
        "pass complete"
    );

    Analysis {
        symbols: analyzer.symbols,
        diagnostics: analyzer.diagnostics,
    }
}

struct Analyzer<'a> {
    options: &'a CheckOptions,
    symbols: SymbolTable,
    evaluator: Evaluator,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Analyzer<'a> {
    fn new(options: &'a CheckOptions) -> Self {
        Self {
            options,
            symbols: SymbolTable::new(),
            evaluator: Evaluator::new().with_range_checks(options.range_checks),
            diagnostics: Vec::new(),
        }
    }

    fn report(&mut self, err: SemanticError) {
        tracing::trace!(target: "analyzer", error = %err, "semantic error");
        self.diagnostics.push(err.to_diagnostic());
    }

    // ===== Pass 1: declare =====

    fn declare_decls(&mut self, decls: &[Decl], scope: ScopeId) {
        for decl in decls {
            match decl {
                Decl::Namespace(ns) => {
                    let id = match self.symbols.declare_namespace(scope, &ns.name, ns.location) {
                        Ok(id) => Some(id),
                        Err(err) => {
                            self.report(err);
                            // A reopened namespace merges into the first one
                            self.symbols.child_namespace(scope, &ns.name)
                        }
                    };
                    if let Some(id) = id {
                        self.declare_decls(&ns.decls, id);
                    }
                }
                Decl::Struct(st) => self.declare_struct(st, scope),
            }
        }
    }

    fn declare_struct(&mut self, st: &StructDecl, scope: ScopeId) {
        let qualified = self.symbols.scope_path(scope).child(&st.name);
        let mut decl = match st.form {
            StructForm::Forward => TypeDeclaration::forward(qualified.clone(), st.location),
            StructForm::Typedef | StructForm::Plain => {
                TypeDeclaration::new(qualified.clone(), st.location)
            }
        };
        decl.alias = st.alias.clone();

        tracing::trace!(target: "analyzer", name = %qualified, "declare type");
        if let Err(err) = self.symbols.declare(scope, decl) {
            self.report(err);
            return;
        }

        if let Some(alias) = &st.alias {
            if let Err(err) = self.symbols.declare_alias(scope, alias, &qualified, st.location) {
                self.report(err);
            }
        }
    }

    // ===== Pass 2: resolve and evaluate =====

    fn resolve_decls(&mut self, decls: &[Decl], scope: ScopeId) {
        for decl in decls {
            match decl {
                Decl::Namespace(ns) => {
                    if let Some(id) = self.symbols.child_namespace(scope, &ns.name) {
                        self.resolve_decls(&ns.decls, id);
                    }
                }
                Decl::Struct(st) if st.form != StructForm::Forward => {
                    let qualified = self.symbols.scope_path(scope).child(&st.name);
                    // Skip definitions that lost a duplicate-name conflict
                    let registered = self
                        .symbols
                        .get(&qualified)
                        .is_some_and(|d| d.location == st.location);
                    if !registered {
                        continue;
                    }

                    let fields = self.resolve_fields(st, scope, &qualified);
                    if let Some(decl) = self.symbols.get_mut(&qualified) {
                        decl.fields = fields;
                    }
                }
                Decl::Struct(_) => {}
            }
        }
    }

    fn resolve_fields(
        &mut self,
        st: &StructDecl,
        scope: ScopeId,
        qualified: &QualifiedName,
    ) -> Vec<ResolvedField> {
        let mut seen: FxHashMap<&str, SourceLocation> = FxHashMap::default();
        let mut resolved = Vec::with_capacity(st.fields.len());

        for field in &st.fields {
            if let Some(previous) = seen.get(field.name.as_str()) {
                self.report(SemanticError::DuplicateName {
                    name: field.name.clone(),
                    scope: qualified.to_string(),
                    previous: *previous,
                    location: field.location,
                });
                continue;
            }
            seen.insert(&field.name, field.location);

            let ty = self.resolve_field_type(&field.ty, scope, field.location);

            if field.array_len == Some(0) {
                self.report(SemanticError::ArraySize {
                    message: format!("array '{}' must have a positive dimension", field.name),
                    location: field.location,
                });
            }

            let value = match (&field.init, &ty) {
                (None, _) | (Some(_), FieldType::Unresolved(_)) => None,
                (Some(_), _) if field.array_len == Some(0) => None,
                (Some(init), FieldType::Struct(target)) => {
                    self.report(SemanticError::type_mismatch(
                        format!(
                            "field '{}' of struct type {} cannot have an initializer",
                            field.name, target
                        ),
                        init.location(),
                    ));
                    None
                }
                (Some(init), FieldType::Primitive(p)) => {
                    match self.evaluator.evaluate_initializer(init, *p, field.array_len) {
                        Ok(value) => Some(value),
                        Err(err) => {
                            self.report(err);
                            None
                        }
                    }
                }
            };
            let warnings = self.evaluator.take_warnings();
            self.diagnostics.extend(warnings);

            resolved.push(ResolvedField {
                name: field.name.clone(),
                ty,
                array_len: field.array_len,
                value,
                location: field.location,
            });
        }

        resolved
    }

    fn resolve_field_type(
        &mut self,
        ty: &TypeSpec,
        scope: ScopeId,
        field_location: SourceLocation,
    ) -> FieldType {
        let name = match ty {
            TypeSpec::Primitive(p) => return FieldType::Primitive(*p),
            TypeSpec::Named(name) => name,
        };

        let outcome = self
            .symbols
            .resolve(name, scope)
            .map(|target| (target.qualified.clone(), target.first_seen()));

        match outcome {
            Ok((target, first_seen)) => {
                if !self.options.allow_forward_references && first_seen > field_location {
                    self.report(SemanticError::UsedBeforeDeclaration {
                        name: name.to_string(),
                        declared_at: first_seen,
                        location: name.location,
                    });
                }
                FieldType::Struct(target)
            }
            Err(err) => {
                self.report(err);
                FieldType::Unresolved(name.to_string())
            }
        }
    }

    // ===== Pass 3: containment =====

    fn check_containment(&mut self) {
        let names: Vec<QualifiedName> = self
            .symbols
            .types()
            .into_iter()
            .filter(|t| t.complete)
            .map(|t| t.qualified.clone())
            .collect();
        let index: FxHashMap<&QualifiedName, usize> =
            names.iter().enumerate().map(|(i, n)| (n, i)).collect();

        // By-value edges between distinct complete types: (target, field, location)
        let mut edges: Vec<Vec<(usize, String, SourceLocation)>> = vec![Vec::new(); names.len()];
        let mut errors = Vec::new();
        let mut self_referential = Vec::new();

        for (i, name) in names.iter().enumerate() {
            let Some(decl) = self.symbols.get(name) else {
                continue;
            };
            for field in &decl.fields {
                let FieldType::Struct(target) = &field.ty else {
                    continue;
                };
                if target == name {
                    self_referential.push(name.clone());
                    errors.push(SemanticError::structural(
                        format!(
                            "field '{}' embeds its enclosing type '{}' by value, giving it infinite size",
                            field.name, name
                        ),
                        field.location,
                    ));
                } else if let Some(&j) = index.get(target) {
                    edges[i].push((j, field.name.clone(), field.location));
                } else if self.symbols.get(target).is_some_and(|t| !t.complete) {
                    errors.push(SemanticError::structural(
                        format!(
                            "field '{}' has incomplete type '{}', which is only forward-declared",
                            field.name, target
                        ),
                        field.location,
                    ));
                }
            }
        }

        errors.extend(find_cycles(&names, &edges));

        for name in self_referential {
            if let Some(decl) = self.symbols.get_mut(&name) {
                decl.self_referential = true;
            }
        }
        for err in errors {
            self.report(err);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Active,
    Done,
}

/// Depth-first search with an explicit stack; each back edge closes one cycle.
fn find_cycles(
    names: &[QualifiedName],
    edges: &[Vec<(usize, String, SourceLocation)>],
) -> Vec<SemanticError> {
    let mut marks = vec![Mark::Unvisited; names.len()];
    let mut errors = Vec::new();

    for start in 0..names.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        marks[start] = Mark::Active;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            let Some((target, field, location)) = edges[node].get(next) else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            top.1 += 1;

            match marks[*target] {
                Mark::Unvisited => {
                    marks[*target] = Mark::Active;
                    stack.push((*target, 0));
                }
                Mark::Active => {
                    let from = stack.iter().position(|(n, _)| n == target).unwrap_or(0);
                    let mut path: Vec<String> =
                        stack[from..].iter().map(|(n, _)| names[*n].to_string()).collect();
                    path.push(names[*target].to_string());
                    errors.push(SemanticError::structural(
                        format!(
                            "field '{}' makes type '{}' contain itself by value through {}",
                            field,
                            names[*target],
                            path.join(" -> ")
                        ),
                        *location,
                    ));
                }
                Mark::Done => {}
            }
        }
    }

    errors
}
