//! Symbol table: namespace scopes and type declarations
//!
//! Scopes form a tree stored in an arena ([`ScopeId`] indexes into it). Each
//! scope knows its parent for outward lookup and maps simple names to
//! nested namespaces, types or typedef aliases. Type declarations
//! themselves live in one map keyed by [`QualifiedName`].
//!
//! # Resolution
//!
//! [`SymbolTable::resolve`] tries the reference from the current scope, then
//! each enclosing scope up to the root; the innermost match wins. A leading
//! `::` starts at the root only. Every segment but the last must name a
//! namespace; the last must name a type or an alias.

use crate::parser::ast::{PrimitiveType, ScopedName, SourceLocation};
use crate::semantic::errors::SemanticError;
use crate::semantic::value::Value;
use rustc_hash::FxHashMap;
use std::fmt;

/// Index of a namespace scope in the table's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);
}

/// Fully qualified name, outermost segment first
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName(Vec<String>);

impl QualifiedName {
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        QualifiedName(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment; empty for the root
    pub fn name(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }

    pub fn child(&self, name: &str) -> QualifiedName {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        QualifiedName(segments)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("::")
        } else {
            f.write_str(&self.0.join("::"))
        }
    }
}

/// Field type after name resolution
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Primitive(PrimitiveType),
    Struct(QualifiedName),
    /// Reference that failed to resolve, kept as written
    Unresolved(String),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Primitive(p) => write!(f, "{}", p),
            FieldType::Struct(name) => write!(f, "{}", name),
            FieldType::Unresolved(text) => write!(f, "{}?", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    pub ty: FieldType,
    pub array_len: Option<u64>,
    /// Folded initializer, if one was given and evaluated cleanly
    pub value: Option<Value>,
    pub location: SourceLocation,
}

/// A struct or typedef registered in the table
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub qualified: QualifiedName,
    pub alias: Option<String>,
    pub fields: Vec<ResolvedField>,
    /// Contains a field of its own type by value
    pub self_referential: bool,
    /// False while only a forward declaration has been seen
    pub complete: bool,
    pub location: SourceLocation,
    /// Location of an earlier forward declaration, if any
    pub forward_location: Option<SourceLocation>,
}

impl TypeDeclaration {
    pub fn new(qualified: QualifiedName, location: SourceLocation) -> Self {
        Self {
            qualified,
            alias: None,
            fields: Vec::new(),
            self_referential: false,
            complete: true,
            location,
            forward_location: None,
        }
    }

    /// Forward declaration (`struct Name;`)
    pub fn forward(qualified: QualifiedName, location: SourceLocation) -> Self {
        Self {
            complete: false,
            ..Self::new(qualified, location)
        }
    }

    /// First point in the source where the name is known
    pub fn first_seen(&self) -> SourceLocation {
        self.forward_location.unwrap_or(self.location)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum EntryKind {
    Namespace(ScopeId),
    Type(QualifiedName),
    Alias(QualifiedName),
}

#[derive(Debug, Clone)]
struct Entry {
    kind: EntryKind,
    location: SourceLocation,
}

#[derive(Debug, Clone)]
struct Scope {
    path: QualifiedName,
    parent: Option<ScopeId>,
    entries: FxHashMap<String, Entry>,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    types: FxHashMap<QualifiedName, TypeDeclaration>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                path: QualifiedName::default(),
                parent: None,
                entries: FxHashMap::default(),
            }],
            types: FxHashMap::default(),
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    pub fn scope_path(&self, scope: ScopeId) -> &QualifiedName {
        &self.scopes[scope.0].path
    }

    /// Existing namespace `name` directly inside `parent`
    pub fn child_namespace(&self, parent: ScopeId, name: &str) -> Option<ScopeId> {
        match self.scopes[parent.0].entries.get(name) {
            Some(Entry {
                kind: EntryKind::Namespace(id),
                ..
            }) => Some(*id),
            _ => None,
        }
    }

    /// Open a new namespace scope inside `parent`
    pub fn declare_namespace(
        &mut self,
        parent: ScopeId,
        name: &str,
        location: SourceLocation,
    ) -> Result<ScopeId, SemanticError> {
        if let Some(existing) = self.scopes[parent.0].entries.get(name) {
            return Err(self.duplicate(parent, name, existing.location, location));
        }

        let id = ScopeId(self.scopes.len());
        let path = self.scopes[parent.0].path.child(name);
        self.scopes.push(Scope {
            path,
            parent: Some(parent),
            entries: FxHashMap::default(),
        });
        self.scopes[parent.0].entries.insert(
            name.to_string(),
            Entry {
                kind: EntryKind::Namespace(id),
                location,
            },
        );
        Ok(id)
    }

    /// Register a type in `scope` under the last segment of its qualified name.
    ///
    /// A forward declaration and a later definition of the same name merge:
    /// the definition replaces the placeholder and remembers where the name
    /// was first seen.
    pub fn declare(&mut self, scope: ScopeId, decl: TypeDeclaration) -> Result<(), SemanticError> {
        let name = decl.qualified.name().to_string();

        if let Some(existing) = self.scopes[scope.0].entries.get(&name) {
            let previous = existing.location;
            let same_type = matches!(&existing.kind, EntryKind::Type(q) if *q == decl.qualified);

            if same_type {
                if let Some(current) = self.types.get_mut(&decl.qualified) {
                    if !decl.complete {
                        // Redundant forward declaration
                        return Ok(());
                    }
                    if !current.complete {
                        let forward_location = current.first_seen();
                        *current = TypeDeclaration {
                            forward_location: Some(forward_location),
                            ..decl
                        };
                        return Ok(());
                    }
                }
            }
            return Err(self.duplicate(scope, &name, previous, decl.location));
        }

        self.scopes[scope.0].entries.insert(
            name,
            Entry {
                kind: EntryKind::Type(decl.qualified.clone()),
                location: decl.location,
            },
        );
        self.types.insert(decl.qualified.clone(), decl);
        Ok(())
    }

    /// Register a typedef alias for `target` in `scope`.
    ///
    /// An alias spelled like the type it names (`typedef struct C {...} C;`)
    /// is accepted without creating a second entry.
    pub fn declare_alias(
        &mut self,
        scope: ScopeId,
        alias: &str,
        target: &QualifiedName,
        location: SourceLocation,
    ) -> Result<(), SemanticError> {
        if let Some(existing) = self.scopes[scope.0].entries.get(alias) {
            let same_target = match &existing.kind {
                EntryKind::Type(q) | EntryKind::Alias(q) => q == target,
                EntryKind::Namespace(_) => false,
            };
            if same_target {
                return Ok(());
            }
            return Err(self.duplicate(scope, alias, existing.location, location));
        }

        self.scopes[scope.0].entries.insert(
            alias.to_string(),
            Entry {
                kind: EntryKind::Alias(target.clone()),
                location,
            },
        );
        Ok(())
    }

    /// Resolve a type reference as seen from `from`, innermost scope first
    pub fn resolve(&self, name: &ScopedName, from: ScopeId) -> Result<&TypeDeclaration, SemanticError> {
        let mut current = if name.absolute { Some(ScopeId::ROOT) } else { Some(from) };

        while let Some(scope) = current {
            if let Some(decl) = self.resolve_in(scope, &name.segments) {
                return Ok(decl);
            }
            if name.absolute {
                break;
            }
            current = self.scopes[scope.0].parent;
        }

        Err(SemanticError::UnresolvedName {
            name: name.to_string(),
            scope: self.scope_path(from).to_string(),
            location: name.location,
        })
    }

    fn resolve_in(&self, start: ScopeId, segments: &[String]) -> Option<&TypeDeclaration> {
        let (last, namespaces) = segments.split_last()?;

        let mut scope = start;
        for segment in namespaces {
            scope = self.child_namespace(scope, segment)?;
        }

        match &self.scopes[scope.0].entries.get(last)?.kind {
            EntryKind::Type(q) | EntryKind::Alias(q) => self.types.get(q),
            EntryKind::Namespace(_) => None,
        }
    }

    pub fn get(&self, name: &QualifiedName) -> Option<&TypeDeclaration> {
        self.types.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &QualifiedName) -> Option<&mut TypeDeclaration> {
        self.types.get_mut(name)
    }

    /// All type declarations ordered by qualified name
    pub fn types(&self) -> Vec<&TypeDeclaration> {
        let mut types: Vec<_> = self.types.values().collect();
        types.sort_by(|a, b| a.qualified.cmp(&b.qualified));
        types
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Number of namespace scopes, root excluded
    pub fn namespace_count(&self) -> usize {
        self.scopes.len() - 1
    }

    fn duplicate(
        &self,
        scope: ScopeId,
        name: &str,
        previous: SourceLocation,
        location: SourceLocation,
    ) -> SemanticError {
        SemanticError::DuplicateName {
            name: name.to_string(),
            scope: self.scope_path(scope).to_string(),
            previous,
            location,
        }
    }
}
