// AST (Abstract Syntax Tree) definitions for the declaration language

use serde::Serialize;
use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Built-in field types.
///
/// Spellings that share a width are kept as separate variants so that
/// re-emitted source uses the name the author wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    LongDouble,
    Char,
    String,
    Bool,
}

impl PrimitiveType {
    /// Canonical source spelling
    pub fn spelling(&self) -> &'static str {
        match self {
            PrimitiveType::Short => "short",
            PrimitiveType::UnsignedShort => "unsigned short",
            PrimitiveType::Int => "int",
            PrimitiveType::UnsignedInt => "unsigned int",
            PrimitiveType::Long => "long",
            PrimitiveType::UnsignedLong => "unsigned long",
            PrimitiveType::LongLong => "long long",
            PrimitiveType::UnsignedLongLong => "unsigned long long",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::UInt16 => "uint16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::UInt32 => "uint32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::UInt64 => "uint64",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::LongDouble => "long double",
            PrimitiveType::Char => "char",
            PrimitiveType::String => "string",
            PrimitiveType::Bool => "bool",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling())
    }
}

/// A possibly qualified type reference as written: `internal`,
/// `innerModule::internal`, `::A::innerModule::internal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedName {
    pub segments: Vec<String>,
    /// Leading `::` anchors lookup at the root scope
    pub absolute: bool,
    pub location: SourceLocation,
}

impl fmt::Display for ScopedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("::")?;
        }
        f.write_str(&self.segments.join("::"))
    }
}

/// Declared type of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    Primitive(PrimitiveType),
    Named(ScopedName),
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Primitive(p) => write!(f, "{}", p),
            TypeSpec::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Binary operators, loosest binding first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    BitOr,
    BitXor,
    BitAnd,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    /// Binding strength; higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            BinOp::BitOr => 1,
            BinOp::BitXor => 2,
            BinOp::BitAnd => 3,
            BinOp::Shl | BinOp::Shr => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 6,
        }
    }

    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            BinOp::BitOr | BinOp::BitXor | BinOp::BitAnd | BinOp::Shl | BinOp::Shr
        )
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::BitAnd => "&",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Plus,   // +x
    Neg,    // -x
    BitNot, // ~x
}

impl UnOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnOp::Plus => "+",
            UnOp::Neg => "-",
            UnOp::BitNot => "~",
        }
    }
}

/// Precision hint carried by a floating literal suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatSuffix {
    #[default]
    None,
    F,
    D,
    L,
}

/// Value of a decimal or `0x` hexadecimal integer literal, `None` on
/// overflow or malformed text.
pub fn parse_integer_literal(text: &str) -> Option<u128> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u128::from_str_radix(hex, 16).ok(),
        None => text.parse::<u128>().ok(),
    }
}

/// Literal category; the raw text lives in [`Literal::text`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Integer,
    Float(FloatSuffix),
    Char,
    String,
    Bool,
}

/// A literal exactly as it appeared in the source.
///
/// Char and string literals keep their quotes and escapes; the evaluator
/// decodes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub text: String,
}

/// Initializer expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal, SourceLocation),
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
}

impl Expr {
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::Literal(_, loc) => *loc,
            Expr::Unary { location, .. } | Expr::Binary { location, .. } => *location,
        }
    }
}

/// Right-hand side of `=` in a field declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    Expr(Expr),
    List {
        elements: Vec<Expr>,
        location: SourceLocation,
    },
}

impl Initializer {
    pub fn location(&self) -> SourceLocation {
        match self {
            Initializer::Expr(expr) => expr.location(),
            Initializer::List { location, .. } => *location,
        }
    }
}

/// One declarator of a struct member line
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub ty: TypeSpec,
    pub name: String,
    pub array_len: Option<u64>,
    pub init: Option<Initializer>,
    pub location: SourceLocation,
}

/// How a struct was introduced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructForm {
    /// `typedef struct Name { ... } Alias;`
    Typedef,
    /// `struct Name { ... };`
    Plain,
    /// `struct Name;`
    Forward,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub alias: Option<String>,
    pub form: StructForm,
    pub fields: Vec<FieldDecl>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub name: String,
    pub decls: Vec<Decl>,
    pub location: SourceLocation,
}

/// Declarations allowed at namespace level
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Namespace(NamespaceDecl),
    Struct(StructDecl),
}

impl Decl {
    pub fn location(&self) -> SourceLocation {
        match self {
            Decl::Namespace(ns) => ns.location,
            Decl::Struct(st) => st.location,
        }
    }
}

/// The unnamed root namespace of one source text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationUnit {
    pub decls: Vec<Decl>,
}

impl TranslationUnit {
    pub fn new() -> Self {
        TranslationUnit::default()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}
