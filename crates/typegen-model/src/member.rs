//! Nodes of the member tree.

use indexmap::IndexMap;
use smol_str::SmolStr;
use std::cell::OnceCell;
use typegen_common::SourceId;

use crate::annotation::Annotations;
use crate::type_ref::TypeReference;

/// Index of a member in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub(crate) u32);

impl MemberId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Access level of a member within its enclosing type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Struct,
    Union,
    Enum,
    /// Synthetic interface placeholder.
    Interface,
    /// Synthetic primitive scalar.
    Primitive,
}

impl TypeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::Interface => "interface",
            TypeKind::Primitive => "primitive",
        }
    }
}

/// A node of the tree: the global scope, a type, a method or a field.
#[derive(Debug)]
pub struct Member {
    pub name: SmolStr,
    pub parent: Option<MemberId>,
    /// Children keyed by signature.
    pub children: IndexMap<SmolStr, MemberId>,
    pub source: Option<SourceId>,
    pub line: u32,
    pub annotations: Annotations,
    pub visibility: Visibility,
    pub kind: MemberKind,
    pub(crate) signature: OnceCell<SmolStr>,
}

#[derive(Debug)]
pub enum MemberKind {
    Scope,
    Type(TypeInfo),
    Method(MethodInfo),
    Field(FieldInfo),
}

impl Member {
    pub fn new(name: impl Into<SmolStr>, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: IndexMap::new(),
            source: None,
            line: 0,
            annotations: Annotations::new(),
            visibility: Visibility::Public,
            kind,
            signature: OnceCell::new(),
        }
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn at(mut self, source: Option<SourceId>, line: u32) -> Self {
        self.source = source;
        self.line = line;
        self
    }

    /// Uniqueness key within the parent. Methods include their parameter
    /// types so overloads can coexist.
    pub fn signature(&self) -> &str {
        self.signature.get_or_init(|| self.base_signature())
    }

    pub(crate) fn base_signature(&self) -> SmolStr {
        match &self.kind {
            MemberKind::Method(method) => {
                let params: Vec<String> = method.params.iter().map(|p| p.ty.native()).collect();
                let prefix = if method.is_destructor { "~" } else { "" };
                SmolStr::new(format!("{}{}({})", prefix, self.name, params.join(", ")))
            }
            _ => self.name.clone(),
        }
    }

    /// Anonymous structs, unions and enums get a counter appended to their
    /// signature when inserted.
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    pub fn as_type(&self) -> Option<&TypeInfo> {
        match &self.kind {
            MemberKind::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodInfo> {
        match &self.kind {
            MemberKind::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&FieldInfo> {
        match &self.kind {
            MemberKind::Field(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self.kind, MemberKind::Type(_))
    }
}

/// Type-specific data.
#[derive(Debug)]
pub struct TypeInfo {
    pub kind: TypeKind,
    pub is_value_type: bool,
    /// The first public base class; further bases are not modelled.
    pub base: Option<TypeReference>,
    pub interfaces: Vec<TypeReference>,
    /// Injected rather than parsed.
    pub is_synthetic: bool,
    /// Set by the annotation or by propagation along the base chain.
    pub include_in_kinds: bool,
    /// Fixed enumeration identifier for built-ins.
    pub kind_override: Option<SmolStr>,
    pub(crate) kind_name: OnceCell<String>,
    pub(crate) events: OnceCell<Vec<MemberId>>,
    pub(crate) default_constructor: OnceCell<Option<MemberId>>,
}

impl TypeInfo {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            is_value_type: matches!(kind, TypeKind::Struct | TypeKind::Enum),
            base: None,
            interfaces: Vec::new(),
            is_synthetic: false,
            include_in_kinds: false,
            kind_override: None,
            kind_name: OnceCell::new(),
            events: OnceCell::new(),
            default_constructor: OnceCell::new(),
        }
    }

    pub fn with_base(mut self, base: Option<TypeReference>) -> Self {
        self.base = base;
        self
    }

    pub fn is_enum(&self) -> bool {
        self.kind == TypeKind::Enum
    }
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: SmolStr,
    pub ty: TypeReference,
    /// Default argument text, unevaluated.
    pub default: Option<String>,
    pub annotations: Annotations,
}

impl Parameter {
    pub fn new(name: impl Into<SmolStr>, ty: TypeReference) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            annotations: Annotations::new(),
        }
    }
}

/// Method-specific data.
#[derive(Debug, Clone, Default)]
pub struct MethodInfo {
    pub return_type: TypeReference,
    pub params: Vec<Parameter>,
    pub is_constructor: bool,
    pub is_destructor: bool,
    pub is_virtual: bool,
    pub is_static: bool,
    /// Pure virtual (`= 0`).
    pub is_abstract: bool,
    pub is_const: bool,
    pub is_variadic: bool,
}

/// Field-specific data, including enum members.
#[derive(Debug, Clone, Default)]
pub struct FieldInfo {
    pub ty: TypeReference,
    pub is_const: bool,
    pub is_static: bool,
    pub is_extern: bool,
    /// Bit-field width text.
    pub bits: Option<String>,
    /// Array extent text.
    pub array: Option<String>,
    /// Initializer or enum value expression, captured as text.
    pub value: Option<String>,
}
