//! Textual type occurrences and their cross-language mappings.

use smol_str::SmolStr;
use std::fmt;

/// A type as written in a header: `const char *`, `Brush *`, `Point &`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypeReference {
    /// Base spelling without qualifiers (`char`, `Type::Kind`, `unsigned int`).
    pub name: SmolStr,
    pub is_const: bool,
    pub pointer_depth: u8,
    pub is_reference: bool,
    /// Marshalled as an `out` parameter.
    pub is_out: bool,
    /// Marshalled as a `ref` parameter.
    pub is_ref: bool,
    /// Raw template arguments, without the angle brackets.
    pub template_args: Option<String>,
}

impl TypeReference {
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn pointer_to(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            pointer_depth: 1,
            ..Self::default()
        }
    }

    pub fn void() -> Self {
        Self::named("void")
    }

    /// Parse a spelling from an annotation value such as `PropertyType=char*`.
    pub fn from_spelling(spelling: &str) -> Self {
        let mut rest = spelling.trim();
        let mut ty = Self::default();

        if let Some(stripped) = rest.strip_prefix("const ") {
            ty.is_const = true;
            rest = stripped.trim_start();
        }
        while let Some(stripped) = rest.strip_suffix('*') {
            ty.pointer_depth += 1;
            rest = stripped.trim_end();
        }
        if let Some(stripped) = rest.strip_suffix('&') {
            ty.is_reference = true;
            rest = stripped.trim_end();
        }
        if let Some(open) = rest.find('<') {
            if let Some(args) = rest[open + 1..].strip_suffix('>') {
                ty.template_args = Some(args.trim().to_string());
                rest = rest[..open].trim_end();
            }
        }
        ty.name = SmolStr::new(rest);
        ty
    }

    pub fn is_void(&self) -> bool {
        self.name == "void" && self.pointer_depth == 0 && !self.is_reference
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }

    /// The spelling used in generated native code.
    pub fn native(&self) -> String {
        let mut out = String::new();
        if self.is_const {
            out.push_str("const ");
        }
        out.push_str(&self.name);
        if let Some(args) = &self.template_args {
            out.push('<');
            out.push_str(args);
            out.push('>');
        }
        if self.pointer_depth > 0 {
            out.push(' ');
            for _ in 0..self.pointer_depth {
                out.push('*');
            }
        }
        if self.is_reference {
            out.push_str(" &");
        }
        out
    }

    /// The same type with qualifiers that do not change its identity removed.
    pub fn without_const(&self) -> Self {
        Self {
            is_const: false,
            ..self.clone()
        }
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.native())
    }
}

/// How a type crosses the native/managed/script boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marshal {
    Void,
    Bool,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    Float,
    Char,
    /// `char *` / `const char *`.
    String,
    /// Untyped pointer (`void *`, `gpointer`).
    Pointer,
    /// The native kind enumeration.
    Kind,
    /// Trailing error slot that maps to a managed exception.
    Error,
    /// A parsed enumeration, passed as an integer.
    Enum(SmolStr),
    /// Pointer to a parsed reference type.
    Object(SmolStr),
    /// A parsed value type passed by value.
    ValueStruct(SmolStr),
    /// A parsed value type passed by pointer or reference.
    StructRef(SmolStr),
    /// Pointer to a primitive.
    PrimitiveRef(Box<Marshal>),
    /// `T **`.
    OutPointer,
    /// No mapping is known.
    Unknown(String),
}

/// Where a type occurs; strings need different handling as return values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Parameter,
    Return,
}

impl Marshal {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Marshal::Unknown(_))
    }

    /// Foreign-function (P/Invoke) spelling.
    pub fn foreign(&self, ty: &TypeReference, position: Position) -> String {
        let direction = if ty.is_out { "out" } else { "ref" };
        match self {
            Marshal::Void => "void".to_string(),
            Marshal::Bool => "bool".to_string(),
            Marshal::Int32 => "int".to_string(),
            Marshal::UInt32 => "uint".to_string(),
            Marshal::Int64 => "long".to_string(),
            Marshal::UInt64 => "ulong".to_string(),
            Marshal::Double => "double".to_string(),
            Marshal::Float => "float".to_string(),
            Marshal::Char => "char".to_string(),
            Marshal::String => match position {
                Position::Parameter => "string".to_string(),
                Position::Return => "IntPtr".to_string(),
            },
            Marshal::Pointer | Marshal::Object(_) | Marshal::Unknown(_) => "IntPtr".to_string(),
            Marshal::Kind => "Kind".to_string(),
            Marshal::Error => "out MoonError".to_string(),
            Marshal::Enum(_) => "int".to_string(),
            Marshal::ValueStruct(name) => name.to_string(),
            Marshal::StructRef(name) => match position {
                Position::Parameter => format!("{} {}", direction, name),
                Position::Return => "IntPtr".to_string(),
            },
            Marshal::PrimitiveRef(inner) => match position {
                Position::Parameter => format!("{} {}", direction, inner.foreign(ty, position)),
                Position::Return => "IntPtr".to_string(),
            },
            Marshal::OutPointer => match position {
                Position::Parameter => "out IntPtr".to_string(),
                Position::Return => "IntPtr".to_string(),
            },
        }
    }

    /// Managed spelling of the value a wrapper exposes (strings become `string`).
    pub fn managed(&self, ty: &TypeReference) -> String {
        match self {
            Marshal::String => "string".to_string(),
            _ => self.foreign(ty, Position::Parameter),
        }
    }

    /// Script-bridge primitive code, if the type can cross the bridge.
    pub fn bridge_code(&self) -> Option<char> {
        match self {
            Marshal::Void => Some('v'),
            Marshal::Bool => Some('b'),
            Marshal::Int32 | Marshal::UInt32 | Marshal::Char | Marshal::Kind | Marshal::Enum(_) => {
                Some('i')
            }
            Marshal::Int64 | Marshal::UInt64 | Marshal::Double | Marshal::Float => Some('d'),
            Marshal::String => Some('s'),
            Marshal::Object(_) => Some('o'),
            _ => None,
        }
    }
}

/// Classify a base spelling that names a primitive, independent of any graph.
pub(crate) fn primitive_marshal(name: &str) -> Option<Marshal> {
    let m = match name {
        "void" => Marshal::Void,
        "bool" | "gboolean" => Marshal::Bool,
        "int" | "gint" | "gint32" | "int32_t" | "signed int" | "signed" => Marshal::Int32,
        "guint" | "guint32" | "uint32_t" | "unsigned int" | "unsigned" => Marshal::UInt32,
        "gint64" | "int64_t" | "long long" | "TimeSpan" => Marshal::Int64,
        "guint64" | "uint64_t" | "unsigned long long" => Marshal::UInt64,
        "double" | "gdouble" => Marshal::Double,
        "float" | "gfloat" => Marshal::Float,
        "gunichar" => Marshal::Char,
        "gpointer" => Marshal::Pointer,
        "Type::Kind" | "Kind" => Marshal::Kind,
        _ => return None,
    };
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_spelling() {
        let ty = TypeReference::from_spelling("const char *");
        assert!(ty.is_const);
        assert_eq!(ty.pointer_depth, 1);
        assert_eq!(ty.name, "char");

        let ty = TypeReference::from_spelling("Brush*");
        assert_eq!(ty.name, "Brush");
        assert_eq!(ty.pointer_depth, 1);

        let ty = TypeReference::from_spelling("List<Value *>");
        assert_eq!(ty.name, "List");
        assert_eq!(ty.template_args.as_deref(), Some("Value *"));
    }

    #[test]
    fn test_native_spelling() {
        let ty = TypeReference::from_spelling("const char*");
        assert_eq!(ty.native(), "const char *");

        let mut ty = TypeReference::pointer_to("Widget");
        ty.pointer_depth = 2;
        assert_eq!(ty.native(), "Widget **");
    }

    #[test]
    fn test_string_return_is_pointer() {
        let ty = TypeReference::from_spelling("char *");
        assert_eq!(Marshal::String.foreign(&ty, Position::Return), "IntPtr");
        assert_eq!(Marshal::String.foreign(&ty, Position::Parameter), "string");
        assert_eq!(Marshal::String.managed(&ty), "string");
    }

    #[test]
    fn test_out_struct_parameter() {
        let mut ty = TypeReference::pointer_to("Point");
        ty.is_out = true;
        let m = Marshal::StructRef("Point".into());
        assert_eq!(m.foreign(&ty, Position::Parameter), "out Point");
    }

    #[test]
    fn test_bridge_codes() {
        assert_eq!(Marshal::Int32.bridge_code(), Some('i'));
        assert_eq!(Marshal::String.bridge_code(), Some('s'));
        assert_eq!(Marshal::Object("Widget".into()).bridge_code(), Some('o'));
        assert_eq!(Marshal::Double.bridge_code(), Some('d'));
        assert_eq!(Marshal::Bool.bridge_code(), Some('b'));
        assert_eq!(Marshal::Void.bridge_code(), Some('v'));
        assert_eq!(Marshal::Pointer.bridge_code(), None);
    }
}
