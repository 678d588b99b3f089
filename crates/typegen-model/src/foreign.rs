//! Cross-language projection of methods.

use crate::graph::Graph;
use crate::member::{MemberId, Parameter, TypeKind};
use crate::type_ref::{primitive_marshal, Marshal, TypeReference};

/// Convert a CamelCase identifier to snake_case (`UIElement` → `ui_element`).
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
                let boundary = prev.is_ascii_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_ascii_uppercase() && next_lower);
                if boundary {
                    out.push('_');
                }
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// The foreign-callable counterpart of a native method.
#[derive(Debug, Clone)]
pub struct ForeignMethod {
    pub method: MemberId,
    /// Declaring type; `None` for global functions.
    pub owner: Option<MemberId>,
    /// Mangled C name.
    pub name: String,
    pub return_type: TypeReference,
    /// Parameters including the injected instance parameter.
    pub params: Vec<Parameter>,
    pub is_static: bool,
    pub is_constructor: bool,
    /// Whether `params[0]` is the injected instance parameter.
    pub has_instance: bool,
}

impl ForeignMethod {
    /// Parameter and return types with no known mapping.
    pub fn unknown_types<'a>(&'a self, graph: &Graph) -> Vec<&'a TypeReference> {
        std::iter::once(&self.return_type)
            .chain(self.params.iter().map(|p| &p.ty))
            .filter(|ty| graph.marshal(ty).is_unknown())
            .collect()
    }

    /// True when the last parameter is the error slot.
    pub fn has_error_slot(&self, graph: &Graph) -> bool {
        self.params
            .last()
            .is_some_and(|p| graph.marshal(&p.ty) == Marshal::Error)
    }

    /// Whether the managed side needs a wrapper around the raw declaration.
    pub fn needs_wrapper(&self, graph: &Graph) -> bool {
        graph.marshal(&self.return_type) == Marshal::String || self.has_error_slot(graph)
    }
}

impl Graph {
    /// Classify how `ty` crosses language boundaries.
    pub fn marshal(&self, ty: &TypeReference) -> Marshal {
        let name = ty.name.as_str();
        let indirection = ty.pointer_depth as usize + usize::from(ty.is_reference);

        match indirection {
            0 => {
                if let Some(m) = primitive_marshal(name) {
                    return m;
                }
                match self.resolve(ty).and_then(|id| self.type_info(id).map(|t| (id, t))) {
                    Some((_, info)) if info.kind == TypeKind::Enum => Marshal::Enum(ty.name.clone()),
                    Some((_, info)) if info.kind == TypeKind::Struct && info.is_value_type && !info.is_synthetic => {
                        Marshal::ValueStruct(ty.name.clone())
                    }
                    _ => Marshal::Unknown(ty.native()),
                }
            }
            1 => {
                if ty.pointer_depth == 1 && matches!(name, "char" | "gchar") {
                    return Marshal::String;
                }
                if ty.pointer_depth == 1 && name == "void" {
                    return Marshal::Pointer;
                }
                if name == "MoonError" {
                    return Marshal::Error;
                }
                if let Some(m) = primitive_marshal(name) {
                    return match m {
                        Marshal::Void | Marshal::Pointer => Marshal::Unknown(ty.native()),
                        other => Marshal::PrimitiveRef(Box::new(other)),
                    };
                }
                let Some(id) = self.resolve(ty) else {
                    return Marshal::Unknown(ty.native());
                };
                let Some(info) = self.type_info(id) else {
                    return Marshal::Unknown(ty.native());
                };
                match info.kind {
                    TypeKind::Enum => Marshal::PrimitiveRef(Box::new(Marshal::Enum(ty.name.clone()))),
                    _ if info.is_value_type => Marshal::StructRef(ty.name.clone()),
                    TypeKind::Class | TypeKind::Struct | TypeKind::Union | TypeKind::Interface => {
                        Marshal::Object(ty.name.clone())
                    }
                    TypeKind::Primitive => Marshal::Unknown(ty.native()),
                }
            }
            2 if ty.pointer_depth == 2 => Marshal::OutPointer,
            _ => Marshal::Unknown(ty.native()),
        }
    }

    /// Build the foreign counterpart of `method`.
    pub fn foreign_method(&self, method: MemberId) -> Option<ForeignMethod> {
        let member = self.get(method);
        let info = member.as_method()?;
        if info.is_destructor {
            return None;
        }
        let owner = self.enclosing_type(method);

        let name = match (member.annotations.value("CBindingName"), owner) {
            (Some(explicit), _) => explicit.to_string(),
            (None, None) => member.name.to_string(),
            (None, Some(owner)) => {
                let prefix = self.mangled_type_name(owner);
                if info.is_constructor {
                    format!("{}_new", prefix)
                } else {
                    format!("{}_{}", prefix, snake_case(&member.name))
                }
            }
        };

        let has_instance = owner.is_some() && !info.is_static && !info.is_constructor;
        let mut params = Vec::with_capacity(info.params.len() + 1);
        if let (true, Some(owner)) = (has_instance, owner) {
            params.push(Parameter::new(
                "instance",
                TypeReference::pointer_to(self.qualified_name(owner)),
            ));
        }
        params.extend(info.params.iter().cloned());

        let return_type = match (info.is_constructor, owner) {
            (true, Some(owner)) => TypeReference::pointer_to(self.qualified_name(owner)),
            _ => info.return_type.clone(),
        };

        Some(ForeignMethod {
            method,
            owner,
            name,
            return_type,
            params,
            is_static: info.is_static,
            is_constructor: info.is_constructor,
            has_instance,
        })
    }

    /// `Outer::Inner` → `outer_inner`.
    pub fn mangled_type_name(&self, ty: MemberId) -> String {
        self.qualified_name(ty)
            .split("::")
            .map(snake_case)
            .collect::<Vec<_>>()
            .join("_")
    }
}
