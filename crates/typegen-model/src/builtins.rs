//! Built-in nodes injected after parsing: the root object type, primitive
//! scalars and the comparison/equality interface placeholders.

use smol_str::SmolStr;

use crate::error::GraphError;
use crate::graph::Graph;
use crate::member::{Member, MemberId, MemberKind, TypeInfo, TypeKind};
use crate::type_ref::TypeReference;

pub const ROOT_OBJECT: &str = "Object";

struct Primitive {
    name: &'static str,
    kind: &'static str,
    /// Name used as the generic argument of the interface placeholders.
    managed: &'static str,
    aliases: &'static [&'static str],
    is_value_type: bool,
}

const PRIMITIVES: &[Primitive] = &[
    Primitive { name: "bool", kind: "BOOL", managed: "bool", aliases: &["gboolean"], is_value_type: true },
    Primitive { name: "double", kind: "DOUBLE", managed: "double", aliases: &["gdouble"], is_value_type: true },
    Primitive { name: "float", kind: "FLOAT", managed: "float", aliases: &["gfloat"], is_value_type: true },
    Primitive { name: "guint64", kind: "UINT64", managed: "ulong", aliases: &["uint64_t", "unsigned long long"], is_value_type: true },
    Primitive { name: "gint64", kind: "INT64", managed: "long", aliases: &["int64_t", "long long"], is_value_type: true },
    Primitive { name: "guint32", kind: "UINT32", managed: "uint", aliases: &["uint32_t", "unsigned int", "unsigned", "guint"], is_value_type: true },
    Primitive { name: "gint32", kind: "INT32", managed: "int", aliases: &["int32_t", "int", "gint"], is_value_type: true },
    Primitive { name: "char*", kind: "STRING", managed: "string", aliases: &["string"], is_value_type: false },
    Primitive { name: "TimeSpan", kind: "TIMESPAN", managed: "TimeSpan", aliases: &[], is_value_type: true },
    Primitive { name: "gunichar", kind: "CHAR", managed: "char", aliases: &["char"], is_value_type: true },
];

const GENERIC_INTERFACES: &[(&str, &str)] = &[("IComparable", "ICOMPARABLE"), ("IEquatable", "IEQUATABLE")];

/// Inject the built-in nodes. Names already declared by a header are left
/// alone.
pub fn inject_builtins(graph: &mut Graph) -> Result<(), GraphError> {
    let root = graph.root();

    let object = match graph.find_type(ROOT_OBJECT) {
        Some(existing) => existing,
        None => add_synthetic(graph, root, ROOT_OBJECT, "OBJECT", TypeKind::Class, false, None, Vec::new())?,
    };
    mark_included(graph, object);

    let comparable = match graph.find_type("IComparable") {
        Some(existing) => existing,
        None => add_synthetic(graph, root, "IComparable", "ICOMPARABLE", TypeKind::Interface, false, None, Vec::new())?,
    };
    mark_included(graph, comparable);

    for primitive in PRIMITIVES {
        let mut interfaces = vec![TypeReference::named("IComparable")];
        for (interface, kind) in GENERIC_INTERFACES {
            let name = format!("{}<{}>", interface, primitive.managed);
            if graph.find_type(&name).is_none() {
                let kind = format!("{}_{}", kind, primitive.kind);
                add_synthetic(graph, root, &name, &kind, TypeKind::Interface, false, None, Vec::new())?;
            }
            interfaces.push(TypeReference::named(name));
        }

        if graph.find_type(primitive.name).is_some() {
            tracing::debug!(name = primitive.name, "built-in already declared by a header");
            continue;
        }
        let id = add_synthetic(
            graph,
            root,
            primitive.name,
            primitive.kind,
            TypeKind::Primitive,
            primitive.is_value_type,
            Some(TypeReference::named(ROOT_OBJECT)),
            interfaces,
        )?;
        for alias in primitive.aliases {
            graph.add_alias(alias, id);
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn add_synthetic(
    graph: &mut Graph,
    parent: MemberId,
    name: &str,
    kind: &str,
    type_kind: TypeKind,
    is_value_type: bool,
    base: Option<TypeReference>,
    interfaces: Vec<TypeReference>,
) -> Result<MemberId, GraphError> {
    let mut info = TypeInfo::new(type_kind).with_base(base);
    info.is_value_type = is_value_type;
    info.interfaces = interfaces;
    info.is_synthetic = true;
    info.include_in_kinds = true;
    info.kind_override = Some(SmolStr::new(kind));
    graph.add_child(parent, Member::new(name, MemberKind::Type(info)))
}

fn mark_included(graph: &mut Graph, id: MemberId) {
    if let Some(info) = graph.type_info_mut(id) {
        info.include_in_kinds = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_are_resolvable_by_alias() {
        let mut graph = Graph::new();
        inject_builtins(&mut graph).unwrap();

        let int = graph.find_type("int").unwrap();
        assert_eq!(graph.kind_name(int), "INT32");
        assert_eq!(graph.find_type("gint32"), Some(int));

        let string = graph.resolve(&TypeReference::from_spelling("const char *")).unwrap();
        assert_eq!(graph.kind_name(string), "STRING");
    }

    #[test]
    fn test_primitives_wired_to_interfaces() {
        let mut graph = Graph::new();
        inject_builtins(&mut graph).unwrap();

        let boolean = graph.find_type("bool").unwrap();
        let interfaces: Vec<_> = graph
            .type_info(boolean)
            .unwrap()
            .interfaces
            .iter()
            .map(|i| i.name.to_string())
            .collect();
        assert_eq!(interfaces, vec!["IComparable", "IComparable<bool>", "IEquatable<bool>"]);

        let equatable = graph.find_type("IEquatable<bool>").unwrap();
        assert_eq!(graph.kind_name(equatable), "IEQUATABLE_BOOL");
    }

    #[test]
    fn test_primitives_derive_from_object() {
        let mut graph = Graph::new();
        inject_builtins(&mut graph).unwrap();
        let object = graph.find_type(ROOT_OBJECT).unwrap();
        let double = graph.find_type("double").unwrap();
        assert_eq!(graph.base(double), Some(object));
        assert!(graph.type_info(double).unwrap().is_value_type);
    }

    #[test]
    fn test_declared_object_is_reused() {
        let mut graph = Graph::new();
        let root = graph.root();
        let declared = graph
            .add_child(root, Member::new("Object", MemberKind::Type(TypeInfo::new(TypeKind::Class))))
            .unwrap();
        inject_builtins(&mut graph).unwrap();
        assert_eq!(graph.find_type(ROOT_OBJECT), Some(declared));
        assert!(graph.type_info(declared).unwrap().include_in_kinds);
    }
}
