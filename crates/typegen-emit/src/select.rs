//! Choosing which members an emitter projects.

use rustc_hash::FxHashSet;
use typegen_common::{Diagnostic, Diagnostics};
use typegen_model::{ForeignMethod, Graph, Marshal, MemberId, TypeReference, Visibility};

use crate::Model;

pub(crate) const C_BINDING: &str = "GenerateCBinding";
pub(crate) const P_INVOKE: &str = "GeneratePInvoke";
pub(crate) const JS_BINDING: &str = "GenerateJSBinding";

/// Methods opted into `key`, either directly or through their type, plus
/// automatic factories when `factories` is set. Ordered by foreign name.
pub(crate) fn bound_methods(
    graph: &Graph,
    key: &str,
    factories: bool,
    diagnostics: &mut Diagnostics,
) -> Vec<ForeignMethod> {
    let mut scopes = vec![graph.root()];
    scopes.extend(graph.declared_types());

    let mut chosen: Vec<MemberId> = Vec::new();
    for scope in scopes {
        let type_wide = scope != graph.root() && graph.get(scope).annotations.contains(key);
        for method in graph.methods(scope) {
            let member = graph.get(method);
            let Some(info) = member.as_method() else { continue };
            if info.is_destructor || !(type_wide || member.annotations.contains(key)) {
                continue;
            }
            if member.visibility != Visibility::Public {
                diagnostics.warn(format!(
                    "'{}' is not public and cannot be bound",
                    qualified_method(graph, method)
                ));
                continue;
            }
            if info.is_variadic {
                diagnostics.warn(format!(
                    "'{}' takes variable arguments and cannot be bound",
                    qualified_method(graph, method)
                ));
                continue;
            }
            if info.is_constructor && graph.enclosing_type(method).is_some_and(|t| graph.is_abstract(t)) {
                continue;
            }
            chosen.push(method);
        }
        if factories && scope != graph.root() && graph.has_factory(scope) {
            if let Some(ctor) = graph.default_constructor(scope) {
                if !chosen.contains(&ctor) {
                    chosen.push(ctor);
                }
            }
        }
    }

    let mut methods: Vec<ForeignMethod> = chosen
        .into_iter()
        .filter_map(|m| graph.foreign_method(m))
        .collect();
    methods.sort_by(|a, b| a.name.cmp(&b.name));

    let mut seen = FxHashSet::default();
    methods.retain(|m| {
        if seen.insert(m.name.clone()) {
            true
        } else {
            diagnostics.warn(format!(
                "'{}' is produced by more than one method; only the first is bound",
                m.name
            ));
            false
        }
    });
    methods
}

/// `Widget::GetWidth`, or the bare name of a global function.
pub(crate) fn qualified_method(graph: &Graph, method: MemberId) -> String {
    let name = &graph.get(method).name;
    match graph.enclosing_type(method) {
        Some(owner) => format!("{}::{}", graph.qualified_name(owner), name),
        None => name.to_string(),
    }
}

/// Header file names declaring `ids`, sorted and deduplicated.
pub(crate) fn includes(model: &Model<'_>, ids: impl IntoIterator<Item = MemberId>) -> Vec<String> {
    let mut names: Vec<String> = ids
        .into_iter()
        .filter_map(|id| model.graph.get(id).source)
        .filter_map(|source| model.sources.get(source))
        .map(|file| file.file_name().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// A native declaration: `Widget *instance`, `double width`.
pub(crate) fn declare(ty: &TypeReference, name: &str) -> String {
    let native = ty.native();
    if native.ends_with('*') || native.ends_with('&') {
        format!("{}{}", native, name)
    } else {
        format!("{} {}", native, name)
    }
}

/// Parameter name, or a positional placeholder for unnamed parameters.
pub(crate) fn param_name(name: &str, index: usize) -> String {
    if name.is_empty() {
        format!("arg{}", index)
    } else {
        name.to_string()
    }
}

const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "base", "bool", "byte", "char", "checked", "class", "const", "decimal", "default",
    "delegate", "double", "event", "explicit", "extern", "false", "fixed", "float", "in", "int",
    "interface", "internal", "is", "lock", "long", "namespace", "new", "null", "object",
    "operator", "out", "override", "params", "private", "protected", "public", "readonly", "ref",
    "sealed", "short", "sizeof", "stackalloc", "static", "string", "struct", "this", "throw",
    "true", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile",
];

/// Escape managed keywords used as identifiers (`@object`).
pub(crate) fn csharp_ident(name: &str) -> String {
    if CSHARP_KEYWORDS.contains(&name) {
        format!("@{}", name)
    } else {
        name.to_string()
    }
}

/// What a C binding returns when its instance is `NULL`.
pub(crate) fn null_instance_return(graph: &Graph, ty: &TypeReference) -> String {
    if ty.is_void() {
        return "return;".to_string();
    }
    if ty.is_pointer() {
        return "return NULL;".to_string();
    }
    match graph.marshal(ty) {
        Marshal::Bool => "return false;".to_string(),
        Marshal::ValueStruct(_) | Marshal::Unknown(_) => format!("return {} ();", ty.without_const().native()),
        _ => format!("return ({}) 0;", ty.without_const().native()),
    }
}

/// Report a semantic gap once and continue.
pub(crate) fn warn_unknown(diagnostics: &mut Diagnostics, ty: &TypeReference, context: &str) {
    diagnostics.report(
        Diagnostic::warning(format!("no mapping for type '{}' in '{}'", ty.native(), context))
            .with_help("the type is marshalled as IntPtr; add a mapping or change the signature"),
    );
}
