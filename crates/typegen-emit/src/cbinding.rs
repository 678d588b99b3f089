//! `cbinding.h` / `cbinding.cpp`: C entry points for native methods.

use typegen_common::Diagnostics;
use typegen_model::{ForeignMethod, Graph, MemberId, TypeKind};

use crate::select::{bound_methods, declare, includes, null_instance_return, param_name, C_BINDING};
use crate::writer::CodeWriter;
use crate::Model;

/// Both halves of the C binding plus the forward declarations the header
/// needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CBindings {
    pub header: String,
    pub source: String,
    /// `class Widget;` lines, sorted.
    pub forward_declarations: Vec<String>,
}

/// Project every method opted into C bindings (and every automatic factory).
pub fn emit_cbindings(model: &Model<'_>, diagnostics: &mut Diagnostics) -> CBindings {
    let graph = model.graph;
    // Global functions are already C entry points.
    let methods: Vec<ForeignMethod> = bound_methods(graph, C_BINDING, true, diagnostics)
        .into_iter()
        .filter(|m| m.owner.is_some())
        .collect();

    let forward_declarations = forward_declarations(graph, &methods);
    let header = header(model, &methods, &forward_declarations);
    let source = source(model, &methods);
    CBindings {
        header,
        source,
        forward_declarations,
    }
}

/// Every parsed class, struct or union named in a binding signature.
fn forward_declarations(graph: &Graph, methods: &[ForeignMethod]) -> Vec<String> {
    let mut ids: Vec<MemberId> = Vec::new();
    for method in methods {
        let types = std::iter::once(&method.return_type).chain(method.params.iter().map(|p| &p.ty));
        for ty in types {
            let Some(id) = graph.resolve(ty) else { continue };
            // Nested types cannot be forward declared.
            if graph.get(id).parent != Some(graph.root()) {
                continue;
            }
            if graph
                .type_info(id)
                .is_some_and(|t| !t.is_synthetic && matches!(t.kind, TypeKind::Class | TypeKind::Struct | TypeKind::Union))
            {
                ids.push(id);
            }
        }
    }
    let mut lines: Vec<String> = ids
        .into_iter()
        .filter_map(|id| {
            let info = graph.type_info(id)?;
            Some(format!("{} {};", info.kind.keyword(), graph.get(id).name))
        })
        .collect();
    lines.sort();
    lines.dedup();
    lines
}

fn prototype(method: &ForeignMethod) -> (String, String) {
    let params: Vec<String> = method
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| declare(&p.ty, &param_name(&p.name, i)))
        .collect();
    let params = if params.is_empty() {
        "void".to_string()
    } else {
        params.join(", ")
    };
    (method.return_type.native(), format!("{} ({})", method.name, params))
}

fn header(model: &Model<'_>, methods: &[ForeignMethod], forward_declarations: &[String]) -> String {
    let graph = model.graph;
    let mut w = CodeWriter::native();
    w.writeln("#ifndef __MOON_CBINDING_H__");
    w.writeln("#define __MOON_CBINDING_H__");
    w.blank();
    w.writeln("#include <glib.h>");
    w.writeln("#include \"enums.h\"");
    w.blank();

    if !model.typedefs.is_empty() {
        for typedef in model.typedefs {
            w.writeln(typedef);
        }
        w.blank();
    }

    for line in forward_declarations {
        w.writeln(line);
    }
    if !forward_declarations.is_empty() {
        w.blank();
    }

    w.writeln("G_BEGIN_DECLS");
    let mut current: Option<MemberId> = None;
    for method in methods {
        if method.owner != current {
            current = method.owner;
            if let Some(owner) = current {
                w.blank();
                w.writeln("/**");
                w.writeln(&format!(" * {}", graph.qualified_name(owner)));
                w.writeln(" **/");
            }
        }
        let (ret, rest) = prototype(method);
        let sep = if ret.ends_with('*') { "" } else { " " };
        w.writeln(&format!("{}{}{};", ret, sep, rest));
    }
    w.blank();
    w.writeln("G_END_DECLS");
    w.blank();
    w.writeln("#endif");
    w.finish()
}

fn source(model: &Model<'_>, methods: &[ForeignMethod]) -> String {
    let graph = model.graph;
    let mut w = CodeWriter::native();
    w.writeln("#include <config.h>");
    w.blank();
    w.writeln("#include \"cbinding.h\"");
    for include in includes(model, methods.iter().filter_map(|m| m.owner)) {
        w.writeln(&format!("#include \"{}\"", include));
    }

    for method in methods {
        let Some(owner) = method.owner else { continue };
        let owner_name = graph.qualified_name(owner);
        let native = graph.get(method.method);
        let (ret, rest) = prototype(method);

        let args: Vec<String> = method
            .params
            .iter()
            .enumerate()
            .skip(usize::from(method.has_instance))
            .map(|(i, p)| param_name(&p.name, i))
            .collect();
        let args = args.join(", ");

        w.blank();
        w.writeln(&ret);
        w.writeln(&rest);
        w.open("{");
        let returns = if method.return_type.is_void() { "" } else { "return " };
        if method.is_constructor {
            w.writeln(&format!("return new {} ({});", owner_name, args));
        } else if method.is_static {
            w.writeln(&format!("{}{}::{} ({});", returns, owner_name, native.name, args));
        } else {
            w.writeln("if (instance == NULL)");
            w.indent();
            w.writeln(&null_instance_return(graph, &method.return_type));
            w.dedent();
            w.blank();
            w.writeln(&format!("{}instance->{} ({});", returns, native.name, args));
        }
        w.close("}");
    }
    w.finish()
}
