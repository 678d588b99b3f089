//! `type.g.cpp`: the native runtime type table.

use typegen_common::Diagnostics;
use typegen_model::MemberId;

use crate::select::includes;
use crate::writer::CodeWriter;
use crate::Model;

/// One row per kind: parent kind, value flag, name, event counts and names,
/// interface kinds, create function and content property.
pub fn emit_type_table(model: &Model<'_>, diagnostics: &mut Diagnostics) -> String {
    let graph = model.graph;
    let kinds = graph.kinds();
    let factories: Vec<MemberId> = kinds.iter().copied().filter(|t| graph.has_factory(*t)).collect();

    let mut w = CodeWriter::native();
    w.writeln("#include <config.h>");
    w.blank();
    w.writeln("#include <stdlib.h>");
    w.writeln("#include \"type.h\"");
    w.writeln("#include \"cbinding.h\"");
    for include in includes(model, factories.iter().copied()) {
        w.writeln(&format!("#include \"{}\"", include));
    }
    w.blank();

    for &ty in &kinds {
        let events = graph.events(ty);
        if events.is_empty() {
            continue;
        }
        let names: Vec<String> = events.iter().map(|e| format!("\"{}\"", e.name)).collect();
        w.writeln(&format!(
            "static const char *{}_Events [] = {{ {}, NULL }};",
            table_ident(model, ty),
            names.join(", ")
        ));
    }

    for &ty in &kinds {
        let Some(info) = graph.type_info(ty) else { continue };
        if info.interfaces.is_empty() {
            continue;
        }
        let mut interfaces = Vec::with_capacity(info.interfaces.len());
        for interface in &info.interfaces {
            let resolved = graph.resolve(interface);
            if resolved.is_none() {
                diagnostics.warn(format!(
                    "interface '{}' of '{}' could not be resolved",
                    interface.name,
                    graph.qualified_name(ty)
                ));
            }
            interfaces.push(graph.kind_ref(resolved));
        }
        w.writeln(&format!(
            "static const Type::Kind {}_Interfaces [] = {{ {} }};",
            table_ident(model, ty),
            interfaces.join(", ")
        ));
    }
    w.blank();

    w.open("Type type_infos [] = {");
    w.writeln("{ Type::INVALID, Type::INVALID, false, \"INVALID\", 0, 0, NULL, 0, NULL, NULL, NULL },");
    for &ty in &kinds {
        let Some(info) = graph.type_info(ty) else { continue };
        let prefix = table_ident(model, ty);
        let local_events = graph.event_fields(ty).len();
        let total_events = graph.inherited_event_count(ty) + local_events;
        let event_names = if local_events > 0 {
            format!("{}_Events", prefix)
        } else {
            "NULL".to_string()
        };
        let interface_names = if info.interfaces.is_empty() {
            "NULL".to_string()
        } else {
            format!("{}_Interfaces", prefix)
        };
        let create = if factories.contains(&ty) {
            graph
                .default_constructor(ty)
                .and_then(|ctor| graph.foreign_method(ctor))
                .map(|f| format!("(create_inst_func *) {}", f.name))
                .unwrap_or_else(|| "NULL".to_string())
        } else {
            "NULL".to_string()
        };
        let content = graph
            .get(ty)
            .annotations
            .value("ContentProperty")
            .map(|c| format!("\"{}\"", c))
            .unwrap_or_else(|| "NULL".to_string());

        w.writeln(&format!(
            "{{ Type::{}, {}, {}, \"{}\", {}, {}, {}, {}, {}, {}, {} }},",
            graph.kind_name(ty),
            graph.kind_ref(graph.base(ty)),
            info.is_value_type,
            graph.get(ty).name,
            local_events,
            total_events,
            event_names,
            info.interfaces.len(),
            interface_names,
            create,
            content,
        ));
    }
    w.writeln("{ Type::LASTTYPE, Type::INVALID, false, NULL, 0, 0, NULL, 0, NULL, NULL, NULL }");
    w.close("};");
    w.finish()
}

/// Mangled name usable as a C identifier (`char*` → `char_`).
fn table_ident(model: &Model<'_>, ty: MemberId) -> String {
    model
        .graph
        .mangled_type_name(ty)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
