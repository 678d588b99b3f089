//! Event identifiers and managed event accessors.

use std::collections::BTreeMap;

use typegen_common::Diagnostics;
use typegen_model::{EventSlot, MemberId};

use crate::select::includes;
use crate::writer::CodeWriter;
use crate::Model;

/// Declared types with at least one event slot, by qualified name.
fn event_owners(model: &Model<'_>) -> Vec<MemberId> {
    model
        .graph
        .declared_types()
        .into_iter()
        .filter(|t| !model.graph.event_fields(*t).is_empty())
        .collect()
}

/// `events.g.cpp`: one static initializer per event slot.
pub fn emit_native_events(model: &Model<'_>) -> String {
    let graph = model.graph;
    let owners = event_owners(model);

    let mut w = CodeWriter::native();
    w.writeln("#include <config.h>");
    w.blank();
    for include in includes(model, owners.iter().copied()) {
        w.writeln(&format!("#include \"{}\"", include));
    }
    for ty in owners {
        w.blank();
        for event in graph.events(ty) {
            w.writeln(&format!(
                "const int {}::{}Event = {};",
                graph.qualified_name(ty),
                event.name,
                event.id
            ));
        }
    }
    w.finish()
}

/// `Events.g.cs`: the id table plus `add`/`remove` accessors on the managed
/// partial classes.
pub fn emit_managed_events(model: &Model<'_>, diagnostics: &mut Diagnostics) -> String {
    let graph = model.graph;
    let owners = event_owners(model);

    let mut w = CodeWriter::managed();
    w.writeln("using System;");
    w.writeln("using Mono;");
    w.blank();
    w.open("namespace Mono {");
    w.open("internal static class EventIds {");
    for &ty in &owners {
        for event in graph.events(ty) {
            w.writeln(&format!(
                "public const int {}_{}Event = {};",
                graph.get(ty).name,
                event.name,
                event.id
            ));
        }
    }
    w.close("}");
    w.close("}");

    let mut namespaces: BTreeMap<&str, Vec<(MemberId, Vec<EventSlot<'_>>)>> = BTreeMap::new();
    for &ty in &owners {
        let events: Vec<EventSlot<'_>> = graph
            .events(ty)
            .into_iter()
            .filter(|e| e.generate_managed_event)
            .collect();
        if events.is_empty() {
            continue;
        }
        match graph.get(ty).annotations.value("Namespace") {
            Some(namespace) => namespaces.entry(namespace).or_default().push((ty, events)),
            None => diagnostics.warn(format!(
                "'{}' declares managed events but has no Namespace annotation",
                graph.qualified_name(ty)
            )),
        }
    }

    for (namespace, types) in &namespaces {
        w.blank();
        w.open(&format!("namespace {} {{", namespace));
        for (i, (ty, events)) in types.iter().enumerate() {
            if i > 0 {
                w.blank();
            }
            let type_name = &graph.get(*ty).name;
            w.open(&format!("partial class {} {{", type_name));
            for (j, event) in events.iter().enumerate() {
                if j > 0 {
                    w.blank();
                }
                let id = format!("EventIds.{}_{}Event", type_name, event.name);
                if event.generate_managed_field {
                    w.writeln(&format!("static object {}Event = new object ();", event.name));
                    w.blank();
                }
                w.open(&format!("public event {} {} {{", event.delegate_type, event.name));
                w.writeln(&format!(
                    "add {{ RegisterEvent ({}, value, Events.Create{}Dispatcher (value)); }}",
                    id, event.delegate_type
                ));
                w.writeln(&format!("remove {{ UnregisterEvent ({}, value); }}", id));
                w.close("}");
            }
            w.close("}");
        }
        w.close("}");
    }
    w.finish()
}
