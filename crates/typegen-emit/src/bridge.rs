//! `bridge.g.cpp`: script-bridge dispatch tables.
//!
//! Each bridged type gets a name→id table for its methods and events and an
//! invoke function whose cases check the argument list against the
//! primitive codes (`i s o d b v`), convert the arguments, call the native
//! method and convert the result back.

use typegen_common::Diagnostics;
use typegen_model::{ForeignMethod, Graph, Marshal, MemberId, Parameter, TypeReference};

use crate::select::{bound_methods, declare, includes, qualified_method, JS_BINDING};
use crate::writer::CodeWriter;
use crate::Model;

struct BridgeMethod {
    id_name: String,
    script_name: String,
    method: ForeignMethod,
    /// Codes of the script-visible parameters.
    codes: String,
    return_code: char,
}

struct BridgeType {
    ty: MemberId,
    methods: Vec<BridgeMethod>,
    events: Vec<(String, usize)>,
    prefix: String,
}

pub fn emit_bridge(model: &Model<'_>, diagnostics: &mut Diagnostics) -> String {
    let graph = model.graph;
    let types = collect(graph, diagnostics);

    let mut w = CodeWriter::native();
    w.writeln("#include <config.h>");
    w.blank();
    w.writeln("#include \"plugin.h\"");
    w.writeln("#include \"bridge.h\"");
    for include in includes(model, types.iter().map(|t| t.ty)) {
        w.writeln(&format!("#include \"{}\"", include));
    }
    w.blank();

    w.open("enum BridgeMethodId {");
    w.writeln("MoonId_Invalid = 0,");
    let mut next = 1;
    for t in &types {
        for m in &t.methods {
            w.writeln(&format!("{} = {},", m.id_name, next));
            next += 1;
        }
    }
    w.close("};");

    for t in &types {
        w.blank();
        mapping(&mut w, &t.prefix, &t.methods, &t.events);
        w.blank();
        invoke(&mut w, graph, t);
    }

    w.blank();
    w.open("const MoonBridgeType bridge_types [] = {");
    for t in &types {
        let events = if t.events.is_empty() {
            "NULL, 0".to_string()
        } else {
            format!("{0}_events, G_N_ELEMENTS ({0}_events)", t.prefix)
        };
        let methods = if t.methods.is_empty() {
            "NULL, 0".to_string()
        } else {
            format!("{0}_methods, G_N_ELEMENTS ({0}_methods)", t.prefix)
        };
        w.writeln(&format!(
            "{{ {}, {}, {}, (MoonInvokeFunc) {}_invoke }},",
            graph.kind_ref(Some(t.ty)),
            methods,
            events,
            t.prefix
        ));
    }
    w.writeln("{ Type::INVALID, NULL, 0, NULL, 0, NULL }");
    w.close("};");
    w.finish()
}

fn collect(graph: &Graph, diagnostics: &mut Diagnostics) -> Vec<BridgeType> {
    let methods = bound_methods(graph, JS_BINDING, false, diagnostics);
    let mut types = Vec::new();

    for ty in graph.declared_types() {
        let mut bridged = Vec::new();
        for method in methods.iter().filter(|m| m.owner == Some(ty)) {
            if method.is_constructor {
                diagnostics.warn(format!(
                    "constructor '{}' cannot be bridged",
                    qualified_method(graph, method.method)
                ));
                continue;
            }
            if let Some(b) = bridge_method(graph, ty, method, diagnostics) {
                bridged.push(b);
            }
        }
        bridged.sort_by(|a, b| a.script_name.cmp(&b.script_name));

        let mut events: Vec<(String, usize)> = graph
            .events(ty)
            .into_iter()
            .filter(|e| e.expose_to_script)
            .map(|e| (e.name.to_ascii_lowercase(), e.id))
            .collect();
        events.sort();

        if bridged.is_empty() && events.is_empty() {
            continue;
        }
        let prefix = graph
            .mangled_type_name(ty)
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        types.push(BridgeType {
            ty,
            methods: bridged,
            events,
            prefix,
        });
    }

    for method in methods.iter().filter(|m| m.owner.is_none()) {
        diagnostics.warn(format!("global function '{}' cannot be bridged", method.name));
    }
    types
}

fn bridge_method(
    graph: &Graph,
    ty: MemberId,
    method: &ForeignMethod,
    diagnostics: &mut Diagnostics,
) -> Option<BridgeMethod> {
    let native = graph.get(method.method);
    let context = qualified_method(graph, method.method);
    let mut codes = String::new();
    for p in script_params(graph, method) {
        match graph.marshal(&p.ty).bridge_code() {
            Some('v') | None => {
                diagnostics.warn(format!(
                    "parameter type '{}' of '{}' cannot cross the script bridge",
                    p.ty.native(),
                    context
                ));
                return None;
            }
            Some(code) => codes.push(code),
        }
    }
    let Some(return_code) = graph.marshal(&method.return_type).bridge_code() else {
        diagnostics.warn(format!(
            "return type '{}' of '{}' cannot cross the script bridge",
            method.return_type.native(),
            context
        ));
        return None;
    };

    Some(BridgeMethod {
        id_name: format!("MoonId_{}_{}", graph.get(ty).name, native.name),
        script_name: native.name.to_ascii_lowercase(),
        method: method.clone(),
        codes,
        return_code,
    })
}

/// Parameters visible to scripts: no instance, no error slot.
fn script_params<'m>(
    graph: &Graph,
    method: &'m ForeignMethod,
) -> impl Iterator<Item = &'m Parameter> + 'm {
    let error_slot = method.has_error_slot(graph);
    let count = method.params.len() - usize::from(error_slot);
    method.params[..count]
        .iter()
        .skip(usize::from(method.has_instance))
}

fn mapping(w: &mut CodeWriter, prefix: &str, methods: &[BridgeMethod], events: &[(String, usize)]) {
    if !methods.is_empty() {
        w.open(&format!("static const MoonNameIdMapping {}_methods [] = {{", prefix));
        for m in methods {
            w.writeln(&format!("{{ \"{}\", {} }},", m.script_name, m.id_name));
        }
        w.close("};");
    }
    if !events.is_empty() {
        if !methods.is_empty() {
            w.blank();
        }
        w.open(&format!("static const MoonNameIdMapping {}_events [] = {{", prefix));
        for (name, id) in events {
            w.writeln(&format!("{{ \"{}\", {} }},", name, id));
        }
        w.close("};");
    }
}

fn invoke(w: &mut CodeWriter, graph: &Graph, t: &BridgeType) {
    let owner = graph.qualified_name(t.ty);
    w.writeln("static bool");
    w.writeln(&format!(
        "{}_invoke ({} *instance, int id, const NPVariant *args, guint32 argCount, NPVariant *result)",
        t.prefix, owner
    ));
    w.open("{");
    w.writeln("switch (id) {");
    for m in &t.methods {
        case(w, graph, &owner, m);
    }
    w.writeln("}");
    w.blank();
    w.writeln("return false;");
    w.close("}");
}

fn case(w: &mut CodeWriter, graph: &Graph, owner: &str, m: &BridgeMethod) {
    let native = graph.get(m.method.method);
    w.open(&format!("case {}: {{", m.id_name));
    w.writeln(&format!("if (!check_arg_list (\"{}\", argCount, args))", m.codes));
    w.indent();
    w.writeln(&format!("THROW_JS_EXCEPTION (\"{}\");", native.name));
    w.dedent();

    let mut args = Vec::new();
    let mut strings = Vec::new();
    for (i, p) in script_params(graph, &m.method).enumerate() {
        let name = format!("arg{}", i);
        let expr = argument(graph, &p.ty, i);
        if graph.marshal(&p.ty) == Marshal::String {
            strings.push(name.clone());
        }
        w.writeln(&format!("{} = {};", declare(&p.ty.without_const(), &name), expr));
        args.push(name);
    }
    let has_error = m.method.has_error_slot(graph);
    if has_error {
        w.writeln("MoonError err;");
        args.push("&err".to_string());
    }

    let call = if m.method.is_static {
        format!("{}::{} ({})", owner, native.name, args.join(", "))
    } else {
        format!("instance->{} ({})", native.name, args.join(", "))
    };
    if m.return_code == 'v' {
        w.writeln(&format!("{};", call));
    } else {
        w.writeln(&format!(
            "{} = {};",
            declare(&m.method.return_type, "rv"),
            call
        ));
    }
    for s in &strings {
        w.writeln(&format!("g_free ({});", s));
    }
    if has_error {
        w.writeln("if (err.number != 0)");
        w.indent();
        w.writeln("THROW_JS_EXCEPTION (err.message);");
        w.dedent();
    }
    w.writeln(&result(m.return_code));
    w.writeln("return true;");
    w.close("}");
}

fn argument(graph: &Graph, ty: &TypeReference, index: usize) -> String {
    let native = ty.without_const().native();
    let arg = format!("args[{}]", index);
    match graph.marshal(ty) {
        Marshal::String => format!("STRDUP_FROM_VARIANT ({})", arg),
        Marshal::Bool => format!("NPVARIANT_TO_BOOLEAN ({})", arg),
        Marshal::Object(_) => format!(
            "({}) ((MoonlightDependencyObjectObject *) NPVARIANT_TO_OBJECT ({}))->GetDependencyObject ()",
            native, arg
        ),
        Marshal::Double | Marshal::Float | Marshal::Int64 | Marshal::UInt64 => {
            format!("({}) NPVARIANT_TO_DOUBLE ({})", native, arg)
        }
        _ => format!("({}) NPVARIANT_TO_INT32 ({})", native, arg),
    }
}

fn result(code: char) -> String {
    match code {
        'b' => "BOOLEAN_TO_NPVARIANT ((bool) rv, *result);".to_string(),
        'i' => "INT32_TO_NPVARIANT ((gint32) rv, *result);".to_string(),
        'd' => "DOUBLE_TO_NPVARIANT ((double) rv, *result);".to_string(),
        's' => "string_to_npvariant (rv, result);".to_string(),
        'o' => "object_to_npvariant (rv, result);".to_string(),
        _ => "VOID_TO_NPVARIANT (*result);".to_string(),
    }
}
