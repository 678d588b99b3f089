//! `NativeMethods.g.cs`: foreign-function declarations and the managed
//! wrappers that marshal strings and error slots.

use typegen_common::Diagnostics;
use typegen_model::{ForeignMethod, Graph, Marshal, Position};

use crate::select::{bound_methods, csharp_ident, param_name, qualified_method, warn_unknown, P_INVOKE};
use crate::writer::CodeWriter;
use crate::Model;

pub fn emit_native_methods(model: &Model<'_>, library: &str, diagnostics: &mut Diagnostics) -> String {
    let graph = model.graph;
    let methods = bound_methods(graph, P_INVOKE, true, diagnostics);

    let mut w = CodeWriter::managed();
    w.writeln("using System;");
    w.writeln("using System.Runtime.InteropServices;");
    w.blank();
    w.open("namespace Mono {");
    w.open("internal static partial class NativeMethods {");
    for (i, method) in methods.iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        declaration(&mut w, graph, method, library, diagnostics);
    }
    w.close("}");
    w.close("}");
    w.finish()
}

struct ManagedParam {
    /// `[MarshalAs (UnmanagedType.U1)] bool visible`
    declaration: String,
    /// `visible`, `out error`
    argument: String,
    is_error: bool,
}

fn managed_params(graph: &Graph, method: &ForeignMethod) -> Vec<ManagedParam> {
    method
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let marshal = graph.marshal(&p.ty);
            let name = csharp_ident(&param_name(&p.name, i));
            let ty = marshal.foreign(&p.ty, Position::Parameter);
            let attribute = if marshal == Marshal::Bool {
                "[MarshalAs (UnmanagedType.U1)] "
            } else {
                ""
            };
            let is_error = marshal == Marshal::Error;
            let name = if is_error { "error".to_string() } else { name };
            let argument = match ty.split_once(' ') {
                Some((direction @ ("out" | "ref"), _)) => format!("{} {}", direction, name),
                _ => name.clone(),
            };
            ManagedParam {
                declaration: format!("{}{} {}", attribute, ty, name),
                argument,
                is_error,
            }
        })
        .collect()
}

fn declaration(
    w: &mut CodeWriter,
    graph: &Graph,
    method: &ForeignMethod,
    library: &str,
    diagnostics: &mut Diagnostics,
) {
    let context = qualified_method(graph, method.method);
    for ty in method.unknown_types(graph) {
        warn_unknown(diagnostics, ty, &context);
        w.writeln(&format!(
            "// WARNING: no mapping for '{}' in {}, marshalled as IntPtr",
            ty.native(),
            method.name
        ));
    }

    let native = graph.get(method.method);
    let managed_name = native
        .annotations
        .value("ManagedName")
        .map(str::to_string)
        .unwrap_or_else(|| method.name.clone());

    let ret_marshal = graph.marshal(&method.return_type);
    let raw_return = ret_marshal.foreign(&method.return_type, Position::Return);
    let params = managed_params(graph, method);
    let raw_params: Vec<&str> = params.iter().map(|p| p.declaration.as_str()).collect();

    let signature_comment = format!(
        "// {} {} ({})",
        method.return_type.native(),
        method.name,
        method
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| crate::select::declare(&p.ty, &param_name(&p.name, i)))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let return_attribute = if ret_marshal == Marshal::Bool {
        Some("[return: MarshalAs (UnmanagedType.U1)]")
    } else {
        None
    };

    if !method.needs_wrapper(graph) {
        w.writeln(&format!("[DllImport (\"{}\", EntryPoint=\"{}\")]", library, method.name));
        w.writeln(&signature_comment);
        if let Some(attr) = return_attribute {
            w.writeln(attr);
        }
        w.writeln(&format!(
            "public extern static {} {} ({});",
            raw_return,
            csharp_ident(&managed_name),
            raw_params.join(", ")
        ));
        return;
    }

    // Raw import under a private name, then a marshalling wrapper.
    let raw_name = format!("{}_", managed_name);
    w.writeln(&format!("[DllImport (\"{}\", EntryPoint=\"{}\")]", library, method.name));
    w.writeln(&signature_comment);
    if let Some(attr) = return_attribute {
        w.writeln(attr);
    }
    w.writeln(&format!(
        "private extern static {} {} ({});",
        raw_return,
        raw_name,
        raw_params.join(", ")
    ));

    let returns_string = ret_marshal == Marshal::String;
    let has_error = params.iter().any(|p| p.is_error);
    let managed_return = if returns_string {
        "string".to_string()
    } else {
        raw_return.clone()
    };
    let public_params: Vec<&str> = params
        .iter()
        .filter(|p| !p.is_error)
        .map(|p| p.declaration.as_str())
        .collect();
    let arguments: Vec<&str> = params.iter().map(|p| p.argument.as_str()).collect();
    let call = format!("{} ({})", raw_name, arguments.join(", "));

    w.blank();
    w.writeln(&format!(
        "public static {} {} ({})",
        managed_return,
        csharp_ident(&managed_name),
        public_params.join(", ")
    ));
    w.open("{");
    let is_void = method.return_type.is_void();
    if !is_void {
        w.writeln(&format!("{} result;", raw_return));
    }
    if has_error {
        w.writeln("MoonError error;");
    }
    if is_void {
        w.writeln(&format!("{};", call));
    } else {
        w.writeln(&format!("result = {};", call));
    }
    if has_error {
        w.writeln("if (error.Number != 0)");
        w.indent();
        w.writeln("throw CreateManagedException (error);");
        w.dedent();
    }
    if returns_string {
        w.writeln("if (result == IntPtr.Zero)");
        w.indent();
        w.writeln("return null;");
        w.dedent();
        w.writeln("return Marshal.PtrToStringAnsi (result);");
    } else if !is_void {
        w.writeln("return result;");
    }
    w.close("}");
}
