//! The kind enumeration, native and managed.

use typegen_model::Graph;

use crate::writer::CodeWriter;

/// `kinds.g.h`: the native `Type::Kind` enumeration.
pub fn emit_native_kinds(graph: &Graph) -> String {
    let kinds = graph.kinds();
    let mut w = CodeWriter::native();
    w.writeln("#ifndef __MOON_KINDS_G_H__");
    w.writeln("#define __MOON_KINDS_G_H__");
    w.blank();
    w.open("namespace Type {");
    w.open("enum Kind {");
    w.writeln("INVALID = 0,");
    for (i, id) in kinds.iter().enumerate() {
        w.writeln(&format!("{} = {},", graph.kind_name(*id), i + 1));
    }
    w.writeln(&format!("LASTTYPE = {}", kinds.len() + 1));
    w.close("};");
    w.close("};");
    w.blank();
    w.writeln("#endif");
    w.finish()
}

/// `Kind.g.cs`: the same enumeration for managed code.
pub fn emit_managed_kinds(graph: &Graph) -> String {
    let kinds = graph.kinds();
    let mut w = CodeWriter::managed();
    w.open("namespace Mono {");
    w.open("internal enum Kind {");
    w.writeln("INVALID = 0,");
    for (i, id) in kinds.iter().enumerate() {
        w.writeln(&format!("{} = {},", graph.kind_name(*id), i + 1));
    }
    w.writeln(&format!("LASTTYPE = {}", kinds.len() + 1));
    w.close("}");
    w.close("}");
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use typegen_model::{Annotations, Member, MemberKind, TypeInfo, TypeKind};

    fn graph() -> Graph {
        let mut graph = Graph::new();
        let root = graph.root();
        let mut annotations = Annotations::new();
        annotations.insert("IncludeInKinds", None).unwrap();
        for name in ["Widget", "Brush"] {
            let member = Member::new(name, MemberKind::Type(TypeInfo::new(TypeKind::Class)))
                .with_annotations(annotations.clone());
            graph.add_child(root, member).unwrap();
        }
        let hidden = Member::new("Hidden", MemberKind::Type(TypeInfo::new(TypeKind::Class)));
        graph.add_child(root, hidden).unwrap();
        let mut diagnostics = typegen_common::Diagnostics::new();
        typegen_model::finish(&mut graph, &mut diagnostics).unwrap();
        graph
    }

    #[test]
    fn test_kinds_sorted_by_identifier() {
        let out = emit_managed_kinds(&graph());
        let brush = out.find("BRUSH =").unwrap();
        let widget = out.find("WIDGET =").unwrap();
        let object = out.find("OBJECT =").unwrap();
        assert!(brush < object && object < widget);
        assert!(!out.contains("HIDDEN"));
        assert!(out.contains("INVALID = 0,"));
    }

    #[test]
    fn test_native_and_managed_agree() {
        let graph = graph();
        let native = emit_native_kinds(&graph);
        let managed = emit_managed_kinds(&graph);
        for line in managed.lines().filter(|l| l.trim_start().starts_with("WIDGET")) {
            assert!(native.contains(line.trim()));
        }
        assert!(native.contains("namespace Type {"));
    }
}
