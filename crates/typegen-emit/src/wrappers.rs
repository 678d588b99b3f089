//! `Wrappers.g.cs`: constructors for the managed partial classes.

use std::collections::BTreeMap;
use std::path::Path;

use typegen_common::{Diagnostic, Diagnostics, Location};
use typegen_model::MemberId;

use crate::writer::CodeWriter;
use crate::Model;

/// Every instantiable type gets an internal handle constructor and, when it
/// has an automatic factory, a public parameterless one. Types are grouped
/// by their `Namespace` annotation.
pub fn emit_wrappers(model: &Model<'_>, managed_root: &Path, diagnostics: &mut Diagnostics) -> String {
    let graph = model.graph;
    let mut namespaces: BTreeMap<&str, Vec<MemberId>> = BTreeMap::new();
    for ty in graph.declared_types() {
        if !graph.is_instantiable(ty) {
            continue;
        }
        let Some(namespace) = graph.get(ty).annotations.value("Namespace") else { continue };
        namespaces.entry(namespace).or_default().push(ty);
    }

    let mut w = CodeWriter::managed();
    w.writeln("using System;");
    w.writeln("using Mono;");
    for (namespace, types) in &namespaces {
        w.blank();
        w.open(&format!("namespace {} {{", namespace));
        for (j, &ty) in types.iter().enumerate() {
            if j > 0 {
                w.blank();
            }
            check_source(model, managed_root, namespace, ty, diagnostics);
            wrapper(&mut w, model, ty);
        }
        w.close("}");
    }
    w.finish()
}

fn wrapper(w: &mut CodeWriter, model: &Model<'_>, ty: MemberId) {
    let graph = model.graph;
    let name = &graph.get(ty).name;
    w.open(&format!("partial class {} {{", name));
    if graph.has_factory(ty) {
        let factory = graph
            .default_constructor(ty)
            .and_then(|ctor| graph.foreign_method(ctor));
        if let Some(factory) = factory {
            w.writeln(&format!(
                "public {} () : base (NativeMethods.{} (), true)",
                name, factory.name
            ));
            w.writeln("{");
            w.writeln("}");
            w.blank();
        }
    }
    w.writeln(&format!(
        "internal {} (IntPtr raw, bool dropref) : base (raw, dropref)",
        name
    ));
    w.writeln("{");
    w.writeln("}");
    w.close("}");
}

/// The hand-written half of a partial class lives at
/// `<root>/<Namespace>/<Name>.cs`. A missing file usually means the
/// namespace annotation is wrong.
fn check_source(
    model: &Model<'_>,
    managed_root: &Path,
    namespace: &str,
    ty: MemberId,
    diagnostics: &mut Diagnostics,
) {
    let member = model.graph.get(ty);
    let expected = managed_root
        .join(namespace)
        .join(format!("{}.cs", member.name));
    if expected.is_file() {
        return;
    }
    let mut diagnostic = Diagnostic::warning(format!(
        "no managed source for '{}' at {}",
        member.name,
        expected.display()
    ))
    .with_help("check the Namespace annotation of the native type");
    if let Some(path) = member.source.and_then(|s| model.sources.path(s)) {
        diagnostic = diagnostic.with_location(Location::new(path, member.line));
    }
    diagnostics.report(diagnostic);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use typegen_common::SourceMap;
    use typegen_header::parse_header;
    use typegen_model::{sort_properties, Graph};

    const HEADER: &str = r#"
/* @IncludeInKinds,Namespace=System.Windows */
class DependencyObject {
public:
    DependencyObject ();
};
/* @Namespace=System.Windows.Controls */
class Button : public DependencyObject {
public:
    Button ();
};
/* @Namespace=System.Windows.Controls,SkipFactories */
class Panel : public DependencyObject {
public:
    Panel ();
};
/* @Namespace=System.Windows */
struct Point { double x; };
class Internal : public DependencyObject { };
"#;

    fn emit(root: &Path) -> (String, Diagnostics) {
        let mut sources = SourceMap::new();
        let id = sources.add_file(PathBuf::from("src/button.h"), HEADER.to_string());
        let mut graph = Graph::new();
        parse_header(&mut graph, sources.get(id).unwrap(), &[]).unwrap();
        let mut diagnostics = Diagnostics::new();
        typegen_model::finish(&mut graph, &mut diagnostics).unwrap();
        let sorted = sort_properties(&graph).unwrap();
        let model = Model { graph: &graph, sorted: &sorted, sources: &sources, typedefs: &[] };
        let out = emit_wrappers(&model, root, &mut diagnostics);
        (out, diagnostics)
    }

    fn touch(root: &Path, namespace: &str, name: &str) {
        let dir = root.join(namespace);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.cs", name)), "partial class X {}").unwrap();
    }

    #[test]
    fn test_constructors_grouped_by_namespace() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "System.Windows", "DependencyObject");
        touch(dir.path(), "System.Windows.Controls", "Button");
        touch(dir.path(), "System.Windows.Controls", "Panel");
        let (out, diagnostics) = emit(dir.path());

        assert!(out.contains("namespace System.Windows {\n    partial class DependencyObject {"));
        assert!(out.contains("public Button () : base (NativeMethods.button_new (), true)"));
        assert!(out.contains("internal Button (IntPtr raw, bool dropref) : base (raw, dropref)"));
        assert!(out.contains("internal Panel (IntPtr raw, bool dropref)"));
        assert!(!out.contains("public Panel ()"));
        assert!(!out.contains("Point"));
        assert!(!out.contains("Internal"));
        assert_eq!(diagnostics.warnings().count(), 0);

        let windows = out.find("namespace System.Windows {").unwrap();
        let controls = out.find("namespace System.Windows.Controls {").unwrap();
        assert!(windows < controls);
    }

    #[test]
    fn test_missing_source_warns() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "System.Windows", "DependencyObject");
        touch(dir.path(), "System.Windows.Controls", "Button");
        let (out, diagnostics) = emit(dir.path());

        assert!(out.contains("partial class Panel {"));
        let warnings: Vec<_> = diagnostics.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("'Panel'"));
        assert_eq!(warnings[0].location.as_ref().unwrap().line, 13);
    }
}
