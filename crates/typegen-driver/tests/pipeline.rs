use std::fs;
use std::path::Path;

use typegen_build::{Config, WriteOutcome, MARKER};
use typegen_driver::Driver;
use typegen_emit::Artifact;

const DEPENDENCY_OBJECT: &str = r#"
/* @IncludeInKinds,Namespace=System.Windows */
class DependencyObject {
public:
    /* @GenerateCBinding,GeneratePInvoke */
    DependencyObject ();
};
"#;

const BRUSH: &str = r#"
/* @Namespace=System.Windows.Media */
class MOON_API Brush : public DependencyObject {
public:
    /* @PropertyType=double,DefaultValue=1.0 */
    const static int OpacityProperty;
};
"#;

const WIDGET: &str = r#"
/* @Namespace=System.Windows */
class MOON_API Widget : public DependencyObject {
public:
    /* @PropertyType=Brush,DefaultValue=new SolidColorBrush ("black") */
    const static int BackgroundProperty;

    static int ClickEvent;

    /* @GeneratePInvoke */
    void Render (cairo_t *cr);
};
"#;

fn project(headers: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join(MARKER)).unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    for (name, text) in headers {
        fs::write(dir.path().join("src").join(name), text).unwrap();
    }
    dir
}

fn read(root: &Path, artifact: Artifact) -> String {
    fs::read_to_string(Config::default().output_path(root, artifact)).unwrap()
}

#[test]
fn test_second_run_changes_nothing() {
    let dir = project(&[
        ("dependencyobject.h", DEPENDENCY_OBJECT),
        ("brush.h", BRUSH),
        ("widget.h", WIDGET),
    ]);
    let driver = Driver::with_root(dir.path()).unwrap();

    let first = driver.run().unwrap();
    assert_eq!(first.files.len(), Artifact::ALL.len());
    assert!(first.files.iter().all(|f| f.outcome == WriteOutcome::Wrote));
    let kinds = read(dir.path(), Artifact::NativeKinds);

    let second = driver.run().unwrap();
    assert!(second.files.iter().all(|f| f.outcome == WriteOutcome::Unchanged));
    assert_eq!(read(dir.path(), Artifact::NativeKinds), kinds);
}

#[test]
fn test_registration_order_and_defaults() {
    let dir = project(&[
        ("dependencyobject.h", DEPENDENCY_OBJECT),
        ("brush.h", BRUSH),
        ("widget.h", WIDGET),
    ]);
    Driver::with_root(dir.path()).unwrap().run().unwrap();

    let registration = read(dir.path(), Artifact::Registration);
    let brush = registration.find("Type::BRUSH, \"Opacity\"").unwrap();
    let widget = registration
        .find("Value::CreateUnrefPtr (new SolidColorBrush (\"black\"))")
        .unwrap();
    assert!(brush < widget);
    assert!(registration.contains("#include \"brush.h\""));
}

#[test]
fn test_unknown_type_is_a_warning() {
    let dir = project(&[("dependencyobject.h", DEPENDENCY_OBJECT), ("widget.h", WIDGET)]);
    let report = Driver::with_root(dir.path()).unwrap().run().unwrap();

    let methods = read(dir.path(), Artifact::NativeMethods);
    assert!(methods.contains("// WARNING: no mapping for 'cairo_t *' in widget_render, marshalled as IntPtr"));
    assert!(report.diagnostics.iter().any(|d| d.message.contains("cairo_t")));
}

#[test]
fn test_generate_does_not_write() {
    let dir = project(&[("dependencyobject.h", DEPENDENCY_OBJECT)]);
    let generated = Driver::with_root(dir.path()).unwrap().generate().unwrap();

    assert_eq!(generated.files.len(), Artifact::ALL.len());
    assert!(generated.files.iter().all(|f| !f.path.exists()));
    assert!(generated
        .files
        .iter()
        .all(|f| f.contents.starts_with(&format!("// {}", typegen_emit::BANNER))));
}

#[test]
fn test_parse_error_names_file_and_line() {
    let dir = project(&[("bad.h", "class Bad {\npublic:\n    int x\n};\n")]);
    let err = Driver::with_root(dir.path()).unwrap().run().unwrap_err();

    assert!(err.to_string().contains("src/bad.h"));
    assert!(err.chain().any(|e| e.to_string().starts_with("src/bad.h:4:")));
    assert!(!Config::default().output_path(dir.path(), Artifact::NativeKinds).exists());
}

#[test]
fn test_property_cycle_aborts() {
    let a = "class A {\npublic:\n    /* @PropertyType=B,DefaultValue=new B () */\n    static int BProperty;\n};\n";
    let b = "class B {\npublic:\n    /* @PropertyType=A,DefaultValue=new A () */\n    static int AProperty;\n};\n";
    let dir = project(&[("a.h", a), ("b.h", b)]);
    let err = Driver::with_root(dir.path()).unwrap().run().unwrap_err();

    assert!(err.chain().any(|e| e.to_string().contains("dependency cycle")));
}
