//! `dependencyproperty.g.cpp`: property registration, static indices and
//! generated accessors.

use typegen_common::Diagnostics;
use typegen_model::{DependencyProperty, Graph, Marshal, MemberId, TypeKind};

use crate::select::includes;
use crate::writer::CodeWriter;
use crate::Model;

/// How a property's value is stored and unwrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ValueShape {
    /// A parsed reference type, stored by pointer.
    Object(String),
    /// A parsed value struct, returned by pointer.
    Struct(String),
    /// A parsed enumeration, stored as an integer.
    Enum(String),
    /// A scalar with a `Value::As<accessor>` method.
    Primitive { native: String, accessor: &'static str },
    String,
}

impl ValueShape {
    fn of(graph: &Graph, prop: &DependencyProperty<'_>) -> Option<Self> {
        let ty = &prop.property_type;
        match graph.marshal(&ty.without_const()) {
            Marshal::String => return Some(ValueShape::String),
            Marshal::Bool => return Some(primitive("bool", "Bool")),
            Marshal::Int32 => return Some(primitive("gint32", "Int32")),
            Marshal::UInt32 => return Some(primitive("guint32", "UInt32")),
            Marshal::Int64 if ty.name == "TimeSpan" => return Some(primitive("TimeSpan", "TimeSpan")),
            Marshal::Int64 => return Some(primitive("gint64", "Int64")),
            Marshal::UInt64 => return Some(primitive("guint64", "UInt64")),
            Marshal::Double => return Some(primitive("double", "Double")),
            Marshal::Float => return Some(primitive("float", "Float")),
            Marshal::Char => return Some(primitive("gunichar", "Char")),
            Marshal::Kind => return Some(primitive("Type::Kind", "Int32")),
            _ => {}
        }
        let id = graph.resolve(ty)?;
        let info = graph.type_info(id)?;
        let name = graph.qualified_name(id);
        Some(match info.kind {
            TypeKind::Enum => ValueShape::Enum(name),
            TypeKind::Primitive | TypeKind::Interface => return None,
            _ if info.is_value_type => ValueShape::Struct(name),
            _ => ValueShape::Object(name),
        })
    }

    /// Reference types take ownership of a freshly constructed default.
    fn is_reference(&self) -> bool {
        matches!(self, ValueShape::Object(_))
    }

    fn getter_type(&self, nullable: bool) -> String {
        match self {
            ValueShape::Object(name) | ValueShape::Struct(name) => format!("{} *", name),
            ValueShape::Enum(name) => name.clone(),
            ValueShape::Primitive { native, .. } if nullable => format!("{} *", native),
            ValueShape::Primitive { native, .. } => native.clone(),
            ValueShape::String => "const char *".to_string(),
        }
    }

    fn setter_type(&self, nullable: bool) -> String {
        match self {
            ValueShape::Struct(name) => format!("{} *", name),
            _ => self.getter_type(nullable),
        }
    }

    /// `As...` call that extracts the stored value.
    fn accessor_call(&self) -> String {
        match self {
            ValueShape::Object(name) | ValueShape::Struct(name) => {
                format!("value->As{} ()", name.rsplit("::").next().unwrap_or(name))
            }
            ValueShape::Enum(name) => format!("({}) value->AsInt32 ()", name),
            ValueShape::Primitive { accessor, .. } => format!("value->As{} ()", accessor),
            ValueShape::String => "value->AsString ()".to_string(),
        }
    }
}

fn primitive(native: &str, accessor: &'static str) -> ValueShape {
    ValueShape::Primitive {
        native: native.to_string(),
        accessor,
    }
}

/// Registration calls in dependency order, then static indices, then
/// accessors for properties that ask for them.
pub fn emit_registration(model: &Model<'_>, diagnostics: &mut Diagnostics) -> String {
    let graph = model.graph;
    let props: Vec<DependencyProperty<'_>> = model
        .sorted
        .fields
        .iter()
        .filter_map(|f| graph.dependency_property(*f))
        .collect();

    let mut w = CodeWriter::native();
    w.writeln("#include <config.h>");
    w.blank();
    w.writeln("#include \"dependencyproperty.h\"");
    w.writeln("#include \"validators.h\"");
    w.writeln("#include \"autocreators.h\"");
    for include in includes(model, model.sorted.types.iter().copied()) {
        w.writeln(&format!("#include \"{}\"", include));
    }
    w.blank();

    w.writeln("void");
    w.writeln("Types::RegisterNativeProperties ()");
    w.open("{");
    w.writeln("Types *types = this;");
    for prop in &props {
        let line = registration_call(graph, prop, diagnostics);
        w.writeln(&line);
    }
    w.close("}");
    w.blank();

    for prop in &props {
        let index = model.sorted.index_of(prop.field).unwrap_or_default();
        w.writeln(&format!(
            "const int {}::{}Property = {};",
            graph.qualified_name(prop.owner),
            prop.name,
            index
        ));
    }

    for prop in props.iter().filter(|p| p.generate_getter || p.generate_setter) {
        let Some(shape) = ValueShape::of(graph, prop) else {
            diagnostics.warn(format!(
                "no accessor mapping for property type '{}' of '{}.{}'",
                prop.property_type.native(),
                graph.qualified_name(prop.owner),
                prop.name
            ));
            continue;
        };
        if prop.generate_getter {
            w.blank();
            getter(&mut w, graph, prop, &shape);
        }
        if prop.generate_setter {
            w.blank();
            setter(&mut w, graph, prop, &shape);
        }
    }
    w.finish()
}

fn registration_call(graph: &Graph, prop: &DependencyProperty<'_>, diagnostics: &mut Diagnostics) -> String {
    let owner = graph.kind_ref(Some(prop.owner));
    let context = format!("{}.{}", graph.qualified_name(prop.owner), prop.name);
    let value_type = graph.resolve(&prop.property_type);
    let value_kind = match value_type {
        None => {
            diagnostics.warn(format!(
                "property type '{}' of '{}' could not be resolved",
                prop.property_type.native(),
                context
            ));
            "Type::INVALID".to_string()
        }
        Some(id) => value_kind(graph, id).unwrap_or_else(|| {
            diagnostics.warn(format!(
                "property type '{}' of '{}' is not part of the kind enumeration",
                graph.qualified_name(id),
                context
            ));
            "Type::INVALID".to_string()
        }),
    };
    let default = default_value(prop, ValueShape::of(graph, prop).as_ref());

    if prop.needs_full_registration() {
        format!(
            "DependencyProperty::RegisterFull (types, {}, \"{}\", {}, {}, {}, {}, {}, {}, {}, {}, {});",
            owner,
            prop.name,
            prop.is_custom,
            default,
            value_kind,
            prop.is_attached,
            prop.is_read_only,
            prop.always_change,
            prop.auto_creator
                .map(|a| format!("AutoCreators::{}", a))
                .unwrap_or_else(|| "NULL".to_string()),
            prop.validator
                .map(|v| format!("Validators::{}", v))
                .unwrap_or_else(|| "NULL".to_string()),
            prop.is_nullable,
        )
    } else {
        format!(
            "DependencyProperty::Register (types, {}, \"{}\", {}, {}, {});",
            owner, prop.name, prop.is_custom, default, value_kind
        )
    }
}

/// Kind a value of type `id` is stored as. Enumerations outside the kind
/// enumeration are stored as integers.
fn value_kind(graph: &Graph, id: MemberId) -> Option<String> {
    let info = graph.type_info(id)?;
    if info.include_in_kinds {
        Some(graph.kind_ref(Some(id)))
    } else if info.is_enum() {
        Some("Type::INT32".to_string())
    } else {
        None
    }
}

/// `Value::CreateUnrefPtr (expr)` for reference types, `new Value (expr)`
/// otherwise, `NULL` without a default.
fn default_value(prop: &DependencyProperty<'_>, shape: Option<&ValueShape>) -> String {
    let Some(expr) = prop.default_value else {
        return "NULL".to_string();
    };
    if shape.is_some_and(ValueShape::is_reference) {
        format!("Value::CreateUnrefPtr ({})", expr)
    } else {
        format!("new Value ({})", expr)
    }
}

fn getter(w: &mut CodeWriter, graph: &Graph, prop: &DependencyProperty<'_>, shape: &ValueShape) {
    let owner = graph.qualified_name(prop.owner);
    let (params, receiver) = if prop.is_attached {
        ("DependencyObject *obj", "obj->")
    } else {
        ("", "")
    };

    w.writeln(&shape.getter_type(prop.is_nullable));
    w.writeln(&format!("{}::Get{} ({})", owner, prop.name, params));
    w.open("{");
    if prop.is_attached {
        w.writeln("if (obj == NULL)");
        w.indent();
        w.writeln(&format!("return {};", empty_value(shape, prop.is_nullable)));
        w.dedent();
    }
    w.writeln(&format!(
        "Value *value = {}GetValue ({}::{}Property);",
        receiver, owner, prop.name
    ));
    match shape {
        ValueShape::Object(_) | ValueShape::Struct(_) | ValueShape::String => {
            w.writeln(&format!("return value ? {} : NULL;", shape.accessor_call()));
        }
        ValueShape::Primitive { accessor, .. } if prop.is_nullable => {
            w.writeln(&format!("return value ? value->As{}Ptr () : NULL;", accessor));
        }
        _ => {
            let fallback = prop
                .default_value
                .map(str::to_string)
                .unwrap_or_else(|| empty_value(shape, false));
            w.writeln("if (!value)");
            w.indent();
            w.writeln(&format!("return {};", fallback));
            w.dedent();
            w.writeln(&format!("return {};", shape.accessor_call()));
        }
    }
    w.close("}");
}

fn setter(w: &mut CodeWriter, graph: &Graph, prop: &DependencyProperty<'_>, shape: &ValueShape) {
    let owner = graph.qualified_name(prop.owner);
    let value_type = shape.setter_type(prop.is_nullable);
    let (params, receiver) = if prop.is_attached {
        (format!("DependencyObject *obj, {}value", spaced(&value_type)), "obj->")
    } else {
        (format!("{}value", spaced(&value_type)), "")
    };

    w.writeln("void");
    w.writeln(&format!("{}::Set{} ({})", owner, prop.name, params));
    w.open("{");
    if prop.is_attached {
        w.writeln("if (obj == NULL)");
        w.indent();
        w.writeln("return;");
        w.dedent();
    }
    let property = format!("{}::{}Property", owner, prop.name);
    match shape {
        ValueShape::Struct(_) => {
            w.writeln("if (!value)");
            w.indent();
            w.writeln(&format!("{}SetValue ({}, NULL);", receiver, property));
            w.dedent();
            w.writeln("else");
            w.indent();
            w.writeln(&format!("{}SetValue ({}, Value (*value));", receiver, property));
            w.dedent();
        }
        ValueShape::Primitive { .. } if prop.is_nullable => {
            w.writeln("if (!value)");
            w.indent();
            w.writeln(&format!("{}SetValue ({}, NULL);", receiver, property));
            w.dedent();
            w.writeln("else");
            w.indent();
            w.writeln(&format!("{}SetValue ({}, Value (*value));", receiver, property));
            w.dedent();
        }
        ValueShape::Enum(_) => {
            w.writeln(&format!(
                "{}SetValue ({}, Value (value, {}));",
                receiver,
                property,
                graph
                    .resolve(&prop.property_type)
                    .and_then(|id| value_kind(graph, id))
                    .unwrap_or_else(|| "Type::INT32".to_string())
            ));
        }
        _ => {
            w.writeln(&format!("{}SetValue ({}, Value (value));", receiver, property));
        }
    }
    w.close("}");
}

/// `Brush *` + `value` → `Brush *value`, `double` + `value` → `double value`.
fn spaced(ty: &str) -> String {
    if ty.ends_with('*') {
        ty.to_string()
    } else {
        format!("{} ", ty)
    }
}

fn empty_value(shape: &ValueShape, nullable: bool) -> String {
    match shape {
        ValueShape::Object(_) | ValueShape::Struct(_) | ValueShape::String => "NULL".to_string(),
        ValueShape::Primitive { .. } if nullable => "NULL".to_string(),
        ValueShape::Primitive { native, .. } if native == "bool" => "false".to_string(),
        ValueShape::Primitive { native, .. } | ValueShape::Enum(native) => format!("({}) 0", native),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use typegen_common::SourceMap;
    use typegen_model::sort_properties;

    fn emit(text: &str) -> (String, Diagnostics) {
        let mut sources = SourceMap::new();
        let id = sources.add_file(PathBuf::from("src/control.h"), text.to_string());
        let mut graph = Graph::new();
        typegen_header::parse_header(&mut graph, sources.get(id).unwrap(), &[]).unwrap();
        let mut diagnostics = Diagnostics::new();
        typegen_model::finish(&mut graph, &mut diagnostics).unwrap();
        let sorted = sort_properties(&graph).unwrap();
        let model = Model { graph: &graph, sorted: &sorted, sources: &sources, typedefs: &[] };
        let out = emit_registration(&model, &mut diagnostics);
        (out, diagnostics)
    }

    const CONTROL: &str = r#"
/* @IncludeInKinds */
class DependencyObject { };
/* @IncludeInKinds */
class Brush : public DependencyObject { };
enum Visibility { Visible, Collapsed };
class Control : public DependencyObject {
public:
    /* @PropertyType=Brush,DefaultValue=new SolidColorBrush ("black") */
    static int BackgroundProperty;
    /* @PropertyType=double,DefaultValue=1.0,GenerateAccessors */
    static int OpacityProperty;
    /* @PropertyType=double,Validator=PositiveValidator,ReadOnly */
    static int ActualWidthProperty;
    /* @PropertyType=char*,DefaultValue="\"\"",GenerateGetter */
    static int NameProperty;
    /* @PropertyType=Visibility,DefaultValue=VisibilityVisible,GenerateAccessors */
    static int VisibilityProperty;
    /* @PropertyType=double,Nullable,Attached,GenerateAccessors */
    static int LeftProperty;
};
"#;

    #[test]
    fn test_reference_default_transfers_ownership() {
        let (out, _) = emit(CONTROL);
        assert!(out.contains(
            "DependencyProperty::Register (types, Type::CONTROL, \"Background\", false, Value::CreateUnrefPtr (new SolidColorBrush (\"black\")), Type::BRUSH);"
        ));
        assert!(out.contains(
            "DependencyProperty::Register (types, Type::CONTROL, \"Opacity\", false, new Value (1.0), Type::DOUBLE);"
        ));
    }

    #[test]
    fn test_full_registration_form() {
        let (out, _) = emit(CONTROL);
        assert!(out.contains(
            "DependencyProperty::RegisterFull (types, Type::CONTROL, \"ActualWidth\", false, NULL, Type::DOUBLE, false, true, false, NULL, Validators::PositiveValidator, false);"
        ));
    }

    #[test]
    fn test_static_indices_follow_sorted_order() {
        let (out, _) = emit(CONTROL);
        assert!(out.contains("const int Control::ActualWidthProperty = 0;"));
        assert!(out.contains("const int Control::BackgroundProperty = 1;"));
        assert!(out.contains("const int Control::VisibilityProperty = 5;"));
    }

    #[test]
    fn test_primitive_accessors() {
        let (out, _) = emit(CONTROL);
        assert!(out.contains("double\nControl::GetOpacity ()\n{\n\tValue *value = GetValue (Control::OpacityProperty);\n\tif (!value)\n\t\treturn 1.0;\n\treturn value->AsDouble ();\n}"));
        assert!(out.contains("void\nControl::SetOpacity (double value)\n{\n\tSetValue (Control::OpacityProperty, Value (value));\n}"));
    }

    #[test]
    fn test_string_and_enum_accessors() {
        let (out, _) = emit(CONTROL);
        assert!(out.contains("const char *\nControl::GetName ()"));
        assert!(out.contains("return value ? value->AsString () : NULL;"));
        assert!(!out.contains("Control::SetName"));
        assert!(out.contains("return (Visibility) value->AsInt32 ();"));
    }

    #[test]
    fn test_attached_nullable_accessors() {
        let (out, _) = emit(CONTROL);
        assert!(out.contains("double *\nControl::GetLeft (DependencyObject *obj)"));
        assert!(out.contains("Value *value = obj->GetValue (Control::LeftProperty);"));
        assert!(out.contains("return value ? value->AsDoublePtr () : NULL;"));
        assert!(out.contains("Control::SetLeft (DependencyObject *obj, double *value)"));
    }

    #[test]
    fn test_unresolved_property_type_warns() {
        let (out, diagnostics) = emit(
            "class A {\npublic:\n/* @PropertyType=Missing,DefaultValue=0 */\nstatic int XProperty;\n};",
        );
        assert!(out.contains("Type::INVALID);"));
        assert!(diagnostics.warnings().any(|d| d.message.contains("'Missing'")));
    }

    #[test]
    fn test_enum_property_stored_as_int32() {
        let (out, diagnostics) = emit(CONTROL);
        assert!(out.contains(
            "DependencyProperty::Register (types, Type::CONTROL, \"Visibility\", false, new Value (VisibilityVisible), Type::INT32);"
        ));
        assert!(out.contains("SetValue (Control::VisibilityProperty, Value (value, Type::INT32));"));
        assert!(!out.contains("Type::INVALID"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_type_outside_enumeration_warns() {
        let (out, diagnostics) = emit(
            "struct Point { double x; double y; };\nclass A {\npublic:\n/* @PropertyType=Point,DefaultValue=Point () */\nstatic int OriginProperty;\n};",
        );
        assert!(out.contains("\"Origin\", false, new Value (Point ()), Type::INVALID);"));
        assert!(diagnostics
            .warnings()
            .any(|d| d.message.contains("'Point' of 'A.Origin' is not part of the kind enumeration")));
    }
}
