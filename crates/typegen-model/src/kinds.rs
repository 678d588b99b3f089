//! Canonical kind identifiers and the inclusion flag for the kind enumeration.

use rustc_hash::{FxHashMap, FxHashSet};
use typegen_common::{Diagnostic, Diagnostics};

use crate::error::GraphError;
use crate::graph::Graph;
use crate::member::{MemberId, TypeKind};

/// Derive the enumeration identifier for a type name.
///
/// `DependencyObjectCollection` becomes `DEPENDENCY_OBJECT_COLLECTION`,
/// `ResourceDictionary` becomes `RESOURCE_DICTIONARY`.
pub fn derive_kind_name(name: &str) -> String {
    let mut upper: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();

    for suffix in ["COLLECTION", "DICTIONARY"] {
        if upper.len() > suffix.len() && upper.ends_with(suffix) {
            let split = upper.len() - suffix.len();
            if !upper[..split].ends_with('_') {
                upper.insert(split, '_');
            }
        }
    }

    upper.replace("DEPENDENCYOBJECT", "DEPENDENCY_OBJECT")
}

impl Graph {
    /// The canonical enumeration identifier of a type, cached on first use.
    pub fn kind_name(&self, id: MemberId) -> &str {
        let member = self.get(id);
        match member.as_type() {
            Some(info) => info.kind_name.get_or_init(|| match &info.kind_override {
                Some(kind) => kind.to_string(),
                None => derive_kind_name(&member.name),
            }).as_str(),
            None => "INVALID",
        }
    }

    /// `Type::<KIND>` for native code, `Type::INVALID` when `id` is absent
    /// or not part of the enumeration.
    pub fn kind_ref(&self, id: Option<MemberId>) -> String {
        match id {
            Some(id) if self.type_info(id).is_some_and(|t| t.include_in_kinds) => {
                format!("Type::{}", self.kind_name(id))
            }
            _ => "Type::INVALID".to_string(),
        }
    }

    /// Flag every type whose base chain reaches a type that participates in
    /// the kind enumeration. Must run after built-ins are injected.
    pub fn propagate_kinds(&mut self, diagnostics: &mut Diagnostics) -> Result<(), GraphError> {
        let types: Vec<MemberId> = self.types().collect();

        for &id in &types {
            let Some(info) = self.type_info(id) else { continue };
            if let Some(base) = &info.base {
                if self.resolve(base).is_none() {
                    diagnostics.report(
                        Diagnostic::warning(format!(
                            "base type '{}' of '{}' could not be resolved",
                            base.name,
                            self.qualified_name(id)
                        ))
                        .with_help("the type is treated as having no base"),
                    );
                }
            }
        }

        let mut flagged = Vec::new();
        for &id in &types {
            let mut seen = FxHashSet::default();
            seen.insert(id);
            let mut include = self.declares_kind(id);
            let mut current = self.base(id);
            while let Some(base) = current {
                if !seen.insert(base) {
                    return Err(GraphError::InheritanceCycle(self.qualified_name(id)));
                }
                include |= self.declares_kind(base);
                current = self.base(base);
            }
            if include {
                flagged.push(id);
            }
        }

        for id in flagged {
            if let Some(info) = self.type_info_mut(id) {
                info.include_in_kinds = true;
            }
        }

        let mut owners: FxHashMap<&str, MemberId> = FxHashMap::default();
        for &id in &types {
            if !self.type_info(id).is_some_and(|t| t.include_in_kinds) {
                continue;
            }
            if let Some(&first) = owners.get(self.kind_name(id)) {
                diagnostics.report(
                    Diagnostic::warning(format!(
                        "'{}' and '{}' share the kind identifier '{}'; '{}' is left out of the enumeration",
                        self.qualified_name(first),
                        self.qualified_name(id),
                        self.kind_name(id),
                        self.qualified_name(id)
                    ))
                    .with_help("rename one of the types"),
                );
            } else {
                owners.insert(self.kind_name(id), id);
            }
        }
        Ok(())
    }

    fn declares_kind(&self, id: MemberId) -> bool {
        let member = self.get(id);
        member.annotations.contains("IncludeInKinds")
            || member.as_type().is_some_and(|t| t.include_in_kinds)
    }

    /// Types in the kind enumeration, sorted by identifier. When two types
    /// share an identifier only the first declared is listed.
    pub fn kinds(&self) -> Vec<MemberId> {
        let mut ids: Vec<MemberId> = self
            .types()
            .filter(|id| self.type_info(*id).is_some_and(|t| t.include_in_kinds))
            .collect();
        ids.sort_by(|a, b| self.kind_name(*a).cmp(self.kind_name(*b)));
        ids.dedup_by(|a, b| self.kind_name(*a) == self.kind_name(*b));
        ids
    }

    /// True for class-like types that can back a managed wrapper.
    pub fn is_instantiable(&self, id: MemberId) -> bool {
        let Some(info) = self.type_info(id) else { return false };
        info.include_in_kinds
            && !info.is_synthetic
            && matches!(info.kind, TypeKind::Class | TypeKind::Struct)
            && !info.is_value_type
            && self.get(id).annotations.value("Namespace").is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotations;
    use crate::member::{Member, MemberKind, TypeInfo};
    use crate::type_ref::TypeReference;

    #[test]
    fn test_derive_kind_name() {
        assert_eq!(derive_kind_name("Widget"), "WIDGET");
        assert_eq!(derive_kind_name("UIElementCollection"), "UIELEMENT_COLLECTION");
        assert_eq!(derive_kind_name("ResourceDictionary"), "RESOURCE_DICTIONARY");
        assert_eq!(derive_kind_name("DependencyObject"), "DEPENDENCY_OBJECT");
        assert_eq!(
            derive_kind_name("DependencyObjectCollection"),
            "DEPENDENCY_OBJECT_COLLECTION"
        );
        assert_eq!(derive_kind_name("Collection"), "COLLECTION");
    }

    fn add_class(graph: &mut Graph, name: &str, base: Option<&str>, include: bool) -> MemberId {
        let info = TypeInfo::new(TypeKind::Class).with_base(base.map(TypeReference::named));
        let mut annotations = Annotations::new();
        if include {
            annotations.insert("IncludeInKinds", None).unwrap();
        }
        let member = Member::new(name, MemberKind::Type(info)).with_annotations(annotations);
        let root = graph.root();
        graph.add_child(root, member).unwrap()
    }

    #[test]
    fn test_inclusion_propagates_to_descendants() {
        let mut graph = Graph::new();
        let base = add_class(&mut graph, "EventObject", None, true);
        let mid = add_class(&mut graph, "DependencyObject", Some("EventObject"), false);
        let leaf = add_class(&mut graph, "Widget", Some("DependencyObject"), false);
        let other = add_class(&mut graph, "Helper", None, false);

        let mut diags = Diagnostics::new();
        graph.propagate_kinds(&mut diags).unwrap();

        for id in [base, mid, leaf] {
            assert!(graph.type_info(id).unwrap().include_in_kinds);
        }
        assert!(!graph.type_info(other).unwrap().include_in_kinds);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unresolved_base_warns() {
        let mut graph = Graph::new();
        add_class(&mut graph, "Widget", Some("Missing"), false);
        let mut diags = Diagnostics::new();
        graph.propagate_kinds(&mut diags).unwrap();
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn test_inheritance_cycle_is_fatal() {
        let mut graph = Graph::new();
        add_class(&mut graph, "A", Some("B"), false);
        add_class(&mut graph, "B", Some("A"), false);
        let mut diags = Diagnostics::new();
        let err = graph.propagate_kinds(&mut diags).unwrap_err();
        assert!(matches!(err, GraphError::InheritanceCycle(_)));
    }

    #[test]
    fn test_kinds_sorted_by_identifier() {
        let mut graph = Graph::new();
        add_class(&mut graph, "Widget", None, true);
        add_class(&mut graph, "Brush", None, true);
        add_class(&mut graph, "Hidden", None, false);
        let mut diags = Diagnostics::new();
        graph.propagate_kinds(&mut diags).unwrap();

        let names: Vec<_> = graph.kinds().into_iter().map(|k| graph.kind_name(k).to_string()).collect();
        assert_eq!(names, vec!["BRUSH", "WIDGET"]);
    }

    #[test]
    fn test_shared_kind_identifier_warns() {
        let mut graph = Graph::new();
        let root = graph.root();
        let mut first = None;
        for scope in ["Controls", "Shapes"] {
            let ns = graph.add_child(root, Member::new(scope, MemberKind::Scope)).unwrap();
            let mut annotations = Annotations::new();
            annotations.insert("IncludeInKinds", None).unwrap();
            let widget = Member::new("Widget", MemberKind::Type(TypeInfo::new(TypeKind::Class)))
                .with_annotations(annotations);
            let id = graph.add_child(ns, widget).unwrap();
            first.get_or_insert(id);
        }
        let mut diags = Diagnostics::new();
        graph.propagate_kinds(&mut diags).unwrap();

        assert_eq!(graph.kinds(), vec![first.unwrap()]);
        let warning = diags.warnings().next().unwrap();
        assert!(warning.message.contains("'Controls::Widget' and 'Shapes::Widget' share the kind identifier 'WIDGET'"));
    }
}
