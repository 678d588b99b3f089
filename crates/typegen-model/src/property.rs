//! Annotation-driven roles of fields: dependent properties and event slots.

use crate::graph::Graph;
use crate::member::{MemberId, TypeKind, Visibility};
use crate::type_ref::TypeReference;

/// A dependent-property field seen through its annotations.
#[derive(Debug, Clone)]
pub struct DependencyProperty<'g> {
    pub field: MemberId,
    pub owner: MemberId,
    /// Property name: the field name without its `Property` suffix.
    pub name: &'g str,
    pub property_type: TypeReference,
    pub default_value: Option<&'g str>,
    pub validator: Option<&'g str>,
    pub auto_creator: Option<&'g str>,
    pub is_attached: bool,
    pub is_read_only: bool,
    pub always_change: bool,
    pub is_nullable: bool,
    pub is_custom: bool,
    pub generate_getter: bool,
    pub generate_setter: bool,
}

impl DependencyProperty<'_> {
    /// Whether registration needs the long form.
    pub fn needs_full_registration(&self) -> bool {
        self.is_attached
            || self.is_read_only
            || self.always_change
            || self.is_nullable
            || self.is_custom
            || self.validator.is_some()
            || self.auto_creator.is_some()
    }
}

/// An event slot: a static field named `<Name>Event`.
#[derive(Debug, Clone)]
pub struct EventSlot<'g> {
    pub field: MemberId,
    pub owner: MemberId,
    /// Event name without the `Event` suffix.
    pub name: &'g str,
    /// Identifier unique along the base chain.
    pub id: usize,
    pub delegate_type: &'g str,
    pub generate_managed_event: bool,
    pub generate_managed_field: bool,
    pub expose_to_script: bool,
}

impl Graph {
    /// View `field` as a dependent property, if it is one.
    pub fn dependency_property(&self, field: MemberId) -> Option<DependencyProperty<'_>> {
        let member = self.get(field);
        let info = member.as_field()?;
        let name = member.name.strip_suffix("Property")?;
        let a = &member.annotations;
        let property_type = a.value("PropertyType")?;
        if !info.is_static || name.is_empty() {
            return None;
        }
        let owner = member.parent?;
        let accessors = a.flag("GenerateAccessors");

        Some(DependencyProperty {
            field,
            owner,
            name,
            property_type: TypeReference::from_spelling(property_type),
            default_value: a.value("DefaultValue"),
            validator: a.value("Validator"),
            auto_creator: a.value("AutoCreator"),
            is_attached: a.flag("Attached"),
            is_read_only: a.flag("ReadOnly"),
            always_change: a.flag("AlwaysChange"),
            is_nullable: a.flag("Nullable"),
            is_custom: a.flag("IsCustom"),
            generate_getter: accessors || a.flag("GenerateGetter"),
            generate_setter: accessors || a.flag("GenerateSetter"),
        })
    }

    /// Dependent properties declared directly on `ty`, ordered by name.
    pub fn dependency_properties(&self, ty: MemberId) -> Vec<DependencyProperty<'_>> {
        self.fields(ty)
            .into_iter()
            .filter_map(|f| self.dependency_property(f))
            .collect()
    }

    fn is_event_field(&self, field: MemberId) -> bool {
        let member = self.get(field);
        member.as_field().is_some_and(|f| f.is_static)
            && member.name.len() > "Event".len()
            && member.name.ends_with("Event")
    }

    /// Event fields declared directly on `ty`, ordered by name. Cached.
    pub fn event_fields(&self, ty: MemberId) -> &[MemberId] {
        match self.type_info(ty) {
            Some(info) => info.events.get_or_init(|| {
                self.fields(ty)
                    .into_iter()
                    .filter(|f| self.is_event_field(*f))
                    .collect()
            }).as_slice(),
            None => &[],
        }
    }

    /// Number of events declared along the base chain of `ty`, excluding `ty`.
    pub fn inherited_event_count(&self, ty: MemberId) -> usize {
        self.ancestors(ty).map(|a| self.event_fields(a).len()).sum()
    }

    /// Events declared directly on `ty`, with identifiers.
    pub fn events(&self, ty: MemberId) -> Vec<EventSlot<'_>> {
        let first = self.inherited_event_count(ty);
        self.event_fields(ty)
            .iter()
            .enumerate()
            .map(|(i, &field)| {
                let member = self.get(field);
                let a = &member.annotations;
                EventSlot {
                    field,
                    owner: ty,
                    name: member.name.strip_suffix("Event").unwrap_or(&member.name),
                    id: first + i,
                    delegate_type: a.value("DelegateType").unwrap_or("EventHandler"),
                    generate_managed_event: !a.contains("GenerateManagedEvent")
                        || a.flag("GenerateManagedEvent"),
                    generate_managed_field: a.flag("GenerateManagedEventField"),
                    expose_to_script: a.flag("GenerateJSBinding"),
                }
            })
            .collect()
    }

    /// The public zero-argument constructor of `ty`, if any. Cached.
    pub fn default_constructor(&self, ty: MemberId) -> Option<MemberId> {
        let info = self.type_info(ty)?;
        *info.default_constructor.get_or_init(|| {
            self.methods(ty).into_iter().find(|m| {
                let member = self.get(*m);
                member.visibility == Visibility::Public
                    && member
                        .as_method()
                        .is_some_and(|mi| mi.is_constructor && mi.params.is_empty())
            })
        })
    }

    /// True when `ty` declares a pure virtual method.
    pub fn is_abstract(&self, ty: MemberId) -> bool {
        self.methods(ty)
            .into_iter()
            .any(|m| self.get(m).as_method().is_some_and(|mi| mi.is_abstract))
    }

    /// Whether `ty` gets an automatic `<type>_new` factory.
    pub fn has_factory(&self, ty: MemberId) -> bool {
        let Some(info) = self.type_info(ty) else { return false };
        !info.is_synthetic
            && info.include_in_kinds
            && matches!(info.kind, TypeKind::Class | TypeKind::Struct)
            && !self.get(ty).annotations.contains("SkipFactories")
            && !self.is_abstract(ty)
            && self.default_constructor(ty).is_some()
    }
}
