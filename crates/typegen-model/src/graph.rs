//! Arena-backed member tree.
//!
//! Every node lives in one `Vec`; parents own the ids of their children and
//! children keep a plain parent id. Base-chain walks are index lookups.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::error::GraphError;
use crate::member::{Member, MemberId, MemberKind, TypeInfo};
use crate::type_ref::TypeReference;

const ROOT: MemberId = MemberId(0);

#[derive(Debug)]
pub struct Graph {
    members: Vec<Member>,
    types_by_name: FxHashMap<SmolStr, Vec<MemberId>>,
    anonymous_counts: FxHashMap<MemberId, u32>,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            members: vec![Member::new("", MemberKind::Scope)],
            types_by_name: FxHashMap::default(),
            anonymous_counts: FxHashMap::default(),
        }
    }

    /// The global scope.
    pub fn root(&self) -> MemberId {
        ROOT
    }

    pub fn get(&self, id: MemberId) -> &Member {
        &self.members[id.index()]
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.len() <= 1
    }

    /// Insert `member` under `parent`.
    ///
    /// Fails when the parent already holds a member with the same signature.
    /// Anonymous members are disambiguated with a per-parent counter instead.
    pub fn add_child(&mut self, parent: MemberId, mut member: Member) -> Result<MemberId, GraphError> {
        let mut signature = member.base_signature();
        if member.is_anonymous() && !matches!(member.kind, MemberKind::Method(_)) {
            let count = self.anonymous_counts.entry(parent).or_insert(0);
            *count += 1;
            signature = SmolStr::new(format!("<anonymous>{}", count));
        }

        if self.get(parent).children.contains_key(&signature) {
            return Err(GraphError::DuplicateMember {
                scope: self.display_name(parent),
                signature: signature.to_string(),
            });
        }

        let id = MemberId(self.members.len() as u32);
        member.parent = Some(parent);
        // The cell is fresh; `set` only fails if it was already initialised.
        let _ = member.signature.set(signature.clone());

        if member.is_type() && !member.is_anonymous() {
            self.types_by_name
                .entry(member.name.clone())
                .or_default()
                .push(id);
        }

        self.members.push(member);
        self.members[parent.index()].children.insert(signature, id);
        Ok(id)
    }

    /// Make `id` resolvable under an extra spelling (`gint32` for `int`).
    pub fn add_alias(&mut self, alias: &str, id: MemberId) {
        let ids = self.types_by_name.entry(SmolStr::new(alias)).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = MemberId> {
        (0..self.members.len() as u32).map(MemberId)
    }

    /// All types, in arena order.
    pub fn types(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.ids().filter(|id| self.get(*id).is_type())
    }

    /// Parsed (non-synthetic) types ordered by qualified name.
    pub fn declared_types(&self) -> Vec<MemberId> {
        let mut ids: Vec<MemberId> = self
            .types()
            .filter(|id| self.type_info(*id).is_some_and(|t| !t.is_synthetic))
            .collect();
        ids.sort_by_key(|id| self.qualified_name(*id));
        ids
    }

    pub fn children(&self, id: MemberId) -> impl Iterator<Item = MemberId> + '_ {
        self.get(id).children.values().copied()
    }

    /// Children sorted by signature, independent of insertion order.
    pub fn sorted_children(&self, id: MemberId) -> Vec<MemberId> {
        let mut ids: Vec<MemberId> = self.children(id).collect();
        ids.sort_by(|a, b| self.get(*a).signature().cmp(self.get(*b).signature()));
        ids
    }

    pub fn methods(&self, id: MemberId) -> Vec<MemberId> {
        self.sorted_children(id)
            .into_iter()
            .filter(|c| self.get(*c).as_method().is_some())
            .collect()
    }

    pub fn fields(&self, id: MemberId) -> Vec<MemberId> {
        self.sorted_children(id)
            .into_iter()
            .filter(|c| self.get(*c).as_field().is_some())
            .collect()
    }

    pub fn type_info(&self, id: MemberId) -> Option<&TypeInfo> {
        self.get(id).as_type()
    }

    pub(crate) fn type_info_mut(&mut self, id: MemberId) -> Option<&mut TypeInfo> {
        match &mut self.members[id.index()].kind {
            MemberKind::Type(t) => Some(t),
            _ => None,
        }
    }

    /// Find a type by simple or `::`-qualified name.
    pub fn find_type(&self, name: &str) -> Option<MemberId> {
        let name = name.trim();
        if let Some(ids) = self.types_by_name.get(name) {
            return ids.first().copied();
        }
        let simple = name.rsplit("::").next()?;
        let ids = self.types_by_name.get(simple)?;
        ids.iter()
            .copied()
            .find(|id| self.qualified_name(*id) == name)
            .or_else(|| ids.first().copied())
    }

    pub fn resolve(&self, ty: &TypeReference) -> Option<MemberId> {
        if ty.name == "char" && ty.pointer_depth > 0 {
            return self.find_type("char*");
        }
        self.find_type(&ty.name)
    }

    /// The modelled base type, if it resolves.
    pub fn base(&self, id: MemberId) -> Option<MemberId> {
        let base = self.type_info(id)?.base.as_ref()?;
        self.resolve(base).filter(|b| *b != id)
    }

    /// Base chain of `id`, nearest first. Stops if the chain loops.
    pub fn ancestors(&self, id: MemberId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.base(id),
            remaining: self.members.len(),
        }
    }

    /// Walk up parents until a type is found.
    pub fn enclosing_type(&self, id: MemberId) -> Option<MemberId> {
        let mut current = self.get(id).parent;
        while let Some(p) = current {
            if self.get(p).is_type() {
                return Some(p);
            }
            current = self.get(p).parent;
        }
        None
    }

    /// `Outer::Inner` style name. The global scope contributes nothing.
    pub fn qualified_name(&self, id: MemberId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ROOT {
                break;
            }
            parts.push(self.get(c).name.as_str());
            current = self.get(c).parent;
        }
        parts.reverse();
        parts.join("::")
    }

    fn display_name(&self, id: MemberId) -> String {
        if id == ROOT {
            "<global>".to_string()
        } else {
            self.qualified_name(id)
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Ancestors<'g> {
    graph: &'g Graph,
    next: Option<MemberId>,
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = MemberId;

    fn next(&mut self) -> Option<MemberId> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next?;
        self.next = self.graph.base(current);
        Some(current)
    }
}
