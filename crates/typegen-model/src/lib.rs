//! In-memory type/member graph for the typegen code generator.
//!
//! The structural parser fills a [`Graph`]; built-ins are injected and the
//! kind-enumeration flag is propagated; after that the graph is only read.
//!
//! ```text
//! headers → parser → Graph → inject_builtins → propagate_kinds → sort_properties → emitters
//! ```

mod annotation;
mod builtins;
mod error;
mod foreign;
mod graph;
mod kinds;
mod member;
mod property;
mod sort;
mod type_ref;

pub use annotation::{AnnotationError, Annotations};
pub use builtins::{inject_builtins, ROOT_OBJECT};
pub use error::GraphError;
pub use foreign::{snake_case, ForeignMethod};
pub use graph::{Ancestors, Graph};
pub use kinds::derive_kind_name;
pub use member::{
    FieldInfo, Member, MemberId, MemberKind, MethodInfo, Parameter, TypeInfo, TypeKind, Visibility,
};
pub use property::{DependencyProperty, EventSlot};
pub use sort::{sort_properties, topological_sort, Cycle, SortedProperties};
pub use type_ref::{Marshal, Position, TypeReference};

use typegen_common::Diagnostics;

/// Inject built-ins and propagate inherited flags. After this the graph is
/// complete and emitters may read it.
pub fn finish(graph: &mut Graph, diagnostics: &mut Diagnostics) -> Result<(), GraphError> {
    inject_builtins(graph)?;
    graph.propagate_kinds(diagnostics)
}
