//! Emitters: pure projections of the resolved graph into generated sources.
//!
//! Every emitter reads a [`Model`] and returns the full text of one artifact.
//! Semantic gaps are reported through [`Diagnostics`] and replaced by a
//! placeholder so the remaining output still compiles.

mod bridge;
mod cbinding;
mod events;
mod kinds;
mod pinvoke;
mod registration;
mod select;
mod type_table;
mod wrappers;
mod writer;

use std::path::PathBuf;

use typegen_common::{Diagnostics, SourceMap};
use typegen_model::{Graph, SortedProperties};

pub use bridge::emit_bridge;
pub use cbinding::{emit_cbindings, CBindings};
pub use events::{emit_managed_events, emit_native_events};
pub use kinds::{emit_managed_kinds, emit_native_kinds};
pub use pinvoke::emit_native_methods;
pub use registration::emit_registration;
pub use type_table::emit_type_table;
pub use wrappers::emit_wrappers;
pub use writer::BANNER;

/// Everything the emitters read.
#[derive(Clone, Copy)]
pub struct Model<'a> {
    pub graph: &'a Graph,
    pub sorted: &'a SortedProperties,
    pub sources: &'a SourceMap,
    /// Requisite typedefs collected while parsing.
    pub typedefs: &'a [String],
}

/// Settings that only some emitters need.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Shared library named in foreign-function declarations.
    pub library: String,
    /// Root of the hand-written managed sources.
    pub managed_root: PathBuf,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            library: "moon".to_string(),
            managed_root: PathBuf::from("managed"),
        }
    }
}

/// One generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Artifact {
    NativeKinds,
    TypeTable,
    Registration,
    CBindingHeader,
    CBindingSource,
    NativeEvents,
    NativeMethods,
    Wrappers,
    ManagedEvents,
    ManagedKinds,
    Bridge,
}

impl Artifact {
    pub const ALL: [Artifact; 11] = [
        Artifact::NativeKinds,
        Artifact::TypeTable,
        Artifact::Registration,
        Artifact::CBindingHeader,
        Artifact::CBindingSource,
        Artifact::NativeEvents,
        Artifact::NativeMethods,
        Artifact::Wrappers,
        Artifact::ManagedEvents,
        Artifact::ManagedKinds,
        Artifact::Bridge,
    ];

    /// Key used in the `[output]` configuration table.
    pub fn key(self) -> &'static str {
        match self {
            Artifact::NativeKinds => "native_kinds",
            Artifact::TypeTable => "type_table",
            Artifact::Registration => "registration",
            Artifact::CBindingHeader => "cbinding_header",
            Artifact::CBindingSource => "cbinding_source",
            Artifact::NativeEvents => "native_events",
            Artifact::NativeMethods => "native_methods",
            Artifact::Wrappers => "wrappers",
            Artifact::ManagedEvents => "managed_events",
            Artifact::ManagedKinds => "managed_kinds",
            Artifact::Bridge => "bridge",
        }
    }
}

/// Run every emitter, in [`Artifact::ALL`] order.
pub fn emit_all(
    model: &Model<'_>,
    options: &EmitOptions,
    diagnostics: &mut Diagnostics,
) -> Vec<(Artifact, String)> {
    let cbindings = emit_cbindings(model, diagnostics);
    tracing::debug!(
        forward_declarations = cbindings.forward_declarations.len(),
        "emitted C bindings"
    );
    vec![
        (Artifact::NativeKinds, emit_native_kinds(model.graph)),
        (Artifact::TypeTable, emit_type_table(model, diagnostics)),
        (Artifact::Registration, emit_registration(model, diagnostics)),
        (Artifact::CBindingHeader, cbindings.header),
        (Artifact::CBindingSource, cbindings.source),
        (Artifact::NativeEvents, emit_native_events(model)),
        (Artifact::NativeMethods, emit_native_methods(model, &options.library, diagnostics)),
        (Artifact::Wrappers, emit_wrappers(model, &options.managed_root, diagnostics)),
        (Artifact::ManagedEvents, emit_managed_events(model, diagnostics)),
        (Artifact::ManagedKinds, emit_managed_kinds(model.graph)),
        (Artifact::Bridge, emit_bridge(model, diagnostics)),
    ]
}
