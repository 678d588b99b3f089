use miette::Diagnostic;
use thiserror::Error;

/// Fatal errors raised while building or ordering the type graph.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum GraphError {
    #[error("duplicate member '{signature}' in '{scope}'")]
    #[diagnostic(
        code(typegen::graph::duplicate_member),
        help("two declarations in one scope have the same signature")
    )]
    DuplicateMember { scope: String, signature: String },

    #[error("dependency cycle in property registration order: {remaining} types could not be ordered ({types})")]
    #[diagnostic(
        code(typegen::graph::dependency_cycle),
        help("a default value must not depend, directly or through a base class, on the type that declares it")
    )]
    DependencyCycle { remaining: usize, types: String },

    #[error("inheritance cycle through '{0}'")]
    #[diagnostic(code(typegen::graph::inheritance_cycle))]
    InheritanceCycle(String),
}
