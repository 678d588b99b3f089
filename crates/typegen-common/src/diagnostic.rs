//! Warning collection for the generator.
//!
//! Semantic gaps never abort a run. They are recorded here, logged once, and
//! handed back to the caller together with the generated artifacts.

use miette::Diagnostic as MietteDiagnostic;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::location::Location;

#[derive(Debug, Clone, Error, MietteDiagnostic, PartialEq, Eq)]
#[error("{message}")]
#[diagnostic(severity(Warning))]
pub struct Diagnostic {
    pub message: String,
    pub location: Option<Location>,
    #[help]
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            help: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Per-run sink for non-fatal diagnostics.
///
/// Identical messages are reported only once per run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    seen: FxHashSet<String>,
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        if !self.seen.insert(diagnostic.message.clone()) {
            return;
        }
        match &diagnostic.location {
            Some(loc) => tracing::warn!(location = %loc, "{}", diagnostic.message),
            None => tracing::warn!("{}", diagnostic.message),
        }
        self.items.push(diagnostic);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.report(Diagnostic::warning(message));
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_warnings_are_reported_once() {
        let mut diags = Diagnostics::new();
        diags.warn("unknown type 'Foo'");
        diags.warn("unknown type 'Foo'");
        diags.warn("unknown type 'Bar'");

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.warnings().count(), 2);
    }

    #[test]
    fn test_location_and_help_are_kept() {
        let mut diags = Diagnostics::new();
        diags.report(
            Diagnostic::warning("missing Widget.cs")
                .with_location(Location::new("src/widget.h", 12))
                .with_help("add the managed partial class"),
        );
        let warning = diags.warnings().next().unwrap();
        assert_eq!(warning.location.as_ref().map(|l| l.line), Some(12));
        assert_eq!(warning.help.as_deref(), Some("add the managed partial class"));
    }
}
