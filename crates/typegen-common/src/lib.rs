mod diagnostic;
mod location;
mod source;

pub use diagnostic::{Diagnostic, Diagnostics};
pub use location::Location;
pub use source::{SourceFile, SourceId, SourceMap};
