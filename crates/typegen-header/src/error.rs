use miette::Diagnostic;
use thiserror::Error;
use typegen_common::Location;
use typegen_model::{AnnotationError, GraphError};

/// Fatal lexical and grammar errors. Every variant knows where it happened.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("{location}: unexpected '{found}', expected {expected}")]
    #[diagnostic(code(typegen::parse::unexpected_token))]
    Unexpected {
        location: Location,
        found: String,
        expected: String,
    },

    #[error("{location}: unexpected end of input, expected {expected}")]
    #[diagnostic(code(typegen::parse::unexpected_eof))]
    UnexpectedEof { location: Location, expected: String },

    #[error("{location}: unterminated {what}")]
    #[diagnostic(code(typegen::lex::unterminated))]
    Unterminated { location: Location, what: &'static str },

    #[error("{location}: unexpected character '{ch}'")]
    #[diagnostic(code(typegen::lex::invalid_character))]
    InvalidCharacter { location: Location, ch: char },

    #[error("{location}: malformed annotation: {source}")]
    #[diagnostic(code(typegen::parse::annotation))]
    Annotation {
        location: Location,
        #[source]
        source: AnnotationError,
    },

    #[error("{location}: {source}")]
    #[diagnostic(code(typegen::parse::graph))]
    Graph {
        location: Location,
        #[source]
        source: GraphError,
    },
}

impl ParseError {
    pub fn location(&self) -> &Location {
        match self {
            ParseError::Unexpected { location, .. }
            | ParseError::UnexpectedEof { location, .. }
            | ParseError::Unterminated { location, .. }
            | ParseError::InvalidCharacter { location, .. }
            | ParseError::Annotation { location, .. }
            | ParseError::Graph { location, .. } => location,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
