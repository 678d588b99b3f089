//! Header front end: tokenizer and structural parser.
//!
//! [`parse_header`] reads one annotated header into a [`typegen_model::Graph`].
//! Several headers are parsed into the same graph, one after another.

mod error;
mod lexer;
mod parser;
mod stream;
mod token;

pub use error::{ParseError, Result};
pub use lexer::tokenize;
pub use parser::{parse_header, HeaderOutput};
pub use stream::TokenStream;
pub use token::{Token, TokenKind};
