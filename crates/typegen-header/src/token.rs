use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    /// Quoted string or character literal; `value` holds the contents.
    Literal,
    /// A single punctuation character.
    Punctuation,
    /// The body of a `/* @... */` comment, after the `@`.
    CommentProperty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// 1-based physical line of the first character.
    pub line: u32,
    /// Byte range in the original text.
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punctuation && self.value.len() == 1 && self.value.starts_with(c)
    }

    pub fn is_ident(&self, s: &str) -> bool {
        self.kind == TokenKind::Identifier && self.value == s
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Literal => write!(f, "\"{}\"", self.value),
            TokenKind::CommentProperty => write!(f, "/* @{} */", self.value),
            _ => f.write_str(&self.value),
        }
    }
}
