//! Cursor over a token vector with the lookahead helpers the parser needs.

use std::path::Path;
use typegen_common::Location;

use crate::error::{ParseError, Result};
use crate::token::{Token, TokenKind};

/// Marker identifiers that wrap C linkage regions and carry no meaning.
const SENTINELS: &[&str] = &["G_BEGIN_DECLS", "G_END_DECLS"];

pub struct TokenStream<'a> {
    file: &'a Path,
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> TokenStream<'a> {
    /// Wrap `tokens`, dropping sentinel identifiers and any identifier listed
    /// in `skip`.
    pub fn new(file: &'a Path, text: &'a str, tokens: Vec<Token>, skip: &[String]) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| {
                t.kind != TokenKind::Identifier
                    || !(SENTINELS.contains(&t.value.as_str()) || skip.iter().any(|s| *s == t.value))
            })
            .collect();
        Self {
            file,
            text,
            tokens,
            pos: 0,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    pub fn at_punct(&self, c: char) -> bool {
        self.peek().is_some_and(|t| t.is_punct(c))
    }

    pub fn at_ident(&self, s: &str) -> bool {
        self.peek().is_some_and(|t| t.is_ident(s))
    }

    pub fn at_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    /// `::` at the cursor.
    pub fn at_scope_separator(&self) -> bool {
        self.at_punct(':') && self.peek_at(1).is_some_and(|t| t.is_punct(':'))
    }

    /// Consume the next token; running out of input is an error naming what
    /// was expected.
    pub fn next(&mut self, expected: &str) -> Result<Token> {
        match self.tokens.get(self.pos) {
            Some(token) => {
                self.pos += 1;
                Ok(token.clone())
            }
            None => Err(self.eof(expected)),
        }
    }

    pub fn accept_punct(&mut self, c: char) -> bool {
        if self.at_punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn accept_ident(&mut self, s: &str) -> bool {
        if self.at_ident(s) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect_punct(&mut self, c: char) -> Result<Token> {
        if self.at_punct(c) {
            return self.next("");
        }
        Err(self.unexpected(&format!("'{}'", c)))
    }

    pub fn expect_identifier(&mut self, what: &str) -> Result<Token> {
        if self.at_kind(TokenKind::Identifier) {
            return self.next(what);
        }
        Err(self.unexpected(what))
    }

    /// Location of the token under the cursor, or of the last token at EOF.
    pub fn location(&self) -> Location {
        let line = self
            .peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(0);
        Location::new(self.file, line)
    }

    pub fn location_at(&self, line: u32) -> Location {
        Location::new(self.file, line)
    }

    pub fn location_of(&self, token: &Token) -> Location {
        Location::new(self.file, token.line)
    }

    /// Error for the token under the cursor.
    pub fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::Unexpected {
                location: self.location_of(token),
                found: token.to_string(),
                expected: expected.to_string(),
            },
            None => self.eof(expected),
        }
    }

    fn eof(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedEof {
            location: self.location(),
            expected: expected.to_string(),
        }
    }

    /// Source text covering `first..=last`, with line continuations removed.
    pub fn text_between(&self, first: &Token, last: &Token) -> String {
        let end = last.end.max(first.start);
        self.text
            .get(first.start..end)
            .unwrap_or_default()
            .replace("\\\r\n", "")
            .replace("\\\n", "")
    }

    /// Consume tokens up to and including the `close` that balances an
    /// already consumed `open`.
    pub fn skip_balanced(&mut self, open: char, close: char) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            let token = self.next(&format!("'{}'", close))?;
            if token.is_punct(open) {
                depth += 1;
            } else if token.is_punct(close) {
                depth -= 1;
            }
        }
        Ok(())
    }

    /// Capture the raw text of an expression that ends before one of
    /// `terminators` at nesting depth zero. The terminator is not consumed.
    pub fn capture_until(&mut self, terminators: &[char], what: &str) -> Result<Option<String>> {
        let mut first: Option<Token> = None;
        let mut last: Option<Token> = None;
        let mut depth = 0usize;
        loop {
            let Some(token) = self.peek() else {
                return Err(self.eof(what));
            };
            if depth == 0 && terminators.iter().any(|c| token.is_punct(*c)) {
                break;
            }
            if token.kind == TokenKind::Punctuation {
                match token.value.as_str() {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            return Err(self.unexpected(what));
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
            }
            let token = self.next(what)?;
            if first.is_none() {
                first = Some(token.clone());
            }
            last = Some(token);
        }
        Ok(match (first, last) {
            (Some(first), Some(last)) => Some(self.text_between(&first, &last)),
            _ => None,
        })
    }

    /// Consume through the `;` that ends the current declaration, stepping
    /// over nested brackets. Returns the last consumed token.
    pub fn skip_to_semicolon(&mut self) -> Result<Token> {
        self.capture_until(&[';'], "';'")?;
        self.expect_punct(';')
    }

    /// Consume a declaration that ends either with `;` or with a braced
    /// body (plus an optional trailing `;`).
    pub fn skip_declaration(&mut self) -> Result<()> {
        loop {
            let token = self.next("';'")?;
            if token.is_punct(';') {
                return Ok(());
            }
            if token.is_punct('{') {
                self.skip_balanced('{', '}')?;
                self.accept_punct(';');
                return Ok(());
            }
            if token.is_punct('(') {
                self.skip_balanced('(', ')')?;
            } else if token.is_punct('[') {
                self.skip_balanced('[', ']')?;
            }
        }
    }

    /// Consume a `<...>` template argument list whose `<` is at the cursor.
    /// Returns the text between the brackets.
    pub fn template_arguments(&mut self) -> Result<String> {
        let open = self.expect_punct('<')?;
        let mut depth = 1usize;
        let mut last = open.clone();
        while depth > 0 {
            let token = self.next("'>'")?;
            if token.is_punct('<') {
                depth += 1;
            } else if token.is_punct('>') {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            last = token;
        }
        if last == open {
            return Ok(String::new());
        }
        let start = open.end;
        let end = last.end;
        Ok(self
            .text
            .get(start..end)
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}
