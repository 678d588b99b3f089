//! Header tokenizer.
//!
//! Line continuations are joined first, then the text is split into
//! identifiers, literals, punctuation and annotation comments. Preprocessor
//! lines and ordinary comments never reach the parser.

use std::path::Path;
use typegen_common::Location;

use crate::error::{ParseError, Result};
use crate::token::{Token, TokenKind};

const PUNCTUATION: &[char] = &[
    '{', '}', '(', ')', '[', ']', ';', ':', ',', '=', '*', '&', '<', '>', '~', '+', '-', '/', '|',
    '!', '?', '.', '^', '%',
];

/// A character of the logical (continuation-joined) text.
#[derive(Debug, Clone, Copy)]
struct Char {
    offset: usize,
    ch: char,
    line: u32,
}

/// Split `text` into tokens.
pub fn tokenize(file: &Path, text: &str) -> Result<Vec<Token>> {
    Lexer::new(file, text).run()
}

struct Lexer<'a> {
    file: &'a Path,
    chars: Vec<Char>,
    pos: usize,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(file: &'a Path, text: &str) -> Self {
        Self {
            file,
            chars: join_continuations(text),
            pos: 0,
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|c| c.ch)
    }

    fn location(&self) -> Location {
        let line = self
            .chars
            .get(self.pos)
            .or_else(|| self.chars.last())
            .map(|c| c.line)
            .unwrap_or(1);
        Location::new(self.file, line)
    }

    fn push(&mut self, kind: TokenKind, value: String, first: usize, last: usize) {
        let first = self.chars[first];
        let last = self.chars[last];
        self.tokens.push(Token {
            kind,
            value,
            line: first.line,
            start: first.offset,
            end: last.offset + last.ch.len_utf8(),
        });
    }

    fn run(mut self) -> Result<Vec<Token>> {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                self.at_line_start = true;
                self.pos += 1;
                continue;
            }
            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }
            if c == '#' && self.at_line_start {
                self.skip_line();
                continue;
            }
            self.at_line_start = false;

            match c {
                '/' if self.peek(1) == Some('*') => self.block_comment()?,
                '/' if self.peek(1) == Some('/') => self.skip_line(),
                '"' | '\'' => self.literal(c)?,
                c if c.is_ascii_alphanumeric() || c == '_' => self.word(),
                c if PUNCTUATION.contains(&c) => {
                    self.push(TokenKind::Punctuation, c.to_string(), self.pos, self.pos);
                    self.pos += 1;
                }
                ch => {
                    return Err(ParseError::InvalidCharacter {
                        location: self.location(),
                        ch,
                    })
                }
            }
        }
        Ok(self.tokens)
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    /// Identifiers and numeric runs (`0x10`, `1.5`) share one token kind.
    fn word(&mut self) {
        let first = self.pos;
        let numeric = self.peek(0).is_some_and(|c| c.is_ascii_digit());
        let mut value = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_ascii_alphanumeric() || c == '_' || (numeric && c == '.') {
                value.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        self.push(TokenKind::Identifier, value, first, self.pos - 1);
    }

    fn literal(&mut self, quote: char) -> Result<()> {
        let location = self.location();
        let first = self.pos;
        self.pos += 1;
        let unterminated = || ParseError::Unterminated {
            location: location.clone(),
            what: if quote == '"' { "string literal" } else { "character literal" },
        };
        let mut value = String::new();
        loop {
            match self.peek(0) {
                None | Some('\n') => return Err(unterminated()),
                Some('\\') => {
                    match self.peek(1) {
                        Some(escaped @ ('"' | '\'' | '\\')) => value.push(escaped),
                        Some(other) => {
                            value.push('\\');
                            value.push(other);
                        }
                        None => return Err(unterminated()),
                    }
                    self.pos += 2;
                }
                Some(c) if c == quote => break,
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
        self.push(TokenKind::Literal, value, first, self.pos);
        self.pos += 1;
        Ok(())
    }

    fn block_comment(&mut self) -> Result<()> {
        let location = self.location();
        let first = self.pos;
        self.pos += 2;
        let body_start = self.pos;
        loop {
            match (self.peek(0), self.peek(1)) {
                (Some('*'), Some('/')) => break,
                (Some(_), _) => self.pos += 1,
                (None, _) => {
                    return Err(ParseError::Unterminated {
                        location,
                        what: "comment",
                    })
                }
            }
        }
        let body: String = self.chars[body_start..self.pos].iter().map(|c| c.ch).collect();
        self.pos += 2;

        if let Some(properties) = body.trim_start().strip_prefix('@') {
            self.push(
                TokenKind::CommentProperty,
                properties.trim().to_string(),
                first,
                self.pos - 1,
            );
        }
        Ok(())
    }
}

/// Drop every backslash-newline pair while keeping physical line numbers.
fn join_continuations(text: &str) -> Vec<Char> {
    let mut out = Vec::with_capacity(text.len());
    let mut line = 1;
    let mut iter = text.char_indices().peekable();
    while let Some((offset, ch)) = iter.next() {
        if ch == '\\' {
            match iter.peek() {
                Some((_, '\n')) => {
                    iter.next();
                    line += 1;
                    continue;
                }
                Some((_, '\r')) => {
                    let mut ahead = iter.clone();
                    ahead.next();
                    if matches!(ahead.peek(), Some((_, '\n'))) {
                        iter.next();
                        iter.next();
                        line += 1;
                        continue;
                    }
                }
                _ => {}
            }
        }
        out.push(Char { offset, ch, line });
        if ch == '\n' {
            line += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(text: &str) -> Vec<Token> {
        tokenize(Path::new("test.h"), text).unwrap()
    }

    fn values(text: &str) -> Vec<String> {
        lex(text).into_iter().map(|t| t.value).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            values("class Widget : public Control { int x; };"),
            vec!["class", "Widget", ":", "public", "Control", "{", "int", "x", ";", "}", ";"]
        );
    }

    #[test]
    fn test_comments_are_discarded() {
        assert_eq!(values("int /* size */ x; // trailing\nint y;"), vec!["int", "x", ";", "int", "y", ";"]);
    }

    #[test]
    fn test_annotation_comment_is_one_token() {
        let tokens = lex("/* @GenerateCBinding,GeneratePInvoke */ void Foo ();");
        assert_eq!(tokens[0].kind, TokenKind::CommentProperty);
        assert_eq!(tokens[0].value, "GenerateCBinding,GeneratePInvoke");
        assert_eq!(tokens[1].value, "void");
    }

    #[test]
    fn test_preprocessor_lines_skipped() {
        let text = "#include <glib.h>\n#define FOO(x) \\\n  (x + 1)\nint y;\n  #endif\n";
        assert_eq!(values(text), vec!["int", "y", ";"]);
    }

    #[test]
    fn test_hash_inside_line_is_invalid() {
        let err = tokenize(Path::new("test.h"), "int # x;").unwrap_err();
        assert!(matches!(err, ParseError::InvalidCharacter { ch: '#', .. }));
    }

    #[test]
    fn test_line_continuation_joins_lines() {
        let tokens = lex("int long_\\\nname;\nint z;");
        assert_eq!(tokens[1].value, "long_name");
        assert_eq!(tokens[3].line, 3);
    }

    #[test]
    fn test_string_literal_escapes() {
        let tokens = lex(r#"extern "C\"q" x;"#);
        assert_eq!(tokens[1].kind, TokenKind::Literal);
        assert_eq!(tokens[1].value, "C\"q");
    }

    #[test]
    fn test_unterminated_literal() {
        let err = tokenize(Path::new("test.h"), "char *s = \"abc\n;").unwrap_err();
        assert!(matches!(err, ParseError::Unterminated { what: "string literal", .. }));
        assert_eq!(err.location().line, 1);
    }

    #[test]
    fn test_backslash_at_end_of_input() {
        let err = tokenize(Path::new("test.h"), "char *s = \"abc\\").unwrap_err();
        assert!(matches!(err, ParseError::Unterminated { what: "string literal", .. }));

        let err = tokenize(Path::new("test.h"), "char c = '\\").unwrap_err();
        assert!(matches!(err, ParseError::Unterminated { what: "character literal", .. }));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize(Path::new("test.h"), "int x;\n/* never closed").unwrap_err();
        assert!(matches!(err, ParseError::Unterminated { what: "comment", .. }));
    }

    #[test]
    fn test_numbers_are_identifiers() {
        let tokens = lex("x = 0x10; y = 1.5;");
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].value, "0x10");
        assert_eq!(tokens[6].value, "1.5");
    }

    #[test]
    fn test_line_numbers() {
        let tokens = lex("int a;\n\nint b;");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[3].line, 3);
    }

    #[test]
    fn test_byte_ranges() {
        let text = "enum E { A = 1 << 2 };";
        let tokens = lex(text);
        let one = tokens.iter().find(|t| t.value == "1").unwrap();
        let two = tokens.iter().find(|t| t.value == "2").unwrap();
        assert_eq!(&text[one.start..two.end], "1 << 2");
    }
}
