//! Annotation comments (`/* @key=value,... */`).
//!
//! The lexer hands over the text after the `@`; this module turns it into an
//! ordered key/value bag that drives per-declaration generation choices.

use indexmap::IndexMap;
use smol_str::SmolStr;
use std::fmt;
use thiserror::Error;

/// Errors produced while decoding an annotation comment.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("duplicate annotation key '{0}'")]
    DuplicateKey(String),

    #[error("empty annotation key at offset {0}")]
    EmptyKey(usize),

    #[error("expected ',' after quoted value of '{key}', found '{found}'")]
    TrailingText { key: String, found: char },
}

/// Ordered key/value pairs decoded from one annotation comment.
///
/// A key given without `=` has an absent value (`None`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    entries: IndexMap<SmolStr, Option<String>>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the body of an annotation comment.
    pub fn parse(text: &str) -> Result<Self, AnnotationError> {
        AnnotationReader::new(text).read()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The entry for `key`: `None` when missing, `Some(None)` when the key is
    /// present without a value.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries.get(key).map(|v| v.as_deref())
    }

    /// The value of `key`, if the key is present and carries one.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.as_deref())
    }

    /// True when `key` is present and not explicitly set to `false`.
    pub fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            None => false,
            Some(None) => true,
            Some(Some(v)) => !v.eq_ignore_ascii_case("false"),
        }
    }

    /// Insert a pair, rejecting duplicates.
    pub fn insert(
        &mut self,
        key: impl Into<SmolStr>,
        value: Option<String>,
    ) -> Result<(), AnnotationError> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(AnnotationError::DuplicateKey(key.to_string()));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl fmt::Display for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            for c in key.chars() {
                if matches!(c, '\\' | '=' | ',' | '"') {
                    f.write_str("\\")?;
                }
                write!(f, "{}", c)?;
            }
            let Some(value) = value else { continue };
            f.write_str("=")?;
            if needs_quotes(value) {
                f.write_str("\"")?;
                for c in value.chars() {
                    if matches!(c, '\\' | '"') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("\"")?;
            } else {
                f.write_str(value)?;
            }
        }
        Ok(())
    }
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.trim() != value
        || value.starts_with('"')
        || value.contains([',', '"', '\\'])
}

struct AnnotationReader {
    chars: Vec<char>,
    pos: usize,
}

impl AnnotationReader {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn read(mut self) -> Result<Annotations, AnnotationError> {
        let mut annotations = Annotations::new();

        loop {
            self.skip_whitespace();
            let Some(_) = self.peek() else { break };

            let start = self.pos;
            let key = self.read_until(&['=', ','])?;
            let key = key.trim();
            if key.is_empty() {
                if self.peek().is_none() {
                    break;
                }
                return Err(AnnotationError::EmptyKey(start));
            }

            let mut value = None;
            if self.peek() == Some('=') {
                self.pos += 1;
                self.skip_whitespace();
                if self.peek() == Some('"') {
                    self.pos += 1;
                    value = Some(self.read_quoted(key)?);
                } else {
                    value = Some(self.read_until(&[','])?.trim().to_string());
                }
            }

            if self.peek() == Some(',') {
                self.pos += 1;
            }

            annotations.insert(key, value)?;
        }

        Ok(annotations)
    }

    /// Read raw text up to (not including) one of `stops`, honouring `\`.
    fn read_until(&mut self, stops: &[char]) -> Result<String, AnnotationError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                if let Some(escaped) = self.peek() {
                    out.push(escaped);
                    self.pos += 1;
                }
                continue;
            }
            if stops.contains(&c) {
                break;
            }
            out.push(c);
            self.pos += 1;
        }
        Ok(out)
    }

    /// Read a quoted value; the opening quote is already consumed. An
    /// unterminated value runs to the end of the comment.
    fn read_quoted(&mut self, key: &str) -> Result<String, AnnotationError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => {
                    if let Some(escaped) = self.peek() {
                        out.push(escaped);
                        self.pos += 1;
                    }
                }
                '"' => {
                    self.skip_whitespace();
                    return match self.peek() {
                        None | Some(',') => Ok(out),
                        Some(found) => Err(AnnotationError::TrailingText {
                            key: key.to_string(),
                            found,
                        }),
                    };
                }
                _ => out.push(c),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{quickcheck, TestResult};

    #[test]
    fn test_bare_key_has_absent_value() {
        let a = Annotations::parse("GenerateCBinding").unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a.get("GenerateCBinding"), Some(None));
        assert!(a.flag("GenerateCBinding"));
    }

    #[test]
    fn test_quoted_value_is_stripped() {
        let a = Annotations::parse(r#"DefaultValue="new Foo()", PropertyType=Brush"#).unwrap();
        assert_eq!(a.value("DefaultValue"), Some("new Foo()"));
        assert_eq!(a.value("PropertyType"), Some("Brush"));
        let keys: Vec<_> = a.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["DefaultValue", "PropertyType"]);
    }

    #[test]
    fn test_quoted_value_may_contain_commas() {
        let a = Annotations::parse(r#"DefaultValue="Point (0, 0)",ReadOnly"#).unwrap();
        assert_eq!(a.value("DefaultValue"), Some("Point (0, 0)"));
        assert!(a.flag("ReadOnly"));
    }

    #[test]
    fn test_escape_outside_quotes() {
        let a = Annotations::parse(r"Validator=a\,b,Nullable").unwrap();
        assert_eq!(a.value("Validator"), Some("a,b"));
        assert!(a.contains("Nullable"));
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        let a = Annotations::parse(r#"DefaultValue="abc, def"#).unwrap();
        assert_eq!(a.value("DefaultValue"), Some("abc, def"));
    }

    #[test]
    fn test_text_after_closing_quote_is_rejected() {
        let err = Annotations::parse(r#"DefaultValue="abc" x"#).unwrap_err();
        assert!(matches!(err, AnnotationError::TrailingText { .. }));
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let err = Annotations::parse("ReadOnly,Nullable,ReadOnly").unwrap_err();
        assert_eq!(err, AnnotationError::DuplicateKey("ReadOnly".to_string()));
    }

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(matches!(
            Annotations::parse("ReadOnly,,Nullable"),
            Err(AnnotationError::EmptyKey(_))
        ));
    }

    #[test]
    fn test_trailing_comma_is_ignored() {
        let a = Annotations::parse("ReadOnly, ").unwrap();
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_flag_false() {
        let a = Annotations::parse("GenerateManagedEvent=false").unwrap();
        assert!(a.contains("GenerateManagedEvent"));
        assert!(!a.flag("GenerateManagedEvent"));
    }

    #[test]
    fn test_display_normalizes_whitespace() {
        let a = Annotations::parse(r#" PropertyType = double , DefaultValue = "0.0" "#).unwrap();
        insta::assert_snapshot!(a.to_string(), @"PropertyType=double,DefaultValue=0.0");
    }

    #[test]
    fn test_display_quotes_when_needed() {
        let a = Annotations::parse(r#"DefaultValue="Point (0, 0)",Empty="""#).unwrap();
        insta::assert_snapshot!(a.to_string(), @r#"DefaultValue="Point (0, 0)",Empty="""#);
    }

    fn round_trip(pairs: Vec<(String, Option<String>)>) -> TestResult {
        let mut original = Annotations::new();
        for (key, value) in pairs {
            let key = key.trim();
            if key.is_empty() || original.contains(key) {
                continue;
            }
            if original.insert(key, value).is_err() {
                return TestResult::failed();
            }
        }
        let text = original.to_string();
        match Annotations::parse(&text) {
            Ok(parsed) => TestResult::from_bool(parsed == original),
            Err(_) => TestResult::failed(),
        }
    }

    #[test]
    fn test_round_trip_law() {
        quickcheck(round_trip as fn(Vec<(String, Option<String>)>) -> TestResult);
    }
}
