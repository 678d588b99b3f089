use std::fmt;
use std::path::PathBuf;

/// A file/line position used for error reporting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub file: PathBuf,
    /// 1-based line number; 0 when unknown.
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.file.display())
        } else {
            write!(f, "{}:{}", self.file.display(), self.line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_line() {
        let loc = Location::new("src/widget.h", 42);
        assert_eq!(loc.to_string(), "src/widget.h:42");
    }

    #[test]
    fn test_display_without_line() {
        let loc = Location::new("src/widget.h", 0);
        assert_eq!(loc.to_string(), "src/widget.h");
    }
}
