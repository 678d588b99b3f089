//! Indentation-aware text buffer shared by all emitters.

/// First line of every generated file. No timestamps, so identical input
/// yields identical bytes.
pub const BANNER: &str = "This file is generated by typegen. Do not edit; changes will be overwritten.";

pub(crate) struct CodeWriter {
    output: String,
    indent: usize,
    unit: &'static str,
}

impl CodeWriter {
    /// A buffer that starts with the banner as a `//` comment.
    pub fn new(unit: &'static str) -> Self {
        let mut w = Self {
            output: String::new(),
            indent: 0,
            unit,
        };
        w.writeln(&format!("// {}", BANNER));
        w.blank();
        w
    }

    /// Tab-indented native code.
    pub fn native() -> Self {
        Self::new("\t")
    }

    /// Space-indented managed code.
    pub fn managed() -> Self {
        Self::new("    ")
    }

    pub fn writeln(&mut self, s: &str) {
        if !s.is_empty() {
            for _ in 0..self.indent {
                self.output.push_str(self.unit);
            }
            self.output.push_str(s);
        }
        self.output.push('\n');
    }

    pub fn blank(&mut self) {
        self.output.push('\n');
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// `line` followed by an indented block.
    pub fn open(&mut self, line: &str) {
        self.writeln(line);
        self.indent();
    }

    pub fn close(&mut self, line: &str) {
        self.dedent();
        self.writeln(line);
    }

    pub fn finish(self) -> String {
        self.output
    }
}
