// source.rs — Line-preserving source buffer
//
// Splits C-family source text into lines that keep their own terminators, so
// that joining the lines reproduces the input byte for byte. Every pass works
// on a borrowed buffer and produces a new `String`; nothing is mutated in place.
//
// Preconditions: input is valid UTF-8.
// Postconditions: `SourceBuffer::new(s).to_text() == s` for every `s`.
// Failure modes: none.
// Side effects: none.

use std::ops::Range;

/// An ordered sequence of source lines, each including its `\n` (the last
/// line may lack one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer<'a> {
    lines: Vec<&'a str>,
}

impl<'a> SourceBuffer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.split_inclusive('\n').collect(),
        }
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, idx: usize) -> Option<&'a str> {
        self.lines.get(idx).copied()
    }

    /// Index of the first line containing `needle`.
    pub fn find_first(&self, needle: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.contains(needle))
    }

    /// Concatenate a range of lines back into text.
    pub fn slice_text(&self, range: Range<usize>) -> String {
        self.lines[range].concat()
    }

    pub fn to_text(&self) -> String {
        self.lines.concat()
    }
}

/// Leading horizontal whitespace of a line.
pub fn indentation(line: &str) -> &str {
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

/// Terminator of `line`: `\r\n` for CRLF lines, `\n` otherwise.
pub fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Append `text` to `out`, adding a trailing newline if it has none.
pub fn push_line(out: &mut String, text: &str) {
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_ending_follows_the_line() {
        assert_eq!(line_ending("a();\r\n"), "\r\n");
        assert_eq!(line_ending("a();\n"), "\n");
        assert_eq!(line_ending("a();"), "\n");
    }

    #[test]
    fn lines_keep_terminators() {
        let buf = SourceBuffer::new("a\nb\r\nc");
        assert_eq!(buf.lines(), &["a\n", "b\r\n", "c"]);
        assert_eq!(buf.to_text(), "a\nb\r\nc");
    }

    #[test]
    fn empty_text_has_no_lines() {
        let buf = SourceBuffer::new("");
        assert!(buf.is_empty());
        assert_eq!(buf.to_text(), "");
    }

    #[test]
    fn find_first_returns_earliest_line() {
        let buf = SourceBuffer::new("x\nswitch (opcode) {\nswitch (opcode) {\n");
        assert_eq!(buf.find_first("switch (opcode) {"), Some(1));
        assert_eq!(buf.find_first("nope"), None);
    }

    #[test]
    fn indentation_stops_at_first_non_blank() {
        assert_eq!(indentation("    \tfoo();\n"), "    \t");
        assert_eq!(indentation("foo"), "");
        assert_eq!(indentation("   \n"), "   ");
    }

    #[test]
    fn push_line_terminates_once() {
        let mut out = String::new();
        push_line(&mut out, "a\n");
        push_line(&mut out, "b");
        assert_eq!(out, "a\nb\n");
    }
}
