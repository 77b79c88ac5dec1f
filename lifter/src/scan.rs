// scan.rs — Switch region locator and brace-hazard scan
//
// Finds the `switch (opcode) {` region by textual brace counting: the depth
// starts at 1 on the opening line and every later line adds its `{` count and
// subtracts its `}` count; the region ends on the first line where the depth
// reaches 0. The counter is line-granular and sees braces inside string
// literals, character literals and comments like any other brace. That is a
// known limitation; `brace_hazards` reports where it may bite.
//
// Preconditions: none.
// Postconditions: `open < close`, both valid line indices of the buffer.
// Failure modes: marker absent (`NotFound`), depth never returns to 0
//                (`Unterminated`).
// Side effects: none.

use std::ops::Range;

use crate::diag::LineSpan;
use crate::error::{Structure, TransformError};
use crate::lexer::{lex, Token};
use crate::source::SourceBuffer;

/// Net brace depth change of one line, counted textually.
pub fn brace_delta(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

/// Line range of a located switch: `open` holds the marker, `close` the brace
/// that brings the depth back to 0. Indices are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchRegion {
    pub open: usize,
    pub close: usize,
}

impl SwitchRegion {
    /// Lines strictly between the opening and closing lines.
    pub fn interior(&self) -> Range<usize> {
        self.open + 1..self.close
    }

    pub fn span(&self) -> LineSpan {
        LineSpan::lines(self.open, self.close)
    }
}

/// Locate the first switch region opened by `marker`.
pub fn locate_switch(buf: &SourceBuffer<'_>, marker: &str) -> Result<SwitchRegion, TransformError> {
    let open = buf.find_first(marker).ok_or_else(|| TransformError::NotFound {
        what: Structure::SwitchOpen,
        marker: marker.to_string(),
    })?;

    let mut depth: i64 = 1;
    for (idx, line) in buf.lines().iter().enumerate().skip(open + 1) {
        depth += brace_delta(line);
        if depth == 0 {
            return Ok(SwitchRegion { open, close: idx });
        }
    }

    let rest = buf.slice_text(open..buf.len());
    Err(TransformError::Unterminated {
        line: open + 1,
        hazard: brace_hazards(&rest, open).first().map(|h| h.line + 1),
    })
}

/// A brace the textual counter sees but the compiler would not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BraceHazard {
    /// 0-based line of the literal or comment holding the brace.
    pub line: usize,
    pub token: Token,
}

/// Find literals and comments containing `{` or `}` in `text`, whose first
/// line is line `first_line` of the buffer.
pub fn brace_hazards(text: &str, first_line: usize) -> Vec<BraceHazard> {
    lex(text)
        .tokens
        .into_iter()
        .filter(|(token, span)| {
            token.is_opaque() && text[span.start..span.end].contains(['{', '}'])
        })
        .map(|(token, span)| BraceHazard {
            line: first_line + text[..span.start].matches('\n').count(),
            token,
        })
        .collect()
}
