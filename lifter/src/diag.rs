// diag.rs — Diagnostics model
//
// Shared diagnostic types reported by every pass. A diagnostic renders as a
// single line; the optional hint is shown separately by the CLI in verbose mode.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0101`, `W0202`).
///
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    // E01xx: locating structure
    pub const E0101: DiagCode = DiagCode("E0101"); // switch-open marker not found
    pub const E0102: DiagCode = DiagCode("E0102"); // switch region never closes
    pub const E0103: DiagCode = DiagCode("E0103"); // scope marker not found
    pub const E0104: DiagCode = DiagCode("E0104"); // constructor signature not found

    // E02xx: segmentation
    pub const E0201: DiagCode = DiagCode("E0201"); // no case blocks in region
    pub const E0202: DiagCode = DiagCode("E0202"); // duplicate opcode label
    pub const E0203: DiagCode = DiagCode("E0203"); // braces in literals (strict)

    // E09xx: environment
    pub const E0901: DiagCode = DiagCode("E0901"); // I/O
    pub const E0902: DiagCode = DiagCode("E0902"); // configuration
    pub const E0903: DiagCode = DiagCode("E0903"); // file changed during run

    pub const W0201: DiagCode = DiagCode("W0201"); // labels without body dropped
    pub const W0202: DiagCode = DiagCode("W0202"); // braces in literals (lenient)
    pub const W0301: DiagCode = DiagCode("W0301"); // constructor body not empty
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Line span ────────────────────────────────────────────────────────────

/// Inclusive 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    /// Span of a single line given its 0-based index.
    pub fn line(idx: usize) -> Self {
        Self {
            start: idx + 1,
            end: idx + 1,
        }
    }

    /// Span of 0-based lines `first..=last`.
    pub fn lines(first: usize, last: usize) -> Self {
        Self {
            start: first + 1,
            end: last + 1,
        }
    }
}

impl fmt::Display for LineSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "line {}", self.start)
        } else {
            write!(f, "lines {}-{}", self.start, self.end)
        }
    }
}

// ── Diagnostic ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    pub span: Option<LineSpan>,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn new(level: DiagLevel, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            span: None,
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(code: DiagCode, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Warning, message).with_code(code)
    }

    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: LineSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        match &self.code {
            Some(code) => write!(f, "{}[{}]: {}", level, code, self.message)?,
            None => write!(f, "{}: {}", level, self.message)?,
        }
        if let Some(span) = &self.span {
            write!(f, " ({})", span)?;
        }
        Ok(())
    }
}
