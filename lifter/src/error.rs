// error.rs — Failure taxonomy for the passes and for a whole run
//
// `TransformError` is what a pass reports; `RunError` adds what can go wrong
// around the pipeline (files, configuration, the pass list). Each maps to a
// stable diagnostic code. Line numbers carried by errors are 1-based, as
// shown to the operator.
//
// Preconditions: none (types only).
// Postconditions: `to_diagnostic` always yields a single-line message.
// Failure modes: none.
// Side effects: none.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::diag::{codes, DiagCode, DiagLevel, Diagnostic, LineSpan};
use crate::pipeline::PipelineError;

/// A structural landmark a pass needs to find in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    SwitchOpen,
    Scope,
    Constructor,
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Structure::SwitchOpen => write!(f, "switch block"),
            Structure::Scope => write!(f, "enclosing scope marker"),
            Structure::Constructor => write!(f, "constructor signature"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("{what} not found (looking for `{marker}`)")]
    NotFound { what: Structure, marker: String },

    #[error("switch block opened on line {line} is never closed")]
    Unterminated {
        line: usize,
        /// First line holding a brace inside a literal or comment, if any.
        hazard: Option<usize>,
    },

    #[error("switch block on line {line} contains no case blocks")]
    EmptyPartition { line: usize },

    #[error("opcode {opcode} is labelled more than once (line {line})")]
    DuplicateLabel { opcode: String, line: usize },

    #[error("switch block has {count} brace characters inside literals or comments (first on line {line})")]
    AmbiguousBraces { line: usize, count: usize },
}

impl TransformError {
    pub fn code(&self) -> DiagCode {
        match self {
            TransformError::NotFound { what, .. } => match what {
                Structure::SwitchOpen => codes::E0101,
                Structure::Scope => codes::E0103,
                Structure::Constructor => codes::E0104,
            },
            TransformError::Unterminated { .. } => codes::E0102,
            TransformError::EmptyPartition { .. } => codes::E0201,
            TransformError::DuplicateLabel { .. } => codes::E0202,
            TransformError::AmbiguousBraces { .. } => codes::E0203,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::new(DiagLevel::Error, self.to_string()).with_code(self.code());
        match self {
            TransformError::NotFound {
                what: Structure::SwitchOpen,
                ..
            } => {
                diag = diag.with_hint("the switch may already have been lifted by an earlier run");
            }
            TransformError::Unterminated { line, hazard } => {
                diag = diag.with_span(LineSpan::line(line - 1));
                if let Some(h) = hazard {
                    diag = diag.with_hint(format!(
                        "line {h} has a brace inside a literal or comment, which the brace counter does not skip"
                    ));
                }
            }
            TransformError::EmptyPartition { line } => {
                diag = diag.with_span(LineSpan::line(line - 1));
            }
            TransformError::DuplicateLabel { line, .. } => {
                diag = diag.with_span(LineSpan::line(line - 1));
            }
            TransformError::AmbiguousBraces { line, .. } => {
                diag = diag
                    .with_span(LineSpan::line(line - 1))
                    .with_hint("move the brace out of the literal or comment, or run without --strict");
            }
            TransformError::NotFound { .. } => {}
        }
        diag
    }
}

/// Anything that can stop a run of the tool.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown pass `{0}` (expected hook, lift or unwrap)")]
    UnknownPass(String),

    #[error("{} changed on disk during the run; nothing written", .path.display())]
    ConcurrentModification { path: PathBuf },
}

impl RunError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code: 1 for transform failures, 2 for the environment.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Pipeline(_) => 1,
            _ => 2,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            RunError::Pipeline(err) => err.error.to_diagnostic(),
            RunError::Io { .. } => {
                Diagnostic::new(DiagLevel::Error, self.to_string()).with_code(codes::E0901)
            }
            RunError::Config { .. } | RunError::UnknownPass(_) => {
                Diagnostic::new(DiagLevel::Error, self.to_string()).with_code(codes::E0902)
            }
            RunError::ConcurrentModification { .. } => {
                Diagnostic::new(DiagLevel::Error, self.to_string()).with_code(codes::E0903)
            }
        }
    }
}
