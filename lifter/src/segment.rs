// segment.rs — Partition a switch region into case blocks
//
// Walks the lines strictly inside a located switch region and groups them
// into `CaseBlock`s: a set of opcode labels sharing one body. Consecutive
// labels with no code between them accumulate into one pending set, which is
// how fall-through cases merge. A pending set only becomes a block once a
// line with real code (not blank, not comment-only) has been seen after it.
// The `default:` body is kept separately and never emitted into the table;
// case labels sharing it get no block and keep the unknown-opcode handler.
//
// Labels are recognised by tokens (`case IDENT :`, `default :`) and only on
// lines that start at depth 1 of the region, so labels of a nested switch or
// inside comments stay part of the enclosing body.
//
// Preconditions: `region` was produced by `scan::locate_switch` on `buf`.
// Postconditions: every returned `CaseBlock` has at least one opcode and at
//                 least one code line; no opcode appears in two blocks.
// Failure modes: duplicate opcode (`DuplicateLabel`), no case block at all
//                (`EmptyPartition`).
// Side effects: none.

use std::collections::HashSet;

use crate::config::LiftConfig;
use crate::error::TransformError;
use crate::lexer::{is_code, lex, Token};
use crate::scan::{brace_delta, SwitchRegion};
use crate::source::{indentation, line_ending, SourceBuffer};

// ── Public types ────────────────────────────────────────────────────────────

/// Fall-through labels that share one body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseBlock {
    /// Opcode identifiers in the order their labels appear.
    pub opcodes: Vec<String>,
    /// Body lines, each ending in `\n`.
    pub body: Vec<String>,
    /// 0-based line of the first label.
    pub line: usize,
}

/// The `default:` body. Retained for reporting, never emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultBlock {
    pub body: Vec<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub cases: Vec<CaseBlock>,
    pub default: Option<DefaultBlock>,
    /// Labels that never got a body of their own: trailing labels, and labels
    /// sharing a body with `default:`. They keep the unknown-opcode handler.
    pub dangling: Vec<String>,
}

impl Partition {
    /// Total number of opcodes that receive a handler.
    pub fn opcode_count(&self) -> usize {
        self.cases.iter().map(|c| c.opcodes.len()).sum()
    }
}

// ── Label recognition ───────────────────────────────────────────────────────

/// One piece of a line that holds at least one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineItem<'a> {
    Case(&'a str),
    Default,
    /// Trimmed text between or after labels.
    Code(&'a str),
}

/// Split a line at its labels. Returns `None` when the line holds no label.
pub fn split_labels<'a>(line: &'a str, prefix: &str) -> Option<Vec<LineItem<'a>>> {
    let tokens = lex(line).tokens;
    // (start, end, item) of each label on the line
    let mut labels: Vec<(usize, usize, LineItem<'a>)> = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let (tok, span) = tokens[i];
        match tok {
            Token::Case => {
                if let (Some(&(Token::Ident, name)), Some(&(Token::Colon, colon))) =
                    (tokens.get(i + 1), tokens.get(i + 2))
                {
                    let ident = &line[name.start..name.end];
                    if ident.starts_with(prefix) {
                        labels.push((span.start, colon.end, LineItem::Case(ident)));
                        i += 3;
                        continue;
                    }
                }
            }
            Token::Default => {
                if let Some(&(Token::Colon, colon)) = tokens.get(i + 1) {
                    labels.push((span.start, colon.end, LineItem::Default));
                    i += 2;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }

    if labels.is_empty() {
        return None;
    }

    let mut items = Vec::with_capacity(labels.len() * 2);
    let mut cursor = 0;
    for (start, end, item) in labels {
        let between = line[cursor..start].trim();
        if !between.is_empty() {
            items.push(LineItem::Code(between));
        }
        items.push(item);
        cursor = end;
    }
    let rest = line[cursor..].trim();
    if !rest.is_empty() {
        items.push(LineItem::Code(rest));
    }
    Some(items)
}

// ── Partitioning ────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Pending {
    opcodes: Vec<String>,
    default: bool,
    body: Vec<String>,
    has_code: bool,
    line: usize,
}

impl Pending {
    fn new(line: usize) -> Self {
        Self {
            opcodes: Vec::new(),
            default: false,
            body: Vec::new(),
            has_code: false,
            line,
        }
    }

    fn push_body(&mut self, text: String) {
        self.has_code |= is_code(&text);
        self.body.push(text);
    }
}

struct Segmenter<'c> {
    config: &'c LiftConfig,
    cases: Vec<CaseBlock>,
    default: Option<DefaultBlock>,
    pending: Option<Pending>,
    dangling: Vec<String>,
    seen: HashSet<String>,
}

impl<'c> Segmenter<'c> {
    /// Close the pending set if code has been seen after it.
    fn settle(&mut self) {
        if !self.pending.as_ref().is_some_and(|p| p.has_code) {
            return;
        }
        let Some(p) = self.pending.take() else {
            return;
        };
        if p.default {
            // The body belongs to `default:`; opcodes sharing it stay unhandled.
            if self.default.is_none() {
                self.default = Some(DefaultBlock {
                    body: p.body,
                    line: p.line,
                });
            }
            self.dangling.extend(p.opcodes);
        } else if !p.opcodes.is_empty() {
            self.cases.push(CaseBlock {
                opcodes: p.opcodes,
                body: p.body,
                line: p.line,
            });
        }
    }

    fn label(&mut self, opcode: Option<&str>, idx: usize) -> Result<(), TransformError> {
        self.settle();
        let pending = self.pending.get_or_insert_with(|| Pending::new(idx));
        match opcode {
            Some(op) => {
                if !self.seen.insert(op.to_string()) {
                    return Err(TransformError::DuplicateLabel {
                        opcode: op.to_string(),
                        line: idx + 1,
                    });
                }
                pending.opcodes.push(op.to_string());
            }
            None => pending.default = true,
        }
        Ok(())
    }

    fn body(&mut self, text: String) {
        if let Some(p) = self.pending.as_mut() {
            p.push_body(text);
        }
    }
}

/// Partition the interior of `region` into case blocks.
pub fn segment(
    buf: &SourceBuffer<'_>,
    region: &SwitchRegion,
    config: &LiftConfig,
) -> Result<Partition, TransformError> {
    let mut seg = Segmenter {
        config,
        cases: Vec::new(),
        default: None,
        pending: None,
        dangling: Vec::new(),
        seen: HashSet::new(),
    };

    let mut depth: i64 = 1;
    for idx in region.interior() {
        let Some(line) = buf.line(idx) else {
            break;
        };
        let at_top = depth == 1;
        depth += brace_delta(line);

        let items = if at_top {
            split_labels(line, &seg.config.label_prefix)
        } else {
            None
        };
        let Some(items) = items else {
            seg.body(line.to_string());
            continue;
        };

        for item in items {
            match item {
                LineItem::Case(op) => seg.label(Some(op), idx)?,
                LineItem::Default => seg.label(None, idx)?,
                LineItem::Code(text) => {
                    let body_line = format!(
                        "{}{}{}{}",
                        indentation(line),
                        seg.config.indent,
                        text,
                        line_ending(line)
                    );
                    seg.body(body_line);
                }
            }
        }
    }
    seg.settle();

    if let Some(p) = seg.pending.take() {
        seg.dangling.extend(p.opcodes);
    }
    if seg.cases.is_empty() {
        return Err(TransformError::EmptyPartition {
            line: region.open + 1,
        });
    }

    Ok(Partition {
        cases: seg.cases,
        default: seg.default,
        dangling: seg.dangling,
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────
