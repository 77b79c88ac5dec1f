// lift.rs — Replace an opcode switch with a dispatch-table lookup
//
// locate → hazard check → segment → emit → place:
//   1. find the first `switch (opcode) {` region (scan.rs);
//   2. look for braces hidden in literals or comments: rejected in strict
//      mode, a warning otherwise;
//   3. partition the region into case blocks (segment.rs);
//   4. swap the whole region, opening and closing lines included, for the
//      table lookup, indented like the `switch` line (emit.rs);
//   5. insert the table-init procedure inside the scope named by the last
//      line mentioning `scope_marker`: right after it when that line opens
//      the scope, right before it when that line closes the scope.
//
// Preconditions: none.
// Postconditions: on success the switch-open marker no longer occurs in the
//                 lifted region; on failure the input is not modified.
// Failure modes: NotFound (switch or scope marker), Unterminated,
//                EmptyPartition, DuplicateLabel, AmbiguousBraces (strict).
// Side effects: none.

use tracing::{debug, info, warn};

use crate::config::LiftConfig;
use crate::diag::{codes, Diagnostic, LineSpan};
use crate::emit::{emit_call_site, emit_table_init};
use crate::error::{Structure, TransformError};
use crate::scan::{brace_hazards, locate_switch, SwitchRegion};
use crate::segment::{segment, Partition};
use crate::source::{indentation, push_line, SourceBuffer};

#[derive(Debug, Clone)]
pub struct LiftResult {
    pub text: String,
    /// Region of the input that was replaced.
    pub region: SwitchRegion,
    pub partition: Partition,
    /// 0-based line of the output where the table-init procedure starts.
    pub init_line: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Where the table-init procedure goes relative to the scope marker line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The marker line opens the scope: insert after it.
    After(usize),
    /// The marker line closes the scope: insert before it.
    Before(usize),
}

/// Scan backward for the last line mentioning `marker` and decide which side
/// of it is inside the scope.
pub fn find_placement(buf: &SourceBuffer<'_>, marker: &str) -> Option<Placement> {
    let idx = buf.lines().iter().rposition(|l| l.contains(marker))?;
    let line = buf.lines()[idx];
    let after_marker = line.find(marker).map_or("", |at| &line[at + marker.len()..]);
    let opens = after_marker.contains('{') && !line.trim_start().starts_with('}');
    Some(if opens {
        Placement::After(idx)
    } else {
        Placement::Before(idx)
    })
}

pub fn lift_switch(
    source: &str,
    config: &LiftConfig,
    strict: bool,
) -> Result<LiftResult, TransformError> {
    let buf = SourceBuffer::new(source);
    let mut diagnostics = Vec::new();

    let region = locate_switch(&buf, &config.switch_marker)?;
    debug!(
        open = region.open + 1,
        close = region.close + 1,
        "switch region located"
    );

    let region_text = buf.slice_text(region.open..region.close + 1);
    let hazards = brace_hazards(&region_text, region.open);
    if let Some(first) = hazards.first() {
        if strict {
            return Err(TransformError::AmbiguousBraces {
                line: first.line + 1,
                count: hazards.len(),
            });
        }
        warn!(
            count = hazards.len(),
            line = first.line + 1,
            "braces inside literals or comments in switch region"
        );
        diagnostics.push(
            Diagnostic::warning(
                codes::W0202,
                format!(
                    "{} brace(s) inside literals or comments; the region end may be wrong",
                    hazards.len()
                ),
            )
            .with_span(LineSpan::line(first.line))
            .with_hint("rerun with --strict to reject such regions"),
        );
    }

    let partition = segment(&buf, &region, config)?;
    if !partition.dangling.is_empty() {
        diagnostics.push(
            Diagnostic::warning(
                codes::W0201,
                format!(
                    "labels without a body of their own keep the unknown-opcode handler: {}",
                    partition.dangling.join(", ")
                ),
            )
            .with_span(region.span()),
        );
    }

    let indent = indentation(buf.lines()[region.open]);
    let mut rewritten = String::with_capacity(source.len() + 1024);
    rewritten.push_str(&buf.slice_text(0..region.open));
    rewritten.push_str(&emit_call_site(indent, config));
    rewritten.push_str(&buf.slice_text(region.close + 1..buf.len()));

    let out_buf = SourceBuffer::new(&rewritten);
    let placement =
        find_placement(&out_buf, &config.scope_marker).ok_or_else(|| TransformError::NotFound {
            what: Structure::Scope,
            marker: config.scope_marker.clone(),
        })?;

    let init = emit_table_init(&partition, config);
    let mut text = String::with_capacity(rewritten.len() + init.len() + 2);
    let init_line = match placement {
        Placement::After(idx) => {
            push_line(&mut text, &out_buf.slice_text(0..idx + 1));
            text.push('\n');
            text.push_str(&init);
            text.push_str(&out_buf.slice_text(idx + 1..out_buf.len()));
            idx + 2
        }
        Placement::Before(idx) => {
            text.push_str(&out_buf.slice_text(0..idx));
            text.push_str(&init);
            text.push('\n');
            text.push_str(&out_buf.slice_text(idx..out_buf.len()));
            idx
        }
    };

    info!(
        blocks = partition.cases.len(),
        opcodes = partition.opcode_count(),
        init_line = init_line + 1,
        "switch lifted into dispatch table"
    );

    Ok(LiftResult {
        text,
        region,
        partition,
        init_line,
        diagnostics,
    })
}
