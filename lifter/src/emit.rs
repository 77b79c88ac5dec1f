// emit.rs — C++ generation for the lifted dispatch table
//
// Produces the two pieces of code that replace an opcode switch:
//   * the table-init procedure: sizes the table to 256 entries, fills every
//     slot with the unknown-opcode handler, then assigns one closure per
//     `CaseBlock` to all of the block's opcodes in a single chained assignment;
//   * the call site: a guarded lookup through the table that falls back to
//     the unknown-opcode report.
// Each case body is wrapped in `do { ... } while(0);` so a `break` in the
// original case still leaves the handler body and reaches `return`.
//
// Preconditions: `partition` came from `segment::segment` (non-empty cases).
// Postconditions: output is deterministic for a given partition and config.
// Failure modes: none.
// Side effects: none.

use std::fmt::Write as _;

use crate::config::LiftConfig;
use crate::segment::{CaseBlock, Partition};
use crate::source::push_line;

/// Number of table slots: one per value of a one-byte opcode.
pub const TABLE_SIZE: usize = 256;

// ── Public entry points ─────────────────────────────────────────────────────

/// Generate the table-init procedure for `partition`.
pub fn emit_table_init(partition: &Partition, config: &LiftConfig) -> String {
    let mut emitter = TableEmitter::new(config);
    emitter.emit_prologue();
    emitter.emit_default_fill();
    for case in &partition.cases {
        emitter.emit_case(case);
    }
    emitter.out.push_str("}\n");
    emitter.out
}

/// Generate the lookup that replaces the switch region. `indent` is the
/// indentation of the original `switch` line.
pub fn emit_call_site(indent: &str, config: &LiftConfig) -> String {
    let table = &config.table;
    let op = &config.opcode;
    let unit = &config.indent;
    let mut out = String::with_capacity(256);
    let _ = writeln!(out, "{indent}if ({table}[{op}]) {{");
    let _ = writeln!(
        out,
        "{indent}{unit}return {table}[{op}]({});",
        config.call_args()
    );
    let _ = writeln!(out, "{indent}}} else {{");
    let _ = writeln!(out, "{indent}{unit}{}", config.unknown_report);
    let _ = writeln!(out, "{indent}{unit}return {};", config.handled);
    let _ = writeln!(out, "{indent}}}");
    out
}

// ── Internal emitter ────────────────────────────────────────────────────────

struct TableEmitter<'a> {
    config: &'a LiftConfig,
    out: String,
}

impl<'a> TableEmitter<'a> {
    fn new(config: &'a LiftConfig) -> Self {
        TableEmitter {
            config,
            out: String::with_capacity(8192),
        }
    }

    /// `ty name, ty name, ...` for a handler that uses every parameter.
    fn full_params(&self) -> String {
        self.config
            .params
            .iter()
            .map(|p| format!("{} {}", p.ty, p.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Parameter list of the default handler: only the opcode is named.
    fn default_params(&self) -> String {
        self.config
            .params
            .iter()
            .map(|p| {
                if p.name == self.config.opcode {
                    format!("{} {}", p.ty, p.name)
                } else {
                    p.ty.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn emit_prologue(&mut self) {
        let c = self.config;
        let _ = writeln!(self.out, "void {}() {{", c.init_fn);
        let _ = writeln!(self.out, "{}{}.resize({});", c.indent, c.table, TABLE_SIZE);
    }

    fn emit_default_fill(&mut self) {
        let c = self.config;
        let ind = &c.indent;
        let params = self.default_params();
        let _ = writeln!(self.out, "{ind}// Default handler");
        let _ = writeln!(
            self.out,
            "{ind}for(int i=0; i<{TABLE_SIZE}; i++) {}[i] = []({params}) -> {} {{",
            c.table, c.return_type
        );
        let _ = writeln!(self.out, "{ind}{ind}{}", c.unknown_report);
        let _ = writeln!(self.out, "{ind}{ind}return {};", c.handled);
        let _ = writeln!(self.out, "{ind}}};");
        self.out.push('\n');
    }

    fn emit_case(&mut self, case: &CaseBlock) {
        let c = self.config;
        let ind = &c.indent;
        let targets = case
            .opcodes
            .iter()
            .map(|op| format!("{}[{}]", c.table, op))
            .collect::<Vec<_>>()
            .join(" = ");
        let params = self.full_params();
        let _ = writeln!(
            self.out,
            "{ind}{targets} = {}({params}) -> {} {{",
            c.capture, c.return_type
        );
        let _ = writeln!(self.out, "{ind}{ind}do {{");
        for line in &case.body {
            push_line(&mut self.out, line);
        }
        let _ = writeln!(self.out, "{ind}{ind}}} while(0);");
        let _ = writeln!(self.out, "{ind}{ind}return {};", c.handled);
        let _ = writeln!(self.out, "{ind}}};");
        self.out.push('\n');
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
