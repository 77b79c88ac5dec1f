// config.rs — Transform configuration
//
// Describes the textual shape of the interpreter being rewritten: the marker
// that opens the opcode switch, the label prefix, the enclosing scope, and the
// names used by the generated dispatch table. Defaults describe the
// `Interpreter.cpp` layout the tool was written for; a JSON file can override
// any subset of fields.
//
// Preconditions: none.
// Postconditions: a loaded config always has every field populated.
// Failure modes: malformed JSON or unknown fields (`RunError::Config`).
// Side effects: `load` reads one file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RunError;
use crate::pass::PassId;

/// One handler parameter, e.g. `std::shared_ptr<StackFrame> frame`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerParam {
    pub ty: String,
    pub name: String,
}

impl HandlerParam {
    pub fn new(ty: &str, name: &str) -> Self {
        Self {
            ty: ty.to_string(),
            name: name.to_string(),
        }
    }
}

/// Shape of the switch being lifted and of the code generated for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiftConfig {
    /// Literal text of the line that opens the opcode switch.
    pub switch_marker: String,
    /// Opcode identifiers start with this prefix (`case OP_ADD:`).
    pub label_prefix: String,
    /// Text identifying the scope the table-init procedure is placed in.
    pub scope_marker: String,
    pub table: String,
    /// Qualified name of the generated table-init procedure.
    pub init_fn: String,
    /// Constructor whose empty body gets the table-init call. `None` disables the hook.
    pub constructor: Option<String>,
    pub params: Vec<HandlerParam>,
    /// Name of the parameter carrying the opcode.
    pub opcode: String,
    pub return_type: String,
    /// Value a handler returns once it has handled an opcode.
    pub handled: String,
    pub capture: String,
    /// Statement reporting an unknown opcode.
    pub unknown_report: String,
    pub indent: String,
}

impl Default for LiftConfig {
    fn default() -> Self {
        Self {
            switch_marker: "switch (opcode) {".to_string(),
            label_prefix: "OP_".to_string(),
            scope_marker: "namespace core".to_string(),
            table: "instructionTable".to_string(),
            init_fn: "Interpreter::initInstructionTable".to_string(),
            constructor: Some(
                "Interpreter::Interpreter(j2me::loader::JarLoader& loader)".to_string(),
            ),
            params: vec![
                HandlerParam::new("std::shared_ptr<JavaThread>", "thread"),
                HandlerParam::new("std::shared_ptr<StackFrame>", "frame"),
                HandlerParam::new("util::DataReader&", "codeReader"),
                HandlerParam::new("uint8_t", "opcode"),
            ],
            opcode: "opcode".to_string(),
            return_type: "bool".to_string(),
            handled: "true".to_string(),
            capture: "[this]".to_string(),
            unknown_report: r#"std::cerr << "Unknown Opcode: 0x" << std::hex << (int)opcode << std::dec << std::endl;"#
                .to_string(),
            indent: "    ".to_string(),
        }
    }
}

impl LiftConfig {
    /// Unqualified name of the table-init procedure (`initInstructionTable`).
    pub fn init_fn_name(&self) -> &str {
        self.init_fn
            .rsplit("::")
            .next()
            .unwrap_or(self.init_fn.as_str())
    }

    /// Comma-separated argument list forwarding every handler parameter.
    pub fn call_args(&self) -> String {
        self.params
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Everything a run needs besides the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// Explicit pass order. Empty means the default pipeline.
    pub passes: Vec<PassId>,
    /// Reject switch regions with braces inside literals or comments.
    pub strict_braces: bool,
    pub lift: LiftConfig,
}

impl TransformConfig {
    /// Parse a JSON config; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, RunError> {
        let text = std::fs::read_to_string(path).map_err(|e| RunError::io(path, e))?;
        Self::from_json(&text).map_err(|source| RunError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The pass order for this run: the explicit list, or `hook` (when a
    /// constructor is configured) followed by `lift`.
    ///
    /// `unwrap` is never implied: a lifted case body that ends in its own
    /// block legitimately produces `} } while(0);`, and collapsing that would
    /// unbalance the handler. It is meant for output of rewrites that dropped
    /// the block's opening brace.
    pub fn pipeline(&self) -> Vec<PassId> {
        if !self.passes.is_empty() {
            return self.passes.clone();
        }
        let mut passes = Vec::with_capacity(2);
        if self.lift.constructor.is_some() {
            passes.push(PassId::Hook);
        }
        passes.push(PassId::Lift);
        passes
    }
}
