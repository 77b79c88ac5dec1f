// pipeline.rs — Ordered pass runner and run provenance
//
// Runs the requested passes in order, each consuming the buffer produced by
// the previous one. The run is all-or-nothing: the first failing pass stops
// it and no buffer is returned, so callers never see a partially rewritten
// source.
//
// Preconditions: none.
// Postconditions: on success, `PipelineOutput::text` is the result of every
//   pass applied in order; on failure, the caller's input is untouched.
// Failure modes: any pass returning a `TransformError`.
// Side effects: calls `on_pass_complete` after each successful pass.

use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::TransformConfig;
use crate::diag::Diagnostic;
use crate::error::TransformError;
use crate::hook::hook_constructor;
use crate::lift::lift_switch;
use crate::pass::{descriptor, PassId};
use crate::unwrap::unwrap_braces;

// ── Provenance ─────────────────────────────────────────────────────────────

/// Hashes tying an output to the input it was produced from.
///
/// `input_hash` / `output_hash`: SHA-256 of the source before and after the run.
/// `tool_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub input_hash: [u8; 32],
    pub output_hash: [u8; 32],
    pub tool_version: &'static str,
}

impl Provenance {
    pub fn compute(input: &str, output: &str) -> Self {
        Self {
            input_hash: sha256(input.as_bytes()),
            output_hash: sha256(output.as_bytes()),
            tool_version: env!("CARGO_PKG_VERSION"),
        }
    }

    pub fn input_hash_hex(&self) -> String {
        bytes_to_hex(&self.input_hash)
    }

    pub fn output_hash_hex(&self) -> String {
        bytes_to_hex(&self.output_hash)
    }
}

pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

// ── Outputs ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PassRecord {
    pub pass: PassId,
    pub elapsed: Duration,
    /// Whether the pass changed the buffer.
    pub changed: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub text: String,
    pub passes: Vec<PassRecord>,
    /// Warnings accumulated over all passes.
    pub diagnostics: Vec<Diagnostic>,
    /// Case blocks and opcodes lifted, when the lift pass ran.
    pub lifted: Option<(usize, usize)>,
    /// `} } while(0);` sites collapsed by the unwrap pass.
    pub unwrapped: usize,
    pub provenance: Provenance,
}

/// The run stopped at `failing_pass`; nothing was produced.
#[derive(Debug, Error)]
#[error("{} pass failed: {error}", .failing_pass.name())]
pub struct PipelineError {
    pub failing_pass: PassId,
    #[source]
    pub error: TransformError,
}

// ── Runner ─────────────────────────────────────────────────────────────────

struct PassOutcome {
    text: String,
    diagnostics: Vec<Diagnostic>,
}

/// Run `passes` in order over `source`.
pub fn run_pipeline(
    source: &str,
    passes: &[PassId],
    config: &TransformConfig,
    mut on_pass_complete: impl FnMut(PassId, &[Diagnostic]),
) -> Result<PipelineOutput, PipelineError> {
    let mut text = source.to_string();
    let mut records = Vec::with_capacity(passes.len());
    let mut diagnostics = Vec::new();
    let mut lifted = None;
    let mut unwrapped = 0;

    for &pass in passes {
        let t = Instant::now();
        let outcome = match pass {
            PassId::Hook => hook_constructor(&text, &config.lift).map(|r| PassOutcome {
                text: r.text,
                diagnostics: r.diagnostics,
            }),
            PassId::Lift => lift_switch(&text, &config.lift, config.strict_braces).map(|r| {
                lifted = Some((r.partition.cases.len(), r.partition.opcode_count()));
                PassOutcome {
                    text: r.text,
                    diagnostics: r.diagnostics,
                }
            }),
            PassId::Unwrap => {
                let r = unwrap_braces(&text);
                unwrapped += r.sites.len();
                Ok(PassOutcome {
                    text: r.text,
                    diagnostics: Vec::new(),
                })
            }
        }
        .map_err(|error| PipelineError {
            failing_pass: pass,
            error,
        })?;
        let elapsed = t.elapsed();

        let changed = outcome.text != text;
        debug!(
            pass = pass.name(),
            changed,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "pass complete"
        );
        if !changed {
            debug!(
                pass = pass.name(),
                anchor = descriptor(pass).anchor,
                "nothing to rewrite"
            );
        }
        on_pass_complete(pass, &outcome.diagnostics);
        diagnostics.extend(outcome.diagnostics);
        records.push(PassRecord {
            pass,
            elapsed,
            changed,
        });
        text = outcome.text;
    }

    let provenance = Provenance::compute(source, &text);
    Ok(PipelineOutput {
        text,
        passes: records,
        diagnostics,
        lifted,
        unwrapped,
        provenance,
    })
}

/// Run the pipeline `config` describes.
pub fn transform(source: &str, config: &TransformConfig) -> Result<PipelineOutput, PipelineError> {
    run_pipeline(source, &config.pipeline(), config, |_, _| {})
}

// ── Run report ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PassReport {
    pub name: &'static str,
    pub elapsed_ms: f64,
    pub changed: bool,
}

/// Machine-readable summary of a successful run, for `--report`.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub tool_version: &'static str,
    pub input_sha256: String,
    pub output_sha256: String,
    pub passes: Vec<PassReport>,
    pub case_blocks: Option<usize>,
    pub opcodes: Option<usize>,
    pub unwrapped: usize,
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn from_output(output: &PipelineOutput) -> Self {
        Self {
            tool_version: output.provenance.tool_version,
            input_sha256: output.provenance.input_hash_hex(),
            output_sha256: output.provenance.output_hash_hex(),
            passes: output
                .passes
                .iter()
                .map(|r| PassReport {
                    name: r.pass.name(),
                    elapsed_ms: r.elapsed.as_secs_f64() * 1000.0,
                    changed: r.changed,
                })
                .collect(),
            case_blocks: output.lifted.map(|(b, _)| b),
            opcodes: output.lifted.map(|(_, o)| o),
            unwrapped: output.unwrapped,
            warnings: output.diagnostics.iter().map(|d| d.to_string()).collect(),
        }
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Structure;

    const SRC: &str = "\
namespace core {
Interpreter::Interpreter(j2me::loader::JarLoader& loader) : jarLoader(loader) {}
bool Interpreter::executeInstruction(std::shared_ptr<JavaThread> thread, std::shared_ptr<StackFrame> frame, util::DataReader& codeReader) {
    uint8_t opcode = codeReader.readU1();
    switch (opcode) {
        case OP_POP: {
            frame->pop();
            break;
        }
    }
    return true;
}
} // namespace core
";

    #[test]
    fn default_pipeline_hooks_and_lifts() {
        let output = transform(SRC, &TransformConfig::default()).unwrap();
        let names: Vec<_> = output.passes.iter().map(|r| r.pass).collect();
        assert_eq!(names, vec![PassId::Hook, PassId::Lift]);
        assert!(output.passes.iter().all(|r| r.changed));
        assert_eq!(output.lifted, Some((1, 1)));
        assert!(output.text.contains("{ initInstructionTable(); }"));
    }

    #[test]
    fn braced_case_body_ends_in_the_unwrap_pattern() {
        // Balanced as emitted; collapsing the site would unbalance it.
        let lifted = transform(SRC, &TransformConfig::default()).unwrap().text;
        assert!(lifted.contains("            break;\n        }\n        } while(0);\n"));
        let opened = lifted.matches('{').count();
        let closed = lifted.matches('}').count();
        assert_eq!(opened, closed);

        let unwrapped = run_pipeline(&lifted, &[PassId::Unwrap], &TransformConfig::default(), |_, _| {})
            .unwrap();
        assert_eq!(unwrapped.unwrapped, 1);
        assert_ne!(unwrapped.text.matches('}').count(), opened);
    }

    #[test]
    fn second_run_fails_at_lift() {
        let config = TransformConfig::default();
        let once = transform(SRC, &config).unwrap().text;
        let err = transform(&once, &config).unwrap_err();
        assert_eq!(err.failing_pass, PassId::Lift);
        assert!(matches!(
            err.error,
            TransformError::NotFound {
                what: Structure::SwitchOpen,
                ..
            }
        ));
        assert!(err.to_string().starts_with("lift pass failed: switch block not found"));
    }

    #[test]
    fn failure_stops_before_later_passes() {
        let mut seen = Vec::new();
        let err = run_pipeline(
            "no switch here } } while(0);\n",
            &[PassId::Unwrap, PassId::Lift, PassId::Unwrap],
            &TransformConfig::default(),
            |pass, _| seen.push(pass),
        )
        .unwrap_err();
        assert_eq!(err.failing_pass, PassId::Lift);
        assert_eq!(seen, vec![PassId::Unwrap]);
    }

    #[test]
    fn unwrap_only_pipeline() {
        let output = run_pipeline(
            "} // x\n} while(0);\n",
            &[PassId::Unwrap],
            &TransformConfig::default(),
            |_, _| {},
        )
        .unwrap();
        assert_eq!(output.text, "} // x\nwhile(0);\n");
        assert_eq!(output.unwrapped, 1);
        assert_eq!(output.lifted, None);
    }

    #[test]
    fn provenance_hashes_input_and_output() {
        let output = run_pipeline("abc", &[PassId::Unwrap], &TransformConfig::default(), |_, _| {})
            .unwrap();
        assert_eq!(
            output.provenance.input_hash_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(output.provenance.input_hash, output.provenance.output_hash);
    }

    #[test]
    fn report_serializes_pass_names() {
        let output = transform(SRC, &TransformConfig::default()).unwrap();
        let json = RunReport::from_output(&output).to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["passes"][1]["name"], "lift");
        assert_eq!(value["case_blocks"], 1);
        assert_eq!(value["input_sha256"].as_str().unwrap().len(), 64);
    }
}
