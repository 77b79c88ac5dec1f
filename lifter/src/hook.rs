// hook.rs — Wire the table-init call into the constructor
//
// The lifted table has to be filled before the first instruction runs. This
// pass finds the first line holding the configured constructor signature and
// replaces its empty body `{}` with `{ <init>(); }`. A constructor whose body
// is not `{}` on that line is left untouched and reported as a warning, which
// also makes a second run over already-hooked source a no-op.
//
// Preconditions: `config.constructor` is set.
// Postconditions: at most one `{}` changed, on the signature line only.
// Failure modes: signature absent (`NotFound`).
// Side effects: none.

use tracing::debug;

use crate::config::LiftConfig;
use crate::diag::{codes, Diagnostic, LineSpan};
use crate::error::{Structure, TransformError};
use crate::source::SourceBuffer;

#[derive(Debug, Clone)]
pub struct HookResult {
    pub text: String,
    /// 0-based line of the hooked constructor, if its body was rewritten.
    pub hooked: Option<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn hook_constructor(source: &str, config: &LiftConfig) -> Result<HookResult, TransformError> {
    let Some(signature) = config.constructor.as_deref() else {
        return Ok(HookResult {
            text: source.to_string(),
            hooked: None,
            diagnostics: Vec::new(),
        });
    };

    let buf = SourceBuffer::new(source);
    let idx = buf.find_first(signature).ok_or_else(|| TransformError::NotFound {
        what: Structure::Constructor,
        marker: signature.to_string(),
    })?;
    let line = buf.lines()[idx];

    // Only look for `{}` after the signature itself.
    let sig_end = line.find(signature).map_or(0, |at| at + signature.len());
    let Some(brace_at) = line[sig_end..].find("{}").map(|at| sig_end + at) else {
        let call = format!("{}();", config.init_fn_name());
        let message = if line.contains(&call) {
            format!("constructor already calls {call}")
        } else {
            "constructor body is not `{}`; table-init call not inserted".to_string()
        };
        return Ok(HookResult {
            text: source.to_string(),
            hooked: None,
            diagnostics: vec![Diagnostic::warning(codes::W0301, message)
                .with_span(LineSpan::line(idx))],
        });
    };

    let mut rewritten = String::with_capacity(line.len() + 32);
    rewritten.push_str(&line[..brace_at]);
    rewritten.push_str(&format!("{{ {}(); }}", config.init_fn_name()));
    rewritten.push_str(&line[brace_at + 2..]);

    let mut text = String::with_capacity(source.len() + 32);
    text.push_str(&buf.slice_text(0..idx));
    text.push_str(&rewritten);
    text.push_str(&buf.slice_text(idx + 1..buf.len()));

    debug!(line = idx + 1, "constructor hooked");
    Ok(HookResult {
        text,
        hooked: Some(idx),
        diagnostics: Vec::new(),
    })
}
