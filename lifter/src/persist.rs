// persist.rs — Read, transform and write one source file
//
// The file is read once and hashed. After the pipeline succeeds, an in-place
// write first re-reads the file and compares hashes; if anything changed on
// disk in between, nothing is written. Writes go to a temporary file in the
// destination directory that is then renamed over the target, so a reader
// sees either the old contents or the new ones.
//
// Preconditions: `source` names a readable UTF-8 file.
// Postconditions: on any error the destination is unchanged.
// Failure modes: I/O, pipeline failure, concurrent modification.
// Side effects: writes the destination (and the report, when requested).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::TransformConfig;
use crate::diag::Diagnostic;
use crate::error::RunError;
use crate::pass::PassId;
use crate::pipeline::{run_pipeline, sha256, PipelineOutput, RunReport};

/// Where the transformed text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Overwrite the source file.
    InPlace,
    /// Write to another path; the source stays as it is.
    File(PathBuf),
    /// Leave writing to the caller (stdout or check-only runs).
    Caller,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source: PathBuf,
    pub destination: Destination,
    pub config: TransformConfig,
    /// Write a JSON run report here after a successful run.
    pub report: Option<PathBuf>,
}

impl RunOptions {
    pub fn in_place(source: impl Into<PathBuf>, config: TransformConfig) -> Self {
        Self {
            source: source.into(),
            destination: Destination::InPlace,
            config,
            report: None,
        }
    }
}

/// Transform `options.source` and deliver the result.
pub fn run_file(
    options: &RunOptions,
    on_pass_complete: impl FnMut(PassId, &[Diagnostic]),
) -> Result<PipelineOutput, RunError> {
    let path = options.source.as_path();
    let input = fs::read_to_string(path).map_err(|e| RunError::io(path, e))?;
    debug!(path = %path.display(), bytes = input.len(), "source read");

    let passes = options.config.pipeline();
    let output = run_pipeline(&input, &passes, &options.config, on_pass_complete)?;

    match &options.destination {
        Destination::InPlace => {
            ensure_unchanged(path, &output.provenance.input_hash)?;
            write_atomic(path, &output.text)?;
            info!(path = %path.display(), "source rewritten");
        }
        Destination::File(target) => {
            write_atomic(target, &output.text)?;
            info!(path = %target.display(), "output written");
        }
        Destination::Caller => {}
    }

    if let Some(report) = &options.report {
        let json = RunReport::from_output(&output).to_json();
        fs::write(report, json + "\n").map_err(|e| RunError::io(report, e))?;
    }

    Ok(output)
}

fn ensure_unchanged(path: &Path, expected: &[u8; 32]) -> Result<(), RunError> {
    let bytes = fs::read(path).map_err(|e| RunError::io(path, e))?;
    if sha256(&bytes) != *expected {
        return Err(RunError::ConcurrentModification {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Replace `path` with `text` via a sibling temporary file.
pub fn write_atomic(path: &Path, text: &str) -> Result<(), RunError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| RunError::io(dir, e))?;
    tmp.write_all(text.as_bytes())
        .map_err(|e| RunError::io(tmp.path(), e))?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| RunError::io(tmp.path(), e))?;
    }
    tmp.persist(path).map_err(|e| RunError::io(path, e.error))?;
    Ok(())
}
