// pass.rs — Pass descriptor module: names, metadata, pass-list parsing
//
// Declares the three rewrite passes and the static metadata the pipeline
// runner reports about them. Passes have no data dependencies on each other:
// each one takes a buffer and returns a new one, so any order the operator
// asks for is executable. The default order lives in `TransformConfig::pipeline`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RunError;

// ── Pass identifiers ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassId {
    /// Wire the table-init call into the constructor's empty body.
    Hook,
    /// Lift the opcode switch into a dispatch table.
    Lift,
    /// Collapse `} <comments> } while(0);` artifacts.
    Unwrap,
}

impl PassId {
    pub fn name(self) -> &'static str {
        descriptor(self).name
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PassId {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_PASSES
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| RunError::UnknownPass(s.to_string()))
    }
}

// ── Pass descriptor ────────────────────────────────────────────────────────

/// Static metadata about a rewrite pass.
pub struct PassDescriptor {
    /// Name used on the command line, in configs and in logs.
    pub name: &'static str,
    /// What the pass looks for; logged when the pass leaves the buffer as is.
    pub anchor: &'static str,
}

pub fn descriptor(id: PassId) -> PassDescriptor {
    match id {
        PassId::Hook => PassDescriptor {
            name: "hook",
            anchor: "empty constructor body `{}`",
        },
        PassId::Lift => PassDescriptor {
            name: "lift",
            anchor: "switch-open marker",
        },
        PassId::Unwrap => PassDescriptor {
            name: "unwrap",
            anchor: "`} <comments> } while(0);`",
        },
    }
}

pub const ALL_PASSES: [PassId; 3] = [PassId::Hook, PassId::Lift, PassId::Unwrap];

/// Parse a list of pass names in the order given.
pub fn parse_pass_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<PassId>, RunError> {
    names.iter().map(|n| n.as_ref().parse()).collect()
}

// ── Tests ──────────────────────────────────────────────────────────────────
