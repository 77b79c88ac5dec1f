// dlift — dispatch lifter
//
// Source-to-source passes over a C++ bytecode interpreter: lift the opcode
// `switch` into a 256-entry dispatch table, hook the table-init call into the
// constructor, and collapse redundant braces before `while(0);`.

pub mod config;
pub mod diag;
pub mod emit;
pub mod error;
pub mod hook;
pub mod lexer;
pub mod lift;
pub mod pass;
pub mod persist;
pub mod pipeline;
pub mod scan;
pub mod segment;
pub mod source;
pub mod unwrap;
