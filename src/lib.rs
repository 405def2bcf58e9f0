#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

//! toolward — a tool-call guard for autonomous agents.
//!
//! Given a proposed action (read a file, enumerate files by pattern, run a
//! shell command), the guard combines path exclusion, enumeration-breadth
//! heuristics, and command safety classification into one allow/block
//! verdict with machine-readable diagnostics. The guard only produces a
//! verdict; a cooperating caller is trusted to honor it.

pub mod cli;
pub mod config;
pub mod error;
pub mod guard;
pub mod hook;

pub use config::GuardConfig;
pub use error::{GuardError, Result};
pub use guard::{Guard, GuardDecision, ToolAction};
pub use hook::{HookInput, decide_input, run_hook};
