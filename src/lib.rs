//! myshell - runs the `;`-separated statements of a line as concurrent
//! processes.

#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces
)]

#[macro_use]
mod util;
pub mod core;
mod editor;
pub mod errors;
pub mod execute_command;
pub mod shell;

pub use crate::shell::{GroupReport, JobManager, Shell, ShellConfig};
pub use crate::util::ShellExitStatusExt;

/// Prefix for every message the shell writes to stderr.
pub const SHELL_NAME: &str = "myshell";
