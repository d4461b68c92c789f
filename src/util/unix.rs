use std::io::{self, Write};

use nix::unistd;

/// Writes each of `parts` to stderr with raw `write(2)` calls.
///
/// Safe to use in a freshly forked child: nothing is allocated or locked.
pub fn write_to_stderr(parts: &[&[u8]]) {
    for part in parts {
        let _ = unistd::write(libc::STDERR_FILENO, part);
    }
}

/// Flushes buffered stdio so that a forked child does not inherit unwritten
/// output.
pub fn flush_stdio() {
    let temp_result = io::stdout().flush();
    log_if_err!(temp_result, "failed to flush stdout");
}
