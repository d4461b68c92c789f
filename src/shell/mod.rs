use std::time::Duration;

pub use self::job_control::{GroupReport, JobManager};
pub use self::shell::Shell;

pub mod job_control;
#[allow(clippy::module_inception)]
mod shell;

const PROMPT: &str = "myshell> ";
/// Pause between two polling passes over the running jobs of a group.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Determines if new command entries will be added to the shell's command history.
    ///
    /// Note: This is checked before the other command history config fields.
    enable_command_history: bool,

    /// Number of entries to store in the shell's command history
    command_history_capacity: usize,

    /// Determines if statements ending in `&` are left running when the line
    /// returns, with their completion reported before a later prompt.
    detach_background: bool,

    /// Pause between polling passes while waiting for a group.
    poll_interval: Duration,

    /// Determines if some messages (e.g. "exit") should be displayed.
    display_messages: bool,
}

impl ShellConfig {
    /// Creates an interactive shell
    ///
    /// # Complete List
    /// - Command History is enabled
    /// - Some additional messages are displayed
    pub fn interactive(command_history_capacity: usize) -> Self {
        Self {
            enable_command_history: true,
            command_history_capacity,
            display_messages: true,
            ..Default::default()
        }
    }

    /// Creates a noninteractive shell, e.g. for batch files and command
    /// strings
    ///
    /// # Complete List
    /// - Command History is disabled.
    /// - Fewer messages are displayed
    pub fn noninteractive() -> Self {
        Default::default()
    }

    /// Leave statements ending in `&` running instead of joining them with
    /// the rest of their line.
    pub fn detach_background(self, detach_background: bool) -> Self {
        Self {
            detach_background,
            ..self
        }
    }

    pub fn poll_interval(self, poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..self
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            enable_command_history: false,
            command_history_capacity: 0,
            detach_background: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            display_messages: false,
        }
    }
}
