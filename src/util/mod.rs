use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

/// Logs the error of a `Result` along with a message, discarding the result.
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {{
        if let Err(ref e) = $result {
            ::log::error!(concat!($fmt, ": {}"), e);
        }
    }};
    ($result:expr, $fmt:expr, $($arg:tt)*) => {{
        if let Err(ref e) = $result {
            ::log::error!(concat!($fmt, ": {}"), $($arg)*, e);
        }
    }};
}

pub mod unix;

/// Shell Utility Extensions for `ExitStatus`
pub trait ShellExitStatusExt {
    /// Create an ExitStatus to indicate *successful* program execution.
    fn from_success() -> Self;

    /// Create an ExitStatus to indicate *unsuccessful* program execution.
    fn from_failure() -> Self;

    /// Create an ExitStatus from a status code
    fn from_status(code: i32) -> Self;

    /// Status code as reported to the user: the exit code, or 128 plus the
    /// signal number for a process that was killed.
    fn status_code(&self) -> i32;
}

impl ShellExitStatusExt for ExitStatus {
    /// # Examples
    /// ```rust
    /// use myshell::ShellExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(ExitStatus::from_success().success());
    /// ```
    fn from_success() -> Self {
        ExitStatus::from_status(0)
    }

    /// # Examples
    /// ```rust
    /// use myshell::ShellExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(!ExitStatus::from_failure().success());
    /// ```
    fn from_failure() -> Self {
        ExitStatus::from_status(1)
    }

    /// # Examples
    /// ```rust
    /// use myshell::ShellExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(ExitStatus::from_status(0).success());
    /// assert!(!ExitStatus::from_status(1).success());
    /// ```
    fn from_status(code: i32) -> Self {
        ExitStatus::from_raw((code & 0xff) << 8)
    }

    fn status_code(&self) -> i32 {
        match (self.code(), self.signal()) {
            (Some(code), _) => code,
            (None, Some(signal)) => 128 + signal,
            (None, None) => 1,
        }
    }
}

/// Status for a process killed by `signal`.
pub fn status_for_signal(signal: i32) -> ExitStatus {
    ExitStatus::from_status(128 + signal)
}
