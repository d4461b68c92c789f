//! Spawning and reaping external processes.

use std::ffi::CString;
use std::fmt;
use std::process::ExitStatus;
use std::ptr;

use failure::Fail;
use log::{debug, error, warn};
use nix::{
    errno::Errno,
    sys::wait::{self, WaitPidFlag, WaitStatus},
    unistd::{self, ForkResult, Pid},
};

use crate::{
    core::parser::TokenList,
    errors::{Error, ErrorKind, Result},
    util::{self, ShellExitStatusExt},
    SHELL_NAME,
};

/// Exit status of a child whose program could not be found.
pub const COMMAND_NOT_FOUND_EXIT_STATUS: i32 = 127;
/// Exit status of a child whose program was found but could not be executed.
pub const COMMAND_NOT_EXECUTABLE_EXIT_STATUS: i32 = 126;

/// OS process identifier. Values `<= 0` mark a process that was never
/// spawned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProcessId(i32);

impl ProcessId {
    const NOT_SPAWNED: ProcessId = ProcessId(-1);

    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl From<Pid> for ProcessId {
    fn from(value: Pid) -> Self {
        ProcessId(value.as_raw())
    }
}

impl From<ProcessId> for Pid {
    fn from(value: ProcessId) -> Self {
        Pid::from_raw(value.0)
    }
}

impl From<ProcessId> for i32 {
    fn from(value: ProcessId) -> Self {
        value.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessStatus {
    Running,
    /// Reaped; its status code is known.
    Completed,
    /// Never spawned, or its status could not be collected.
    Failed,
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ProcessStatus::Running => write!(f, "Running"),
            ProcessStatus::Completed => write!(f, "Done"),
            ProcessStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Handle to one spawned command.
#[derive(Debug)]
pub struct Process {
    argv: TokenList,
    id: ProcessId,
    status: ProcessStatus,
    status_code: Option<ExitStatus>,
}

impl Process {
    fn new(argv: TokenList, id: ProcessId) -> Self {
        Self {
            argv,
            id,
            status: ProcessStatus::Running,
            status_code: None,
        }
    }

    fn not_spawned(argv: TokenList) -> Self {
        Self {
            argv,
            id: ProcessId::NOT_SPAWNED,
            status: ProcessStatus::Failed,
            status_code: None,
        }
    }

    pub fn argv(&self) -> &TokenList {
        &self.argv
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    /// Status collected when the process was reaped.
    pub fn status_code(&self) -> Option<ExitStatus> {
        self.status_code
    }

    /// Is the process still owed a wait?
    pub fn is_outstanding(&self) -> bool {
        self.status == ProcessStatus::Running
    }

    /// Waits for the process to terminate.
    ///
    /// Returns the status only on the call that reaps the process. Once the
    /// process is reaped, or if it never spawned, returns `Ok(None)` without
    /// touching the OS; use `status_code` to read the recorded status.
    /// A failed status check marks the process `Failed` so that it is not
    /// polled again.
    pub fn wait_one(&mut self, blocking: bool) -> Result<Option<ExitStatus>> {
        if !self.is_outstanding() {
            return Ok(None);
        }

        let flags = if blocking {
            None
        } else {
            Some(WaitPidFlag::WNOHANG)
        };

        let wait_status = loop {
            match wait::waitpid(Pid::from(self.id), flags) {
                Err(Errno::EINTR) => continue,
                result => break result,
            }
        };

        let wait_status = match wait_status {
            Ok(wait_status) => wait_status,
            Err(e) => {
                self.status = ProcessStatus::Failed;
                return Err(e
                    .context(ErrorKind::Wait(i32::from(self.id)))
                    .into());
            }
        };

        let status_code = match wait_status {
            WaitStatus::Exited(_, code) => ExitStatus::from_status(code),
            WaitStatus::Signaled(_, signal, _) => util::status_for_signal(signal as i32),
            // stopped, continued and traced processes have not terminated
            _ => return Ok(None),
        };

        debug!(
            "reaped process {} ({}) with status {}",
            self.id,
            self.argv,
            status_code.status_code()
        );
        self.status = ProcessStatus::Completed;
        self.status_code = Some(status_code);
        Ok(Some(status_code))
    }

    /// Non-blocking `wait_one`.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        self.wait_one(false)
    }

    /// Blocking `wait_one`.
    pub fn wait(&mut self) -> Result<Option<ExitStatus>> {
        self.wait_one(true)
    }
}

/// Forks and executes `argv` in the child. Never blocks.
///
/// A failure to fork is reported and yields a process that is not spawned. A
/// failure to exec is reported by the child, which then exits with
/// `COMMAND_NOT_FOUND_EXIT_STATUS` or `COMMAND_NOT_EXECUTABLE_EXIT_STATUS`.
pub fn spawn(argv: TokenList) -> Process {
    match try_spawn(&argv) {
        Ok(pid) => {
            debug!("spawned process {} for: {}", pid, argv);
            Process::new(argv, pid)
        }
        Err(e) => {
            error!("failed to spawn '{}': {}", argv, e);
            eprintln!("{}: {}", SHELL_NAME, e);
            Process::not_spawned(argv)
        }
    }
}

fn try_spawn(argv: &TokenList) -> Result<ProcessId> {
    let program = argv
        .program()
        .ok_or_else(|| Error::invalid_argument(""))?;
    let c_argv = argv.to_c_argv()?;
    // Everything the child touches is allocated before forking.
    let argv_ptrs = exec_argv(&c_argv);
    let message_prefix = format!("{}: {}: ", SHELL_NAME, program);

    util::unix::flush_stdio();
    // Safe as long as the child only calls execvp, write and _exit.
    match unsafe { unistd::fork() } {
        Ok(ForkResult::Child) => exec_or_exit(&argv_ptrs, message_prefix.as_bytes()),
        Ok(ForkResult::Parent { child }) => Ok(child.into()),
        Err(e) => {
            warn!("fork failed: {}", e);
            Err(e.context(ErrorKind::Spawn(program.to_string())).into())
        }
    }
}

/// NULL-terminated pointer array over `c_argv`, as `execvp(3)` expects.
///
/// The pointers borrow from `c_argv`, which must outlive the returned vector.
fn exec_argv(c_argv: &[CString]) -> Vec<*const libc::c_char> {
    c_argv
        .iter()
        .map(|arg| arg.as_ptr())
        .chain(Some(ptr::null()))
        .collect()
}

fn exec_or_exit(exec_argv: &[*const libc::c_char], message_prefix: &[u8]) -> ! {
    // execvp only returns on failure.
    unsafe { libc::execvp(exec_argv[0], exec_argv.as_ptr()) };
    let errno = Errno::last();

    let code = if errno == Errno::ENOENT {
        util::unix::write_to_stderr(&[message_prefix, &b"command not found\n"[..]]);
        COMMAND_NOT_FOUND_EXIT_STATUS
    } else {
        util::unix::write_to_stderr(&[message_prefix, errno.desc().as_bytes(), &b"\n"[..]]);
        COMMAND_NOT_EXECUTABLE_EXIT_STATUS
    };
    unsafe { libc::_exit(code) }
}
