//! The Shell reads lines from a terminal, a batch file or a command string
//! and hands each one to its `JobManager`.

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{self, ExitStatus};

use failure::ResultExt;
use log::{debug, error, info, warn};

use super::{JobManager, ShellConfig, PROMPT};
use crate::{
    core::parser,
    editor::Editor,
    errors::{Error, ErrorKind, Result},
    util::ShellExitStatusExt,
    SHELL_NAME,
};

pub struct Shell {
    /// Responsible for readline and history; only created for the
    /// interactive loop.
    editor: Option<Editor>,
    job_manager: JobManager,
    /// Exit status of last command group executed.
    last_exit_status: ExitStatus,
    config: ShellConfig,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Self {
        info!("myshell started up");
        Self {
            editor: None,
            job_manager: JobManager::new(config.poll_interval, config.detach_background),
            last_exit_status: ExitStatus::from_success(),
            config,
        }
    }

    pub fn last_exit_status(&self) -> ExitStatus {
        self.last_exit_status
    }

    /// Runs every statement of `line` and waits for them.
    ///
    /// Returns the status of the last statement (0 for a line with nothing to
    /// run) and whether the line asked to end the session.
    pub fn process_line(&mut self, line: &str) -> (i32, bool) {
        let (group, terminate) = parser::split(line);
        if group.is_empty() {
            return (0, terminate);
        }

        let status = self.job_manager.execute(group);
        self.last_exit_status = status;
        (status.status_code(), terminate)
    }

    /// Runs a single command string, returning the exit code for the whole
    /// run: 0 if the line ended the session, else the status of its last
    /// statement.
    pub fn execute_command_string(&mut self, input: &str) -> i32 {
        let (status, terminate) = self.process_line(input);
        if terminate {
            0
        } else {
            status
        }
    }

    /// Runs each line of the file at `path`, echoing it first, until end of
    /// file or a line that ends the session.
    ///
    /// Only failing to open the file is an error. Bytes that are not valid
    /// UTF-8 are replaced, and a read error ends the run like end of file.
    pub fn execute_commands_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path).context(ErrorKind::BatchFile(path.display().to_string()))?;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    error!("failed to read {}: {}", path.display(), e);
                    eprintln!("{}: {}: {}", SHELL_NAME, path.display(), e);
                    break;
                }
            }

            let line = String::from_utf8_lossy(&buf);
            if let Cow::Owned(_) = line {
                warn!("replaced invalid UTF-8 in batch line: {:?}", line);
            }
            let line = line.trim_end_matches(&['\n', '\r'][..]);
            println!("{}", line);

            let (status, terminate) = self.process_line(&line);
            debug!("batch line finished with status {}", status);
            self.notify_background_jobs();
            if terminate {
                break;
            }
        }

        Ok(())
    }

    /// Runs lines from stdin until EOF or a line that ends the session.
    pub fn execute_from_stdin(&mut self) {
        let mut editor = self
            .editor
            .take()
            .unwrap_or_else(|| Editor::with_capacity(self.config.command_history_capacity));

        loop {
            self.notify_background_jobs();

            let input = match editor.readline(PROMPT) {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("prompt: {}", e);
                    eprintln!("{}: {}", SHELL_NAME, e);
                    if ends_session(&e) {
                        break;
                    }
                    continue;
                }
            };

            if self.config.enable_command_history && !input.trim().is_empty() {
                editor.add_history_entry(input.trim());
            }

            let (_, terminate) = self.process_line(&input);
            if terminate {
                break;
            }
        }

        self.editor = Some(editor);
    }

    fn notify_background_jobs(&mut self) {
        if self.config.detach_background {
            self.job_manager.do_job_notification();
        }
    }

    /// Exit the shell with `code`.
    ///
    /// Like bash and its descendents, the operating system only sees the low
    /// eight bits, so -1 becomes 255.
    pub fn exit(&mut self, code: i32) -> ! {
        if self.config.display_messages {
            println!("exit");
        }

        if self.job_manager.has_background_jobs() {
            debug!(
                "leaving {} background job(s) running",
                self.job_manager.background_jobs().len()
            );
        }

        info!("myshell has shut down with status {}", code);
        process::exit(code);
    }
}

/// A prompt error the terminal will keep returning.
fn ends_session(e: &Error) -> bool {
    *e.kind() == ErrorKind::Io
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} jobs\n{:?}", self.job_manager, self.editor)
    }
}
