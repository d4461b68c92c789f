use std::{fmt, process::ExitStatus};

use crate::execute_command::{Process, ProcessId, ProcessStatus};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct JobId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Runtime record of one statement and the process running it.
pub struct Job {
    id: JobId,
    input: String,
    background: bool,
    process: Process,
}

impl Job {
    pub fn new(id: JobId, input: String, background: bool, process: Process) -> Self {
        Self {
            id,
            input,
            background,
            process,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn background(&self) -> bool {
        self.background
    }

    pub fn pid(&self) -> ProcessId {
        self.process.id()
    }

    pub fn status(&self) -> ProcessStatus {
        self.process.status()
    }

    /// `None` until the process is reaped, and forever for a process that
    /// never spawned.
    pub fn status_code(&self) -> Option<ExitStatus> {
        self.process.status_code()
    }

    pub fn is_outstanding(&self) -> bool {
        self.process.is_outstanding()
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    pub fn process_mut(&mut self) -> &mut Process {
        &mut self.process
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}\t{}", self.id, self.status(), self.input)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id: {}\tpid: {}\tinput: {}",
            self.id,
            self.pid(),
            self.input
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::{self, TokenList};
    use crate::execute_command;

    #[test]
    fn test_job_lifecycle() {
        let process = execute_command::spawn(TokenList::from(vec!["true"]));
        let mut job = Job::new(JobId(1), "true".to_string(), false, process);

        assert!(job.is_outstanding());
        assert_eq!(job.status_code(), None);
        assert_eq!(job.to_string(), "[1] Running\ttrue");

        job.process_mut().wait().unwrap();
        assert!(!job.is_outstanding());
        assert!(job.status_code().unwrap().success());
        assert_eq!(job.to_string(), "[1] Done\ttrue");
    }

    #[test]
    fn test_failed_spawn_job() {
        let (group, _) = parser::split("echo a\0b &");
        let statement = group.statements.into_iter().next().unwrap();
        let input = statement.to_string();
        let process = execute_command::spawn(statement.tokens);
        let job = Job::new(JobId(7), input, statement.background, process);

        assert!(job.background());
        assert!(!job.pid().is_valid());
        assert!(!job.is_outstanding());
        assert_eq!(job.status_code(), None);
        assert_eq!(job.to_string(), "[7] Failed\techo a\0b &");
    }
}
