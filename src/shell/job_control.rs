//! Running the statements of one line as concurrent jobs.

use std::fmt;
use std::process::ExitStatus;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::{
    core::{
        job::{Job, JobId},
        parser::CommandGroup,
    },
    execute_command,
    util::ShellExitStatusExt,
    SHELL_NAME,
};

use super::DEFAULT_POLL_INTERVAL;

/// Outcome of running one command group.
#[derive(Debug)]
pub struct GroupReport {
    jobs: Vec<Job>,
    status: ExitStatus,
}

impl GroupReport {
    /// Status of the group's last statement.
    pub fn status(&self) -> ExitStatus {
        self.status
    }

    /// Every joined job, in input order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }
}

pub struct JobManager {
    /// Detached background jobs that have not been reported yet.
    background_jobs: Vec<Job>,
    job_count: u32,
    poll_interval: Duration,
    detach_background: bool,
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, false)
    }
}

impl JobManager {
    pub fn new(poll_interval: Duration, detach_background: bool) -> Self {
        Self {
            background_jobs: Vec::new(),
            job_count: 0,
            poll_interval,
            detach_background,
        }
    }

    /// Runs `group` and returns the status of its last statement.
    pub fn execute(&mut self, group: CommandGroup) -> ExitStatus {
        self.run_group(group).status()
    }

    /// Spawns every statement of `group` in input order, then waits until all
    /// of them have terminated.
    ///
    /// A statement that fails to spawn does not stop its siblings. Detached
    /// background statements are not waited for; see `do_job_notification`.
    pub fn run_group(&mut self, group: CommandGroup) -> GroupReport {
        let CommandGroup { input, statements } = group;
        let mut jobs = Vec::with_capacity(statements.len());
        let mut last_detached = false;

        for statement in statements {
            let job_id = self.get_next_job_id();
            let job_input = statement.to_string();
            let background = statement.background;
            let process = execute_command::spawn(statement.tokens);
            let job = Job::new(job_id, job_input, background, process);

            last_detached = self.detach_background && background && job.is_outstanding();
            if last_detached {
                println!("[{}] {}", job.id(), job.pid());
                self.background_jobs.push(job);
            } else {
                jobs.push(job);
            }
        }

        self.join(&mut jobs);
        let status = if last_detached {
            ExitStatus::from_success()
        } else {
            last_status(&jobs)
        };

        debug!(
            "group '{}' finished with status {}",
            input,
            status.status_code()
        );
        GroupReport { jobs, status }
    }

    /// Waits until none of `jobs` is outstanding. A job whose status cannot
    /// be collected is reported and no longer waited for.
    fn join(&self, jobs: &mut [Job]) {
        if jobs.len() == 1 {
            wait_for_job(&mut jobs[0]);
        } else {
            self.wait_for_jobs(jobs);
        }
    }

    /// Polls every outstanding job without blocking, pausing between passes,
    /// until none are left.
    fn wait_for_jobs(&self, jobs: &mut [Job]) {
        loop {
            let mut outstanding = 0;
            for job in jobs.iter_mut().filter(|job| job.is_outstanding()) {
                match job.process_mut().try_wait() {
                    Ok(Some(_)) => debug!("job [{}] completed", job.id()),
                    Ok(None) => outstanding += 1,
                    Err(e) => report_wait_error(job, &e),
                }
            }

            if outstanding == 0 {
                break;
            }
            thread::sleep(self.poll_interval);
        }
    }

    pub fn has_background_jobs(&self) -> bool {
        !self.background_jobs.is_empty()
    }

    pub fn background_jobs(&self) -> &[Job] {
        &self.background_jobs
    }

    /// Reports detached background jobs that have terminated since the last
    /// call and forgets them. Never blocks.
    pub fn do_job_notification(&mut self) {
        for job in self.background_jobs.iter_mut() {
            match job.process_mut().try_wait() {
                Ok(Some(status)) => {
                    info!("background job [{}] completed", job.id());
                    println!(
                        "{} (pid {}, status {})",
                        job,
                        job.pid(),
                        status.status_code()
                    );
                }
                Ok(None) => {}
                Err(e) => report_wait_error(job, &e),
            }
        }

        self.background_jobs.retain(Job::is_outstanding);
    }

    fn get_next_job_id(&mut self) -> JobId {
        self.job_count += 1;
        JobId(self.job_count)
    }
}

/// Status of the last job; failure if it never produced one.
fn last_status(jobs: &[Job]) -> ExitStatus {
    jobs.last()
        .map(|job| job.status_code().unwrap_or_else(ExitStatus::from_failure))
        .unwrap_or_else(ExitStatus::from_success)
}

fn wait_for_job(job: &mut Job) {
    if let Err(e) = job.process_mut().wait() {
        report_wait_error(job, &e);
    }
}

fn report_wait_error<E: fmt::Display>(job: &Job, e: &E) {
    warn!("dropping job [{}] from polling: {}", job.id(), e);
    eprintln!("{}: {}: {}", SHELL_NAME, job.input(), e);
}

impl fmt::Debug for JobManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} background jobs\tjob_count: {}",
            self.background_jobs.len(),
            self.job_count
        )?;
        for job in &self.background_jobs {
            write!(f, "{:?}", job)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use nix::{sys::wait, unistd::Pid};

    use super::*;
    use crate::{core::parser, execute_command::ProcessStatus};

    fn run(line: &str) -> GroupReport {
        let (group, _) = parser::split(line);
        JobManager::default().run_group(group)
    }

    #[test]
    fn test_status_of_last_statement() {
        assert_eq!(run("sh -c exit\t4; false").status().status_code(), 1);
        assert_eq!(run("false ; sleep 0.1 ; true").status().status_code(), 0);
        assert_eq!(run("true ; sh -c exit\t5").status().status_code(), 5);
    }

    #[test]
    fn test_status_is_last_position_not_last_to_finish() {
        let report = run("sleep 0.3 ; sh -c exit");
        assert!(report.status().success());

        let report = run("sh -c sleep\t0.3&&exit\t6 ; true");
        assert!(report.status().success());
        assert_eq!(report.jobs()[0].status_code().unwrap().status_code(), 6);
    }

    #[test]
    fn test_all_jobs_reaped_before_returning() {
        let report = run("sleep 0.2 ; true ; sleep 0.1 ; false");
        assert_eq!(report.jobs().len(), 4);
        for job in report.jobs() {
            assert_eq!(job.status(), ProcessStatus::Completed);
            assert!(job.status_code().is_some());
        }
    }

    #[test]
    fn test_statements_run_concurrently() {
        let start = Instant::now();
        let report = run("sleep 0.5 ; sleep 0.5 ; sleep 0.5");
        assert!(report.status().success());
        assert!(start.elapsed() < Duration::from_millis(1400));
    }

    #[test]
    fn test_missing_program_does_not_block_siblings() {
        let report = run("true ; myshell-test-no-such-program ; sleep 0.1");
        assert!(report.status().success());

        let statuses: Vec<_> = report
            .jobs()
            .iter()
            .map(|job| job.status_code().unwrap().status_code())
            .collect();
        assert_eq!(
            statuses,
            vec![0, execute_command::COMMAND_NOT_FOUND_EXIT_STATUS, 0]
        );
    }

    #[test]
    fn test_failed_spawn_is_skipped() {
        let report = run("sleep 0.1 ; echo a\0b");
        assert_eq!(report.jobs()[1].status(), ProcessStatus::Failed);
        assert_eq!(report.jobs()[0].status(), ProcessStatus::Completed);
        assert!(!report.status().success());
    }

    fn spawn_jobs(inputs: &[&str]) -> Vec<Job> {
        inputs
            .iter()
            .zip(1..)
            .map(|(input, id)| {
                let process = execute_command::spawn(parser::tokenize(input));
                Job::new(JobId(id), input.to_string(), false, process)
            })
            .collect()
    }

    #[test]
    fn test_unwaitable_job_is_dropped_from_polling() {
        let job_manager = JobManager::default();
        let mut jobs = spawn_jobs(&["sleep 0.1", "true"]);
        wait::waitpid(Pid::from(jobs[1].pid()), None).unwrap();

        let start = Instant::now();
        job_manager.join(&mut jobs);
        assert!(start.elapsed() < Duration::from_secs(5));

        assert_eq!(jobs[0].status(), ProcessStatus::Completed);
        assert_eq!(jobs[1].status(), ProcessStatus::Failed);
        assert!(jobs.iter().all(|job| !job.is_outstanding()));
        assert_eq!(last_status(&jobs).status_code(), 1);
    }

    #[test]
    fn test_unwaitable_single_job() {
        let job_manager = JobManager::default();
        let mut jobs = spawn_jobs(&["true"]);
        wait::waitpid(Pid::from(jobs[0].pid()), None).unwrap();

        job_manager.join(&mut jobs);
        assert_eq!(jobs[0].status(), ProcessStatus::Failed);
        assert_eq!(last_status(&jobs).status_code(), 1);
    }

    #[test]
    fn test_background_statements_are_joined_by_default() {
        let report = run("sleep 0.1 & ; true");
        assert_eq!(report.jobs().len(), 2);
        assert!(report.jobs()[0].background());
        assert_eq!(report.jobs()[0].status(), ProcessStatus::Completed);
    }

    #[test]
    fn test_empty_group_succeeds() {
        assert!(run("").status().success());
        assert!(run("").jobs().is_empty());
    }

    #[test]
    fn test_job_ids_increase_across_groups() {
        let mut job_manager = JobManager::default();
        let (group, _) = parser::split("true ; true");
        let first = job_manager.run_group(group);
        let (group, _) = parser::split("true");
        let second = job_manager.run_group(group);

        assert_eq!(first.jobs()[1].id(), JobId(2));
        assert_eq!(second.jobs()[0].id(), JobId(3));
    }

    #[test]
    fn test_detached_background_job_is_reported_later() {
        let mut job_manager = JobManager::new(Duration::from_millis(5), true);
        let (group, _) = parser::split("sleep 0.2 & ; sh -c exit\t2 &");
        let start = Instant::now();
        let report = job_manager.run_group(group);

        assert!(report.jobs().is_empty());
        assert!(report.status().success());
        assert!(start.elapsed() < Duration::from_millis(200));
        assert_eq!(job_manager.background_jobs().len(), 2);

        let deadline = Instant::now() + Duration::from_secs(5);
        while job_manager.has_background_jobs() && Instant::now() < deadline {
            job_manager.do_job_notification();
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!job_manager.has_background_jobs());
    }

    #[test]
    fn test_detached_mode_still_joins_foreground_statements() {
        let mut job_manager = JobManager::new(Duration::from_millis(5), true);
        let (group, _) = parser::split("sleep 0.1 & ; sh -c exit\t3");
        let report = job_manager.run_group(group);

        assert_eq!(report.jobs().len(), 1);
        assert_eq!(report.status().status_code(), 3);

        let deadline = Instant::now() + Duration::from_secs(5);
        while job_manager.has_background_jobs() && Instant::now() < deadline {
            job_manager.do_job_notification();
            thread::sleep(Duration::from_millis(10));
        }
    }
}
