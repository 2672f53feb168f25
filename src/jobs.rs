//! Bookkeeping for background jobs.

use crate::status::ExitReport;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use std::io::Write;

/// Number of slots a fresh registry starts with.
pub const INITIAL_JOB_CAPACITY: usize = 10;

/// One slot of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSlot {
    Running(Pid),
    /// Sentinel left behind once the job has been reaped.
    Vacant,
}

/// Append-only list of background process ids.
///
/// Reaped jobs leave a [`JobSlot::Vacant`] behind and the slot is never handed out again, so
/// the registry only grows. Growth doubles the capacity exactly when an append finds every
/// slot used.
#[derive(Debug)]
pub struct JobRegistry {
    slots: Vec<JobSlot>,
    capacity: usize,
    running: usize,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_capacity(INITIAL_JOB_CAPACITY)
    }
}

impl JobRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            running: 0,
        }
    }

    /// Record a newly launched background process.
    pub fn append(&mut self, pid: Pid) {
        if self.slots.len() == self.capacity {
            self.capacity *= 2;
            self.slots.reserve_exact(self.capacity - self.slots.len());
            tracing::debug!(capacity = self.capacity, "job registry grown");
        }
        self.slots.push(JobSlot::Running(pid));
        self.running += 1;
    }

    /// Mark the slot holding `pid` as vacant. Returns `false` if `pid` is not tracked.
    pub fn reap(&mut self, pid: Pid) -> bool {
        match self
            .slots
            .iter_mut()
            .find(|slot| **slot == JobSlot::Running(pid))
        {
            Some(slot) => {
                *slot = JobSlot::Vacant;
                self.running -= 1;
                true
            }
            None => false,
        }
    }

    /// Every process id that has not been reaped yet, in launch order.
    pub fn all_identifiers(&self) -> impl Iterator<Item = Pid> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            JobSlot::Running(pid) => Some(*pid),
            JobSlot::Vacant => None,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of jobs that have not been reaped.
    pub fn running(&self) -> usize {
        self.running
    }

    /// Send SIGTERM to every job still tracked.
    pub fn terminate_all(&self) {
        tracing::debug!(
            running = self.running(),
            capacity = self.capacity(),
            "terminating background jobs"
        );
        for pid in self.all_identifiers() {
            match kill(pid, Signal::SIGTERM) {
                Ok(()) => tracing::debug!(%pid, "sent SIGTERM to background job"),
                Err(Errno::ESRCH) => tracing::debug!(%pid, "background job already gone"),
                Err(e) => tracing::warn!(%pid, error = %e, "failed to terminate background job"),
            }
        }
    }
}

/// Collect every child that has already finished, without blocking.
///
/// Each one is reported as `background pid N is done: <status>` and released from `jobs`.
pub fn reap_finished(jobs: &mut JobRegistry, out: &mut dyn Write) -> std::io::Result<()> {
    loop {
        let status = match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(status) => status,
            Err(Errno::ECHILD) => break,
            Err(Errno::EINTR) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "waitpid failed while reaping background jobs");
                break;
            }
        };

        let (Some(pid), Some(report)) = (status.pid(), ExitReport::from_wait_status(&status))
        else {
            continue;
        };
        if !jobs.reap(pid) {
            tracing::debug!(%pid, "reaped a child that was not tracked");
        }
        writeln!(out, "background pid {} is done: {}", pid, report)?;
    }
    out.flush()
}
