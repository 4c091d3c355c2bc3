//! Per-task record assembled during a scan.
//!
//! A record is built from several independent reads of the same identifier
//! (scheduler syscalls plus `/proc/[pid]/{exe,stat,status}`) and is emitted
//! only when every read found the task.

use crate::collector::sched::SchedPolicy;

/// Outcome of a single query against a task that may have exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The task existed and the query produced a value.
    Found(T),
    /// The task no longer exists (ESRCH or a missing `/proc` entry).
    Gone,
}

impl<T> Lookup<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(v) => Lookup::Found(f(v)),
            Lookup::Gone => Lookup::Gone,
        }
    }

    /// Converts into an `Option`, dropping the distinction from a fatal error.
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::Gone => None,
        }
    }
}

/// How a task's affinity mask compares to the full set of configured CPUs.
///
/// Only the two-way decision is reported; the raw bitset is never printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuMaskSummary {
    All,
    Partial,
}

impl CpuMaskSummary {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Partial => "???",
        }
    }
}

/// Placeholder printed as the executable when `/proc/[pid]/exe` dangles.
pub const EXE_DELETED: &str = "ENOENT";

/// One fully populated row of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    /// Target of `/proc/[pid]/exe`, or [`EXE_DELETED`].
    pub exe: String,
    /// Task name from `/proc/[pid]/status` (`Name:`), already trimmed.
    pub name: String,
    pub cpumask: CpuMaskSummary,
    pub policy: SchedPolicy,
    /// Nice value from `getpriority(PRIO_PROCESS)`.
    pub nice: i32,
    /// `sched_priority` from `sched_getparam`; 0 outside real-time classes.
    pub priority: i32,
    /// The scanned identifier.
    pub tid: u32,
    /// Thread group id (`Tgid:` in status).
    pub pid: u32,
    /// Parent pid, agreed on by stat and status.
    pub ppid: u32,
    /// Stat field 4.
    pub sid: u32,
    /// CPU the task last ran on (stat field 38), if the stat line carries it.
    pub cpu: Option<u32>,
}
