//! In-memory scheduler for testing scans without real tasks.

use std::collections::HashMap;

use nix::errno::Errno;
use nix::sched::CpuSet;

use crate::collector::sched::Scheduler;

/// Which scheduler query an injected error applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedCall {
    Affinity,
    Param,
    Policy,
    Nice,
}

/// Scheduler state of one mock task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockTask {
    pub affinity: CpuSet,
    /// Raw policy value, as `sched_getscheduler` would return it.
    pub policy: i32,
    pub rt_priority: i32,
    pub nice: i32,
}

impl MockTask {
    /// A `SCHED_OTHER` task with the given nice value.
    pub fn other(affinity: CpuSet, nice: i32) -> Self {
        Self {
            affinity,
            policy: libc::SCHED_OTHER,
            rt_priority: 0,
            nice,
        }
    }

    /// A `SCHED_FIFO` task with the given real-time priority.
    pub fn fifo(affinity: CpuSet, rt_priority: i32) -> Self {
        Self {
            affinity,
            policy: libc::SCHED_FIFO,
            rt_priority,
            nice: 0,
        }
    }
}

/// Builds a CPU set from a list of CPU indices.
///
/// # Panics
/// If an index does not fit in a `CpuSet`.
pub fn cpu_mask(cpus: &[usize]) -> CpuSet {
    let mut set = CpuSet::new();
    for &cpu in cpus {
        set.set(cpu).expect("cpu index out of range");
    }
    set
}

/// Scheduler whose tasks live in a map.
///
/// Unknown pids answer ESRCH, like the kernel does for exited tasks.
#[derive(Debug, Clone)]
pub struct MockScheduler {
    cpus: Result<usize, Errno>,
    tasks: HashMap<u32, MockTask>,
    errors: HashMap<(u32, SchedCall), Errno>,
}

impl MockScheduler {
    /// Creates a scheduler reporting `cpus` configured processors and no tasks.
    pub fn new(cpus: usize) -> Self {
        Self {
            cpus: Ok(cpus),
            tasks: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    /// Makes `configured_cpus` fail.
    pub fn fail_cpu_count(&mut self, errno: Errno) {
        self.cpus = Err(errno);
    }

    pub fn add_task(&mut self, pid: u32, task: MockTask) {
        self.tasks.insert(pid, task);
    }

    pub fn remove_task(&mut self, pid: u32) {
        self.tasks.remove(&pid);
    }

    /// Makes one query for `pid` fail with `errno`.
    pub fn add_error(&mut self, pid: u32, call: SchedCall, errno: Errno) {
        self.errors.insert((pid, call), errno);
    }

    fn task(&self, pid: u32, call: SchedCall) -> Result<&MockTask, Errno> {
        if let Some(&errno) = self.errors.get(&(pid, call)) {
            return Err(errno);
        }
        self.tasks.get(&pid).ok_or(Errno::ESRCH)
    }
}

impl Scheduler for MockScheduler {
    fn configured_cpus(&self) -> Result<usize, Errno> {
        self.cpus
    }

    fn affinity(&self, pid: u32) -> Result<CpuSet, Errno> {
        self.task(pid, SchedCall::Affinity).map(|t| t.affinity)
    }

    fn rt_priority(&self, pid: u32) -> Result<i32, Errno> {
        self.task(pid, SchedCall::Param).map(|t| t.rt_priority)
    }

    fn policy(&self, pid: u32) -> Result<i32, Errno> {
        self.task(pid, SchedCall::Policy).map(|t| t.policy)
    }

    fn nice(&self, pid: u32) -> Result<i32, Errno> {
        self.task(pid, SchedCall::Nice).map(|t| t.nice)
    }
}
