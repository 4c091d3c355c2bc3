//! Scheduler queries: affinity, policy, real-time priority and nice value.
//!
//! The `Scheduler` trait returns raw `Errno` failures; [`classify`] turns
//! ESRCH into [`Lookup::Gone`] and everything else into a fatal
//! [`ScanError::Syscall`], so the real and mock backends share one policy.

use nix::errno::Errno;
use nix::sched::CpuSet;
use nix::unistd::Pid;

use crate::error::ScanError;
use crate::model::Lookup;

/// Not exported by every libc target.
const SCHED_DEADLINE: libc::c_int = 6;
/// Flag the kernel ORs into `sched_getscheduler` results.
const SCHED_RESET_ON_FORK: libc::c_int = 0x4000_0000;

/// Scheduling class of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedPolicy {
    Other,
    Batch,
    Idle,
    Fifo,
    RoundRobin,
    Deadline,
    Unknown(i32),
}

impl SchedPolicy {
    /// Maps a raw `sched_getscheduler` result, ignoring the reset-on-fork flag.
    pub fn from_raw(raw: i32) -> Self {
        match raw & !SCHED_RESET_ON_FORK {
            libc::SCHED_OTHER => Self::Other,
            libc::SCHED_BATCH => Self::Batch,
            libc::SCHED_IDLE => Self::Idle,
            libc::SCHED_FIFO => Self::Fifo,
            libc::SCHED_RR => Self::RoundRobin,
            SCHED_DEADLINE => Self::Deadline,
            _ => Self::Unknown(raw),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Other => "OTHER",
            Self::Batch => "BATCH",
            Self::Idle => "IDLE",
            Self::Fifo => "FIFO",
            Self::RoundRobin => "RR",
            Self::Deadline => "DEADLINE",
            Self::Unknown(_) => "???",
        }
    }
}

/// Abstraction over the scheduler syscalls a scan needs.
///
/// Every per-task method receives the scanned identifier (never 0, which
/// the kernel would read as "the caller").
pub trait Scheduler {
    /// Number of configured logical processors.
    fn configured_cpus(&self) -> Result<usize, Errno>;

    fn affinity(&self, pid: u32) -> Result<CpuSet, Errno>;

    /// `sched_priority` from the task's scheduling parameters.
    fn rt_priority(&self, pid: u32) -> Result<i32, Errno>;

    /// Raw policy value as returned by the kernel.
    fn policy(&self, pid: u32) -> Result<i32, Errno>;

    fn nice(&self, pid: u32) -> Result<i32, Errno>;
}

/// Folds a raw scheduler result into the scan's three-way outcome.
pub fn classify<T>(
    call: &'static str,
    pid: u32,
    result: Result<T, Errno>,
) -> Result<Lookup<T>, ScanError> {
    match result {
        Ok(value) => Ok(Lookup::Found(value)),
        Err(Errno::ESRCH) => Ok(Lookup::Gone),
        Err(source) => Err(ScanError::Syscall { call, pid, source }),
    }
}

/// Builds the reference set with CPUs `0..count` marked present.
pub fn full_cpu_set(count: usize) -> Result<CpuSet, ScanError> {
    let mut set = CpuSet::new();
    for cpu in 0..count {
        set.set(cpu)
            .map_err(|source| ScanError::CpuSet { cpu, source })?;
    }
    Ok(set)
}

/// Scheduler backed by the running kernel.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealScheduler;

impl RealScheduler {
    pub fn new() -> Self {
        Self
    }
}

/// Identifiers that do not fit a `pid_t` cannot name a live task.
fn raw_pid(pid: u32) -> Result<libc::pid_t, Errno> {
    libc::pid_t::try_from(pid).map_err(|_| Errno::ESRCH)
}

impl Scheduler for RealScheduler {
    fn configured_cpus(&self) -> Result<usize, Errno> {
        // SAFETY: sysconf has no memory-safety preconditions.
        let count = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_CONF) };
        if count < 0 {
            return Err(Errno::last());
        }
        usize::try_from(count).map_err(|_| Errno::EOVERFLOW)
    }

    fn affinity(&self, pid: u32) -> Result<CpuSet, Errno> {
        nix::sched::sched_getaffinity(Pid::from_raw(raw_pid(pid)?))
    }

    fn rt_priority(&self, pid: u32) -> Result<i32, Errno> {
        let pid = raw_pid(pid)?;
        // SAFETY: sched_param is plain old data; all-zero is a valid value.
        let mut param: libc::sched_param = unsafe { std::mem::zeroed() };
        // SAFETY: `param` is a valid, writable sched_param.
        Errno::result(unsafe { libc::sched_getparam(pid, &mut param) })?;
        Ok(param.sched_priority)
    }

    fn policy(&self, pid: u32) -> Result<i32, Errno> {
        let pid = raw_pid(pid)?;
        // SAFETY: plain syscall wrapper taking a pid by value.
        Errno::result(unsafe { libc::sched_getscheduler(pid) })
    }

    fn nice(&self, pid: u32) -> Result<i32, Errno> {
        let pid = raw_pid(pid)? as libc::id_t;
        // -1 is a valid nice value, so only errno can tell failure apart.
        Errno::clear();
        // SAFETY: plain syscall wrapper taking its arguments by value.
        let value = unsafe { libc::getpriority(libc::PRIO_PROCESS, pid) };
        if value == -1 && Errno::last_raw() != 0 {
            return Err(Errno::last());
        }
        Ok(value)
    }
}
