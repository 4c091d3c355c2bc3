//! Main collector that combines the procfs reader and the scheduler.
//!
//! The `Collector` discovers system limits once, then assembles one
//! `ProcessRecord` per identifier. Every query for an identifier is a
//! separate, unsynchronized read, so a task may vanish between any two of
//! them; the first query that finds it gone ends that identifier.

use std::path::PathBuf;

use nix::sched::CpuSet;
use tracing::{debug, trace};

use crate::collector::procfs::ProcReader;
use crate::collector::sched::{SchedPolicy, Scheduler, classify, full_cpu_set};
use crate::collector::traits::FileSystem;
use crate::error::ScanError;
use crate::model::{CpuMaskSummary, Lookup, ProcessRecord};

/// System-wide values read once before a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemLimits {
    /// Upper bound of the scanned identifier range (inclusive).
    pub pid_max: u32,
    /// Number of configured logical processors.
    pub cpu_count: usize,
    /// Reference mask with every configured CPU set.
    pub all_cpus: CpuSet,
}

/// Assembles per-task records from procfs and the scheduler.
pub struct Collector<F: FileSystem, S: Scheduler> {
    reader: ProcReader<F>,
    sched: S,
}

fn gone<T>(tid: u32, source: &str) -> Result<Lookup<T>, ScanError> {
    trace!(tid, source, "task gone");
    Ok(Lookup::Gone)
}

impl<F: FileSystem, S: Scheduler> Collector<F, S> {
    /// Creates a new collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `sched` - Scheduler implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, sched: S, proc_path: impl Into<PathBuf>) -> Self {
        Self {
            reader: ProcReader::new(fs, proc_path),
            sched,
        }
    }

    /// Reads pid_max and the processor count, and checks that the proc root
    /// shares the scheduler's pid namespace. Failure here is fatal.
    pub fn discover_limits(&self) -> Result<SystemLimits, ScanError> {
        let pid_max = self.reader.read_pid_max()?;
        self.reader.check_pid_namespace(std::process::id())?;
        let cpu_count = self
            .sched
            .configured_cpus()
            .map_err(ScanError::CpuCount)?;
        let all_cpus = full_cpu_set(cpu_count)?;
        debug!(
            pid_max,
            cpu_count,
            proc = %self.reader.proc_path().display(),
            "discovered system limits"
        );
        Ok(SystemLimits {
            pid_max,
            cpu_count,
            all_cpus,
        })
    }

    /// Collects the record for one identifier.
    ///
    /// Returns `Lookup::Gone` as soon as any query finds the task gone, so a
    /// partial record is never produced.
    pub fn collect(&self, tid: u32, all_cpus: &CpuSet) -> Result<Lookup<ProcessRecord>, ScanError> {
        let Lookup::Found(mask) = classify("sched_getaffinity", tid, self.sched.affinity(tid))?
        else {
            return gone(tid, "sched_getaffinity");
        };
        let Lookup::Found(priority) =
            classify("sched_getparam", tid, self.sched.rt_priority(tid))?
        else {
            return gone(tid, "sched_getparam");
        };
        let Lookup::Found(policy) =
            classify("sched_getscheduler", tid, self.sched.policy(tid))?.map(SchedPolicy::from_raw)
        else {
            return gone(tid, "sched_getscheduler");
        };
        let Lookup::Found(exe) = self.reader.read_exe(tid)? else {
            return gone(tid, "exe");
        };
        let Lookup::Found(nice) = classify("getpriority", tid, self.sched.nice(tid))? else {
            return gone(tid, "getpriority");
        };
        let Lookup::Found(stat) = self.reader.read_stat(tid)? else {
            return gone(tid, "stat");
        };
        let Lookup::Found(status) = self.reader.read_status(tid, stat.ppid)? else {
            return gone(tid, "status");
        };

        let cpumask = if mask == *all_cpus {
            CpuMaskSummary::All
        } else {
            CpuMaskSummary::Partial
        };

        Ok(Lookup::Found(ProcessRecord {
            exe,
            name: status.name,
            cpumask,
            policy,
            nice,
            priority,
            tid,
            pid: status.tgid,
            ppid: stat.ppid,
            sid: stat.sid,
            cpu: stat.processor,
        }))
    }
}
