//! Per-task readers for `/proc/[pid]/{exe,stat,status}`.
//!
//! Each reader classifies its failure: a task that has exited yields
//! [`Lookup::Gone`], anything else is a fatal [`ScanError`]. The readers also
//! enforce the identifier cross-checks between the files.

use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::collector::procfs::parser::{
    ProcStat, ProcStatus, parse_pid_max, parse_proc_stat, parse_proc_status,
};
use crate::collector::traits::FileSystem;
use crate::error::ScanError;
use crate::model::{EXE_DELETED, Lookup};

/// Reads per-task files below a proc root.
pub struct ProcReader<F: FileSystem> {
    fs: F,
    proc_path: PathBuf,
}

fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

fn is_no_such_process(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ESRCH)
}

impl<F: FileSystem> ProcReader<F> {
    /// Creates a reader.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    pub fn proc_path(&self) -> &Path {
        &self.proc_path
    }

    fn task_file(&self, pid: u32, file: &str) -> PathBuf {
        self.proc_path.join(pid.to_string()).join(file)
    }

    /// Reads the kernel's pid limit from `sys/kernel/pid_max`.
    pub fn read_pid_max(&self) -> Result<u32, ScanError> {
        let path = self.proc_path.join("sys/kernel/pid_max");
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|source| ScanError::PidMax {
                path: path.clone(),
                source,
            })?;
        parse_pid_max(&content).map_err(|source| ScanError::PidMaxFormat { path, source })
    }

    /// Checks that the proc root belongs to the caller's pid namespace.
    ///
    /// Scheduler calls always resolve identifiers in the caller's namespace,
    /// so a proc root from any other namespace would pair each task's files
    /// with a different task's scheduling state. `self` must name `own_pid`.
    pub fn check_pid_namespace(&self, own_pid: u32) -> Result<(), ScanError> {
        let path = self.proc_path.join("self");
        let target = self
            .fs
            .read_link(&path)
            .map_err(|source| ScanError::Read {
                path: path.clone(),
                source,
            })?;
        let found = target.to_string_lossy();
        if found.parse::<u32>().ok() != Some(own_pid) {
            return Err(ScanError::ForeignPidNamespace {
                path,
                expected: own_pid,
                found: found.into_owned(),
            });
        }
        Ok(())
    }

    fn read_task_file(&self, path: &Path) -> Result<Lookup<String>, ScanError> {
        match self.fs.read_to_string(path) {
            Ok(content) => Ok(Lookup::Found(content)),
            Err(e) if is_not_found(&e) || is_no_such_process(&e) => {
                trace!("{} gone: {}", path.display(), e);
                Ok(Lookup::Gone)
            }
            Err(source) => Err(ScanError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Resolves `/proc/[pid]/exe`.
    ///
    /// A dangling link (kernel threads, unlinked binaries) is not an error and
    /// yields [`EXE_DELETED`].
    pub fn read_exe(&self, pid: u32) -> Result<Lookup<String>, ScanError> {
        let path = self.task_file(pid, "exe");
        match self.fs.read_link(&path) {
            Ok(target) => Ok(Lookup::Found(target.to_string_lossy().into_owned())),
            Err(e) if is_not_found(&e) => Ok(Lookup::Found(EXE_DELETED.to_string())),
            Err(e) if is_no_such_process(&e) => Ok(Lookup::Gone),
            Err(source) => Err(ScanError::Read { path, source }),
        }
    }

    /// Reads `/proc/[pid]/stat` and checks that it describes `pid`.
    pub fn read_stat(&self, pid: u32) -> Result<Lookup<ProcStat>, ScanError> {
        let path = self.task_file(pid, "stat");
        let Lookup::Found(content) = self.read_task_file(&path)? else {
            return Ok(Lookup::Gone);
        };
        let stat = parse_proc_stat(&content).map_err(|source| ScanError::Malformed {
            path: path.clone(),
            source,
        })?;
        if stat.pid != pid {
            return Err(ScanError::PidMismatch {
                path,
                expected: pid,
                found: stat.pid,
            });
        }
        Ok(Lookup::Found(stat))
    }

    /// Reads `/proc/[pid]/status`, checking its `Pid` against `pid` and its
    /// `PPid` against the parent already read from stat.
    pub fn read_status(&self, pid: u32, stat_ppid: u32) -> Result<Lookup<ProcStatus>, ScanError> {
        let path = self.task_file(pid, "status");
        let Lookup::Found(content) = self.read_task_file(&path)? else {
            return Ok(Lookup::Gone);
        };
        let status = parse_proc_status(&content).map_err(|source| ScanError::Malformed {
            path: path.clone(),
            source,
        })?;
        if status.pid != pid {
            return Err(ScanError::PidMismatch {
                path,
                expected: pid,
                found: status.pid,
            });
        }
        if status.ppid != stat_ppid {
            return Err(ScanError::PpidMismatch {
                pid,
                stat: stat_ppid,
                status: status.ppid,
            });
        }
        Ok(Lookup::Found(status))
    }
}
