//! Fatal error type for a scan.
//!
//! Anything that reaches the top level as a `ScanError` aborts the whole run.
//! Tasks that exit while being inspected are not errors; they surface as
//! [`Lookup::Gone`](crate::model::Lookup::Gone) instead.

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;

/// Error type for malformed kernel text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

/// Conditions that abort a scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("cannot read {}: {source}", .path.display())]
    PidMax {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed {}: {source}", .path.display())]
    PidMaxFormat {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error(
        "{} is not in the scanner's pid namespace: it names us {found:?}, expected {expected}",
        .path.display()
    )]
    ForeignPidNamespace {
        path: PathBuf,
        expected: u32,
        found: String,
    },

    #[error("sysconf(_SC_NPROCESSORS_CONF) failed: {0}")]
    CpuCount(#[source] Errno),

    #[error("cannot mark cpu {cpu} in reference cpu set: {source}")]
    CpuSet {
        cpu: usize,
        #[source]
        source: Errno,
    },

    #[error("{call}({pid}) failed: {source}")]
    Syscall {
        call: &'static str,
        pid: u32,
        #[source]
        source: Errno,
    },

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("{} reports pid {found}, expected {expected}", .path.display())]
    PidMismatch {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    #[error("parent pid of {pid} disagrees: stat says {stat}, status says {status}")]
    PpidMismatch { pid: u32, stat: u32, status: u32 },

    #[error("writing output failed: {0}")]
    Output(#[source] io::Error),
}
