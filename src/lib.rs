//! dump-rtprio - scheduling diagnostics for every task on a Linux system.
//!
//! For each identifier from 1 to `pid_max`, reports the executable, name,
//! affinity, scheduling policy, nice value and real-time priority of the
//! task, plus its thread group, parent and session ids, as CSV rows.
//!
//! - `collector`: procfs and scheduler readers, with mock backends
//! - `model`: the per-task record and query outcomes
//! - `report`: CSV formatting and the scan driver
//! - `error`: the fatal error type

pub mod collector;
pub mod error;
pub mod model;
pub mod report;

pub use error::{ParseError, ScanError};
pub use report::{HEADER, ScanSummary, run_scan};
