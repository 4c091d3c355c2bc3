//! Readers for the Linux `/proc` filesystem.
//!
//! `parser` holds pure string parsers; `process` performs the per-task reads
//! and decides which failures mean "task exited" and which are fatal.

pub mod parser;
pub mod process;

pub use parser::{ProcStat, ProcStatus};
pub use process::ProcReader;
