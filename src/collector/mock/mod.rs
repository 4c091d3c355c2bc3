//! Mock backends for testing.
//!
//! This module provides `MockFs`, `MockScheduler` and pre-built scenarios for
//! exercising a scan without a live kernel.

mod filesystem;
mod scenarios;
mod scheduler;

pub use filesystem::MockFs;
pub use scenarios::{MockSystem, TaskIdentity, stat_line, status_text};
pub use scheduler::{MockScheduler, MockTask, SchedCall, cpu_mask};
