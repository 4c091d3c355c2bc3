//! Task information collector for Linux.
//!
//! This module gathers per-task scheduling information from two kinds of
//! source, each behind a trait so it can be mocked in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Collector                         │
//! │  ┌────────────────────────┐  ┌─────────────────────────┐ │
//! │  │      ProcReader        │  │       Scheduler         │ │
//! │  │  - /proc/[pid]/exe     │  │  - sched_getaffinity    │ │
//! │  │  - /proc/[pid]/stat    │  │  - sched_getparam       │ │
//! │  │  - /proc/[pid]/status  │  │  - sched_getscheduler   │ │
//! │  │  - sys/kernel/pid_max  │  │  - getpriority          │ │
//! │  └───────────┬────────────┘  └────────────┬────────────┘ │
//! │       ┌──────▼──────┐                     │              │
//! │       │  FileSystem │ (trait)             │ (trait)      │
//! │       └──────┬──────┘                     │              │
//! └──────────────┼────────────────────────────┼──────────────┘
//!          ┌─────┴─────┐              ┌───────┴───────┐
//!       RealFs      MockFs     RealScheduler   MockScheduler
//! ```
//!
//! # Usage
//!
//! ```
//! use dump_rtprio::collector::Collector;
//! use dump_rtprio::collector::mock::MockSystem;
//!
//! let sys = MockSystem::robot_controller();
//! let collector = Collector::new(sys.fs, sys.sched, "/proc");
//! let limits = collector.discover_limits().unwrap();
//! let record = collector.collect(41, &limits.all_cpus).unwrap();
//! assert!(record.found().is_some());
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod mock;
pub mod procfs;
pub mod sched;
pub mod traits;

pub use collector::{Collector, SystemLimits};
pub use sched::{RealScheduler, SchedPolicy, Scheduler};
pub use traits::{FileSystem, RealFs};
