//! CSV output and the scan driver.
//!
//! Output is one header line followed by one line per task that was present
//! for every query. Fields are written verbatim, without quoting.

use std::io::Write;

use nix::sched::CpuSet;
use tracing::info;

use crate::collector::{Collector, FileSystem, Scheduler};
use crate::error::ScanError;
use crate::model::ProcessRecord;

/// Column names, in row order.
pub const HEADER: &str = "exe,name,cpumask,policy,nice,priority,tid,pid,ppid,sid,cpu";

/// Printed in the `cpu` column when the stat line has no `processor` field.
const UNKNOWN_CPU: &str = "???";

/// Counters for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Identifiers queried.
    pub scanned: u32,
    /// Rows written.
    pub emitted: u32,
}

/// Formats one record as a CSV row (without the trailing newline).
pub fn format_row(record: &ProcessRecord) -> String {
    let cpu = record
        .cpu
        .map(|c| c.to_string())
        .unwrap_or_else(|| UNKNOWN_CPU.to_string());
    format!(
        "{},{},{},{},{},{},{},{},{},{},{}",
        record.exe,
        record.name,
        record.cpumask.as_str(),
        record.policy.as_str(),
        record.nice,
        record.priority,
        record.tid,
        record.pid,
        record.ppid,
        record.sid,
        cpu
    )
}

/// Scans the given identifiers and writes a row for each task found.
///
/// Identifier 0 is skipped: the scheduler calls treat it as the caller.
pub fn scan_pids<F, S, W>(
    collector: &Collector<F, S>,
    pids: impl IntoIterator<Item = u32>,
    all_cpus: &CpuSet,
    out: &mut W,
) -> Result<ScanSummary, ScanError>
where
    F: FileSystem,
    S: Scheduler,
    W: Write,
{
    let mut summary = ScanSummary::default();
    for tid in pids.into_iter().filter(|&tid| tid != 0) {
        summary.scanned += 1;
        if let Some(record) = collector.collect(tid, all_cpus)?.found() {
            writeln!(out, "{}", format_row(&record)).map_err(ScanError::Output)?;
            summary.emitted += 1;
        }
    }
    Ok(summary)
}

/// Writes the header, discovers system limits, then scans `1..=pid_max`.
pub fn run_scan<F, S, W>(collector: &Collector<F, S>, out: &mut W) -> Result<ScanSummary, ScanError>
where
    F: FileSystem,
    S: Scheduler,
    W: Write,
{
    writeln!(out, "{}", HEADER).map_err(ScanError::Output)?;

    let limits = collector.discover_limits()?;
    info!(
        "scanning identifiers 1..={} on {} cpus",
        limits.pid_max, limits.cpu_count
    );

    let summary = scan_pids(collector, 1..=limits.pid_max, &limits.all_cpus, out)?;
    out.flush().map_err(ScanError::Output)?;

    info!(
        "scan finished: {} identifiers, {} rows",
        summary.scanned, summary.emitted
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::SchedPolicy;
    use crate::collector::mock::{MockFs, MockScheduler, MockSystem, MockTask, cpu_mask};
    use crate::model::CpuMaskSummary;
    use std::io;

    fn run(sys: MockSystem) -> (Result<ScanSummary, ScanError>, String) {
        let collector = Collector::new(sys.fs, sys.sched, "/proc");
        let mut out = Vec::new();
        let result = run_scan(&collector, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_header_has_eleven_columns() {
        assert_eq!(HEADER.split(',').count(), 11);
    }

    #[test]
    fn test_format_row() {
        let record = ProcessRecord {
            exe: "/usr/bin/robot".to_string(),
            name: "robot loop".to_string(),
            cpumask: CpuMaskSummary::Partial,
            policy: SchedPolicy::Fifo,
            nice: 0,
            priority: 40,
            tid: 41,
            pid: 40,
            ppid: 1,
            sid: 40,
            cpu: Some(1),
        };
        assert_eq!(
            format_row(&record),
            "/usr/bin/robot,robot loop,???,FIFO,0,40,41,40,1,40,1"
        );

        let record = ProcessRecord { cpu: None, ..record };
        assert!(format_row(&record).ends_with(",40,???"));
    }

    #[test]
    fn test_run_scan_robot_controller() {
        let (result, output) = run(MockSystem::robot_controller());
        let summary = result.unwrap();
        assert_eq!(summary.scanned, 64);
        assert_eq!(summary.emitted, 8);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                HEADER,
                "/sbin/init,init,all,OTHER,0,0,1,1,0,1,0",
                "ENOENT,kthreadd,all,OTHER,0,0,2,2,0,0,0",
                "ENOENT,ksoftirqd/0,???,OTHER,0,0,9,9,2,0,0",
                "ENOENT,irq/45-can0,all,FIFO,0,50,15,15,2,0,0",
                "/usr/sbin/sshd,sshd,all,OTHER,0,0,30,30,1,30,0",
                "/home/lvuser/frcUserProgram,frcUserProgram,all,OTHER,-5,0,40,40,1,40,0",
                "/home/lvuser/frcUserProgram,robot loop,???,FIFO,0,40,41,40,1,40,1",
                "/home/lvuser/frcUserProgram,(notifier),all,RR,0,35,42,40,1,40,0",
            ]
        );
    }

    #[test]
    fn test_every_row_is_complete_and_tid_matches() {
        let (result, output) = run(MockSystem::robot_controller());
        result.unwrap();
        let mut tids = Vec::new();
        for line in output.lines().skip(1) {
            let cols: Vec<&str> = line.split(',').collect();
            assert_eq!(cols.len(), 11, "{}", line);
            assert!(cols.iter().all(|c| !c.is_empty()), "{}", line);
            tids.push(cols[6].parse::<u32>().unwrap());
            let policy = cols[3];
            assert!(
                ["OTHER", "BATCH", "IDLE", "FIFO", "RR", "DEADLINE", "???"].contains(&policy),
                "{}",
                policy
            );
            assert!(["all", "???"].contains(&cols[2]));
        }
        assert_eq!(tids, vec![1, 2, 9, 15, 30, 40, 41, 42]);
    }

    #[test]
    fn test_vanished_tasks_produce_no_rows() {
        let mut sys = MockSystem::robot_controller();
        // 30 disappears from procfs after the scheduler saw it; 9 is gone
        // from the scheduler but still has procfs entries.
        sys.fs.remove_process(30);
        sys.sched.remove_task(9);
        let (result, output) = run(sys);

        assert_eq!(result.unwrap().emitted, 6);
        assert!(!output.contains(",30,"));
        assert!(!output.contains("ksoftirqd"));
    }

    #[test]
    fn test_deleted_executable_row_is_still_emitted() {
        let mut sys = MockSystem::new(1, 8);
        sys.sched.add_task(4, MockTask::other(cpu_mask(&[0]), 10));
        sys.fs.add_process(
            4,
            None,
            &crate::collector::mock::stat_line(4, "updater", 1, 4, 0),
            &crate::collector::mock::status_text("updater", 4, 4, 1),
        );
        let (result, output) = run(sys);

        assert_eq!(result.unwrap().emitted, 1);
        assert_eq!(
            output.lines().nth(1),
            Some("ENOENT,updater,all,OTHER,10,0,4,4,1,4,0")
        );
    }

    #[test]
    fn test_ppid_mismatch_aborts_scan() {
        let mut sys = MockSystem::robot_controller();
        sys.fs.add_file(
            "/proc/30/status",
            crate::collector::mock::status_text("sshd", 30, 30, 2),
        );
        let (result, output) = run(sys);

        assert!(matches!(
            result,
            Err(ScanError::PpidMismatch {
                pid: 30,
                stat: 1,
                status: 2
            })
        ));
        // Rows after the failing identifier are never written.
        assert!(!output.contains("frcUserProgram"));
    }

    #[test]
    fn test_missing_pid_max_aborts_after_header() {
        let sched = MockScheduler::new(1);
        let collector = Collector::new(MockFs::new(), sched, "/proc");
        let mut out = Vec::new();
        let err = run_scan(&collector, &mut out).unwrap_err();

        assert!(matches!(err, ScanError::PidMax { .. }));
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", HEADER));
    }

    #[test]
    fn test_scan_pids_skips_zero() {
        let sys = MockSystem::robot_controller();
        let collector = Collector::new(sys.fs, sys.sched, "/proc");
        let mut out = Vec::new();
        let summary = scan_pids(&collector, [0, 1, 2], &cpu_mask(&[0, 1]), &mut out).unwrap();
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.emitted, 2);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_fatal() {
        let sys = MockSystem::robot_controller();
        let collector = Collector::new(sys.fs, sys.sched, "/proc");
        let err = run_scan(&collector, &mut BrokenPipe).unwrap_err();
        assert!(matches!(err, ScanError::Output(_)));
    }
}
