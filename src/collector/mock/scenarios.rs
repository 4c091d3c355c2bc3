//! Pre-built mock systems for testing.
//!
//! These scenarios pair a [`MockFs`] with a [`MockScheduler`] so that the
//! procfs view and the scheduler view of each task agree.

use nix::sched::CpuSet;

use super::filesystem::MockFs;
use super::scheduler::{MockScheduler, MockTask, cpu_mask};

/// Formats a `/proc/[pid]/stat` line with the given identity fields.
pub fn stat_line(pid: u32, comm: &str, ppid: u32, sid: u32, processor: u32) -> String {
    format!(
        "{pid} ({comm}) S {ppid} {sid} {sid} 0 -1 4194560 120 0 0 0 3 1 0 0 20 0 1 0 4200 \
         10485760 300 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 {processor} 0 0 0 0 0\n"
    )
}

/// Formats a `/proc/[pid]/status` file with the given identity fields.
pub fn status_text(name: &str, tgid: u32, pid: u32, ppid: u32) -> String {
    format!(
        "Name:\t{name}\nUmask:\t0022\nState:\tS (sleeping)\nTgid:\t{tgid}\nNgid:\t0\n\
         Pid:\t{pid}\nPPid:\t{ppid}\nTracerPid:\t0\nUid:\t0\t0\t0\t0\n"
    )
}

fn first_cpu(mask: &CpuSet) -> u32 {
    (0..CpuSet::count())
        .find(|&cpu| mask.is_set(cpu).unwrap_or(false))
        .unwrap_or(0) as u32
}

/// A mock procfs plus scheduler.
#[derive(Debug, Clone)]
pub struct MockSystem {
    pub fs: MockFs,
    pub sched: MockScheduler,
}

/// Identity of a mock task as procfs reports it.
#[derive(Debug, Clone, Copy)]
pub struct TaskIdentity<'a> {
    pub tid: u32,
    pub tgid: u32,
    pub ppid: u32,
    pub sid: u32,
    pub name: &'a str,
    /// `None` leaves `/proc/[tid]/exe` dangling, as for kernel threads.
    pub exe: Option<&'a str>,
}

impl MockSystem {
    /// Creates an empty system with `cpus` processors and the given pid limit.
    ///
    /// `/proc/self` names the running process, so the system passes the pid
    /// namespace check.
    pub fn new(cpus: usize, pid_max: u32) -> Self {
        let mut fs = MockFs::new();
        fs.add_file("/proc/sys/kernel/pid_max", format!("{}\n", pid_max));
        fs.add_link("/proc/self", std::process::id().to_string());
        Self {
            fs,
            sched: MockScheduler::new(cpus),
        }
    }

    /// Adds a task to both views. The stat `processor` field is the first CPU
    /// in the task's affinity mask.
    pub fn add_task(&mut self, id: TaskIdentity<'_>, task: MockTask) {
        self.fs.add_process(
            id.tid,
            id.exe,
            &stat_line(id.tid, id.name, id.ppid, id.sid, first_cpu(&task.affinity)),
            &status_text(id.name, id.tgid, id.tid, id.ppid),
        );
        self.sched.add_task(id.tid, task);
    }

    /// A dual-core robot controller: init, kernel threads, a threaded user
    /// program with real-time workers.
    ///
    /// | tid | name           | policy      | mask | exe                         |
    /// |-----|----------------|-------------|------|-----------------------------|
    /// | 1   | init           | OTHER       | all  | /sbin/init                  |
    /// | 2   | kthreadd       | OTHER       | all  | (none)                      |
    /// | 9   | ksoftirqd/0    | OTHER       | 0    | (none)                      |
    /// | 15  | irq/45-can0    | FIFO 50     | all  | (none)                      |
    /// | 30  | sshd           | OTHER nice 0| all  | /usr/sbin/sshd              |
    /// | 40  | frcUserProgram | OTHER -5    | all  | /home/lvuser/frcUserProgram |
    /// | 41  | robot loop     | FIFO 40     | 1    | /home/lvuser/frcUserProgram |
    /// | 42  | (notifier)     | RR 35       | all  | /home/lvuser/frcUserProgram |
    pub fn robot_controller() -> Self {
        let all = cpu_mask(&[0, 1]);
        let mut sys = Self::new(2, 64);

        let program = Some("/home/lvuser/frcUserProgram");
        let tasks = [
            (1, 1, 0, 1, "init", Some("/sbin/init"), MockTask::other(all, 0)),
            (2, 2, 0, 0, "kthreadd", None, MockTask::other(all, 0)),
            (9, 9, 2, 0, "ksoftirqd/0", None, MockTask::other(cpu_mask(&[0]), 0)),
            (15, 15, 2, 0, "irq/45-can0", None, MockTask::fifo(all, 50)),
            (30, 30, 1, 30, "sshd", Some("/usr/sbin/sshd"), MockTask::other(all, 0)),
            (40, 40, 1, 40, "frcUserProgram", program, MockTask::other(all, -5)),
            (41, 40, 1, 40, "robot loop", program, MockTask::fifo(cpu_mask(&[1]), 40)),
            (
                42,
                40,
                1,
                40,
                "(notifier)",
                program,
                MockTask {
                    policy: libc::SCHED_RR,
                    ..MockTask::fifo(all, 35)
                },
            ),
        ];
        for (tid, tgid, ppid, sid, name, exe, task) in tasks {
            sys.add_task(
                TaskIdentity {
                    tid,
                    tgid,
                    ppid,
                    sid,
                    name,
                    exe,
                },
                task,
            );
        }
        sys
    }
}
