//! In-memory mock filesystem for testing readers without a real `/proc`.

use crate::collector::traits::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores files, symbolic links and injected errno failures in memory,
/// allowing tests to simulate `/proc` states (including tasks that vanish
/// mid-read) without a live kernel.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Map from link path to link target.
    links: HashMap<PathBuf, PathBuf>,
    /// Paths whose reads fail with the given raw OS error.
    errors: HashMap<PathBuf, i32>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files.insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Adds a symbolic link pointing at `target`.
    pub fn add_link(&mut self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        self.links
            .insert(path.as_ref().to_path_buf(), target.as_ref().to_path_buf());
    }

    /// Makes every read of `path` fail with `errno`, e.g. `libc::ESRCH`.
    ///
    /// Takes precedence over any file or link at the same path.
    pub fn add_error(&mut self, path: impl AsRef<Path>, errno: i32) {
        self.errors.insert(path.as_ref().to_path_buf(), errno);
    }

    /// Removes every file, link and error below `/proc/[pid]`, simulating an
    /// exited task.
    pub fn remove_process(&mut self, pid: u32) {
        let base = PathBuf::from(format!("/proc/{}", pid));
        self.files.retain(|p, _| !p.starts_with(&base));
        self.links.retain(|p, _| !p.starts_with(&base));
        self.errors.retain(|p, _| !p.starts_with(&base));
    }

    /// Adds a task with its `/proc/[pid]/` entries.
    ///
    /// # Arguments
    /// * `pid` - Task ID
    /// * `exe` - Target of `/proc/[pid]/exe`; `None` leaves the link dangling
    /// * `stat` - Content of `/proc/[pid]/stat`
    /// * `status` - Content of `/proc/[pid]/status`
    pub fn add_process(&mut self, pid: u32, exe: Option<&str>, stat: &str, status: &str) {
        let base = PathBuf::from(format!("/proc/{}", pid));
        if let Some(exe) = exe {
            self.add_link(base.join("exe"), exe);
        }
        self.add_file(base.join("stat"), stat);
        self.add_file(base.join("status"), status);
    }

    fn injected_error(&self, path: &Path) -> Option<io::Error> {
        self.errors
            .get(path)
            .map(|&errno| io::Error::from_raw_os_error(errno))
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if let Some(err) = self.injected_error(path) {
            return Err(err);
        }
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        if let Some(err) = self.injected_error(path) {
            return Err(err);
        }
        self.links.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("link not found: {:?}", path),
            )
        })
    }
}
