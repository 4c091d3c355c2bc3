//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait allows the collector to work with both the real
//! `/proc` filesystem and in-memory fixtures in tests.

use std::io;
use std::path::{Path, PathBuf};

/// Abstraction for the filesystem operations a scan needs.
pub trait FileSystem {
    /// Reads the entire contents of a file as a string.
    ///
    /// # Arguments
    /// * `path` - Path to the file to read
    ///
    /// # Returns
    /// The file contents, or the I/O error from opening or reading it.
    /// Callers rely on `raw_os_error()` to tell ESRCH apart from other
    /// failures, so implementations must not rewrap OS errors.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Reads the target of a symbolic link.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }
}
