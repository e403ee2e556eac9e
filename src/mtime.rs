//! File existence and modification times, as seen by the freshness check.
//!
//! Freshness compares two timestamps and nothing else, so it reads them through
//! [`ModTimes`]. The CLI uses [`FsModTimes`]; tests can substitute fixed
//! timestamps without touching the clock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub trait ModTimes {
    /// True if `path` names an existing regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Last modification time of `path`, if it can be read.
    fn modified(&self, path: &Path) -> Option<SystemTime>;
}

/// Reads metadata from the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsModTimes;

impl ModTimes for FsModTimes {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

/// A fixed table of files and their timestamps.
#[derive(Debug, Clone, Default)]
pub struct FixedModTimes {
    files: HashMap<PathBuf, SystemTime>,
}

impl FixedModTimes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<PathBuf>, time: SystemTime) -> Self {
        self.files.insert(path.into(), time);
        self
    }

    pub fn set(&mut self, path: impl Into<PathBuf>, time: SystemTime) {
        self.files.insert(path.into(), time);
    }

    pub fn remove(&mut self, path: &Path) {
        self.files.remove(path);
    }
}

impl ModTimes for FixedModTimes {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.files.get(path).copied()
    }
}
