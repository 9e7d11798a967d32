//! Test support utilities for vault-render integration tests.
//!
//! Provides an isolated working directory, a mock secret store, and
//! helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use store::FakeStore;
#[allow(unused_imports)]
pub use vault::MockVault;

use std::path::PathBuf;
use tempfile::TempDir;

/// Test environment with an isolated temp directory.
///
/// No process-global state is mutated: child processes use `.current_dir()`
/// and an explicit environment so tests can safely run in parallel.
pub struct Test {
    /// Temporary working directory for the test
    pub dir: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    /// Create a test environment with a template file written.
    pub fn with_template(name: &str, contents: &str) -> Self {
        let t = Self::new();
        t.write(name, contents);
        t
    }

    /// Absolute path of a file in the test directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a file in the test directory.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).expect("failed to write file");
        path
    }

    /// Read a file from the test directory.
    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).expect("failed to read file")
    }

    /// Names of all entries in the test directory.
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .expect("failed to list dir")
            .map(|e| e.expect("bad entry").file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}
