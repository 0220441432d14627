//! Shared fixtures for integration tests

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory tree used by the link resolution scenarios
///
/// ```text
/// d/            directory
/// d/f           10-byte file
/// link -> d/f   healthy link
/// dangling -> d/missing
/// dirlink -> d
/// ```
#[allow(dead_code)]
pub struct LinkTree {
    pub temp: TempDir,
    pub dir: PathBuf,
    pub file: PathBuf,
    pub link: PathBuf,
    pub dangling: PathBuf,
    pub dir_link: PathBuf,
}

#[allow(dead_code)]
impl LinkTree {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path();

        let dir = root.join("d");
        fs::create_dir(&dir).expect("Failed to create d");
        let file = dir.join("f");
        fs::write(&file, b"0123456789").expect("Failed to write d/f");

        let link = root.join("link");
        symlink(&file, &link).expect("Failed to create link");

        let dangling = root.join("dangling");
        symlink(dir.join("missing"), &dangling).expect("Failed to create dangling link");

        let dir_link = root.join("dirlink");
        symlink(&dir, &dir_link).expect("Failed to create dirlink");

        Self {
            temp,
            dir,
            file,
            link,
            dangling,
            dir_link,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }
}

/// `file://` URI for a local path
#[allow(dead_code)]
pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// `file-sidecar-<machine>://` URI for a local path
#[allow(dead_code)]
pub fn sidecar_uri(machine: &str, path: &Path) -> String {
    format!("file-sidecar-{machine}://{}", path.display())
}
