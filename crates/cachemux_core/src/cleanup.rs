//! Temporary fragment removal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A temporary file that could not be removed. Never fatal.
#[derive(Error, Debug)]
#[error("Failed to remove {}: {source}", .path.display())]
pub struct CleanupWarning {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Result of one cleanup pass.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub warnings: Vec<CleanupWarning>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Remove each path independently.
///
/// Paths that are already gone count as removed.
pub fn cleanup<P: AsRef<Path>>(paths: &[P]) -> CleanupReport {
    let mut report = CleanupReport::default();

    for path in paths {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => report.removed.push(path.to_path_buf()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                report.removed.push(path.to_path_buf())
            }
            Err(source) => {
                tracing::warn!("Failed to remove {}: {}", path.display(), source);
                report.warnings.push(CleanupWarning {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }

    report
}
