//! Built-in health tests

use super::{CheckContext, TestFunc, TestOutcome};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

const WRITE_MARKER: &str = ".hcheck_write";

/// Always available. Registered by every [`Registry`](super::Registry) so the
/// endpoint reports something meaningful before any test is added.
pub async fn default_check(_ctx: CheckContext) -> TestOutcome {
    TestOutcome::available()
}

/// Checks that each path exists and accepts writes.
///
/// Available when every path passes, Degraded when only some do, Unavailable
/// when none do or the deadline passes first.
pub struct FilesystemCheck {
    paths: Vec<PathBuf>,
}

impl FilesystemCheck {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    async fn inspect(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for path in &self.paths {
            let metadata = match fs::metadata(path).await {
                Ok(metadata) => metadata,
                Err(_) => {
                    issues.push(format!("path does not exist: {}", path.display()));
                    continue;
                }
            };

            if !is_writable(path, metadata.is_dir()).await {
                issues.push(format!("cannot write to path: {}", path.display()));
            }
        }

        issues
    }
}

/// Writes and removes a marker file in `path`, or in its parent when `path`
/// is not a directory.
async fn is_writable(path: &Path, is_dir: bool) -> bool {
    let dir = if is_dir {
        path
    } else {
        match path.parent() {
            Some(parent) => parent,
            None => return false,
        }
    };

    let marker = dir.join(WRITE_MARKER);
    match fs::write(&marker, b"hcheck").await {
        Ok(_) => {
            let _ = fs::remove_file(&marker).await;
            true
        }
        Err(_) => false,
    }
}

#[async_trait]
impl TestFunc for FilesystemCheck {
    async fn check(&self, ctx: CheckContext) -> TestOutcome {
        let issues = match ctx.run_until(self.inspect()).await {
            Some(issues) => issues,
            None => return TestOutcome::unavailable("filesystem check cancelled"),
        };

        if issues.is_empty() {
            TestOutcome::available()
        } else if issues.len() < self.paths.len() {
            TestOutcome::degraded(issues.join(", "))
        } else {
            TestOutcome::unavailable(issues.join(", "))
        }
    }
}
