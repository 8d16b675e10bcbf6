use crate::error::{FetchError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Captured result of one external tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn ok<S: Into<String>>(stdout: S) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed<S: Into<String>>(code: i32, stderr: S) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs the datasets binary. `Err` means the process could not be started at
/// all; a non-zero exit is reported through [`ToolOutput::success`].
pub trait ToolRunner: Send + Sync {
    fn run(&self, args: &[String], current_dir: &Path) -> Result<ToolOutput>;

    /// Human-readable program name used in command lines and messages.
    fn program(&self) -> String;
}

/// Subprocess-backed runner for the NCBI `datasets` CLI.
#[derive(Debug, Clone)]
pub struct DatasetsCli {
    binary_path: PathBuf,
}

impl DatasetsCli {
    /// A relative path with a directory part is anchored to the current
    /// directory, since downloads run with the work directory as cwd.
    pub fn new<P: Into<PathBuf>>(binary_path: P) -> Self {
        Self {
            binary_path: resolve_program(binary_path.into()),
        }
    }
}

impl ToolRunner for DatasetsCli {
    fn run(&self, args: &[String], current_dir: &Path) -> Result<ToolOutput> {
        debug!(
            program = %self.binary_path.display(),
            dir = %current_dir.display(),
            "spawning {:?}",
            args
        );

        let output = Command::new(&self.binary_path)
            .args(args)
            .current_dir(current_dir)
            .output()
            .map_err(|e| FetchError::ToolUnavailable {
                path: self.binary_path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn program(&self) -> String {
        self.binary_path.display().to_string()
    }
}

/// Bare names are left for `PATH` lookup.
fn resolve_program(path: PathBuf) -> PathBuf {
    if path.is_absolute() || path.components().count() < 2 {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}
