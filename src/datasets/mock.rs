//! In-process stand-in for the datasets binary.

use crate::datasets::runner::{ToolOutput, ToolRunner};
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub args: Vec<String>,
    pub current_dir: PathBuf,
}

impl RecordedCall {
    pub fn is_preview(&self) -> bool {
        self.args.iter().any(|a| a == "--preview")
    }

    pub fn is_download(&self) -> bool {
        self.args.first().is_some_and(|a| a == "download") && !self.is_preview()
    }
}

pub struct RecordingRunner {
    version: ToolOutput,
    preview: ToolOutput,
    download: ToolOutput,
    archive: Option<Vec<u8>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            version: ToolOutput::ok("datasets version: 16.22.1\n"),
            preview: ToolOutput::ok(r#"{"record_count": 1}"#),
            download: ToolOutput::ok(""),
            archive: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_version(mut self, output: ToolOutput) -> Self {
        self.version = output;
        self
    }

    pub fn with_preview(mut self, output: ToolOutput) -> Self {
        self.preview = output;
        self
    }

    pub fn with_download(mut self, output: ToolOutput) -> Self {
        self.download = output;
        self
    }

    /// Bytes written to the `--filename` target on a successful download.
    pub fn with_archive(mut self, bytes: Vec<u8>) -> Self {
        self.archive = Some(bytes);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn download_calls(&self) -> usize {
        self.calls().iter().filter(|c| c.is_download()).count()
    }
}

impl ToolRunner for RecordingRunner {
    fn run(&self, args: &[String], current_dir: &Path) -> Result<ToolOutput> {
        let call = RecordedCall {
            args: args.to_vec(),
            current_dir: current_dir.to_path_buf(),
        };
        self.calls.lock().unwrap().push(call.clone());

        if args.first().is_some_and(|a| a == "--version") {
            return Ok(self.version.clone());
        }
        if call.is_preview() {
            return Ok(self.preview.clone());
        }

        if self.download.success {
            if let Some(ref bytes) = self.archive {
                let filename = args
                    .iter()
                    .skip_while(|a| *a != "--filename")
                    .nth(1)
                    .expect("download call without --filename");
                std::fs::write(current_dir.join(filename), bytes)?;
            }
        }
        Ok(self.download.clone())
    }

    fn program(&self) -> String {
        "datasets".to_string()
    }
}
