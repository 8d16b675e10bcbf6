use crate::datasets::preview::parse_record_count;
use crate::datasets::runner::{ToolOutput, ToolRunner};
use crate::error::{FetchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Annotation content requested from the archive via `--include`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Cds,
    Gff3,
}

impl ContentKind {
    pub fn include_token(self) -> &'static str {
        match self {
            ContentKind::Cds => "cds",
            ContentKind::Gff3 => "gff3",
        }
    }

    /// Comma-separated `--include` value, always in `cds,gff3` order.
    pub fn include_param(kinds: &[ContentKind]) -> Result<String> {
        let tokens: Vec<&str> = [ContentKind::Cds, ContentKind::Gff3]
            .into_iter()
            .filter(|kind| kinds.contains(kind))
            .map(ContentKind::include_token)
            .collect();

        if tokens.is_empty() {
            return Err(FetchError::NoContentSelected);
        }
        Ok(tokens.join(","))
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Cds => write!(f, "CDS"),
            ContentKind::Gff3 => write!(f, "GFF"),
        }
    }
}

/// Archive name the download step asks the tool to write.
pub fn archive_filename(family: &str) -> String {
    format!("refseq_{}_chromosome_data.zip", family)
}

/// Builds `datasets download genome taxon` invocations on top of a runner.
#[derive(Clone)]
pub struct DatasetsClient {
    runner: Arc<dyn ToolRunner>,
    assembly_level: String,
}

impl DatasetsClient {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            assembly_level: "chromosome".to_string(),
        }
    }

    pub fn with_assembly_level<S: Into<String>>(mut self, level: S) -> Self {
        self.assembly_level = level.into();
        self
    }

    pub fn program(&self) -> String {
        self.runner.program()
    }

    /// `--version` output. Any failure means the tool is unusable.
    pub fn version(&self) -> Result<String> {
        let output = self.runner.run(&["--version".to_string()], Path::new("."))?;

        if !output.success {
            return Err(FetchError::ToolUnavailable {
                path: self.runner.program(),
                message: format!(
                    "--version exited with status {:?}: {}",
                    output.code,
                    output.stderr.trim()
                ),
            });
        }

        Ok(output.stdout.trim().to_string())
    }

    pub fn preview_args(&self, family: &str) -> Vec<String> {
        let mut args = self.taxon_args(family, "cds,gff3");
        args.push("--preview".to_string());
        args
    }

    pub fn download_args(&self, family: &str, kinds: &[ContentKind]) -> Result<Vec<String>> {
        let include = ContentKind::include_param(kinds)?;
        let mut args = self.taxon_args(family, &include);
        args.push("--filename".to_string());
        args.push(archive_filename(family));
        Ok(args)
    }

    /// Record count from a preview query. Errors cover a failed invocation
    /// and malformed JSON; see [`DatasetsClient::record_count`] for the lenient form.
    pub fn preview(&self, family: &str) -> Result<u64> {
        let args = self.preview_args(family);
        let output = self.runner.run(&args, Path::new("."))?;
        self.ensure_success(&args, &output)?;
        parse_record_count(&output.stdout)
    }

    /// Lenient availability check: every failure collapses to zero records.
    pub fn record_count(&self, family: &str) -> u64 {
        info!(
            "Searching for available {} species with {}-level assemblies...",
            family, self.assembly_level
        );

        match self.preview(family) {
            Ok(0) => {
                warn!(
                    "No {} genomes with {}-level assemblies found",
                    family, self.assembly_level
                );
                0
            }
            Ok(count) => {
                info!(
                    "Found {} {} genomes with {}-level assemblies and CDS/GFF annotations",
                    count, family, self.assembly_level
                );
                count
            }
            Err(e) => {
                error!("Error searching for {} species: {}", family, e);
                0
            }
        }
    }

    /// Downloads the archive into `work_dir` and returns its path.
    pub fn download(
        &self,
        family: &str,
        kinds: &[ContentKind],
        work_dir: &Path,
    ) -> Result<PathBuf> {
        let args = self.download_args(family, kinds)?;
        info!(
            "Downloading genome data for {} ({}-level assemblies only)...",
            family, self.assembly_level
        );
        info!("Running command: {}", self.command_line(&args));

        let output = self.runner.run(&args, work_dir)?;
        if let Err(e) = self.ensure_success(&args, &output) {
            error!("Error downloading data for {}: {}", family, e);
            if !output.stderr.trim().is_empty() {
                error!("stderr: {}", output.stderr.trim());
            }
            return Err(e);
        }

        info!("Download completed for {}", family);
        Ok(work_dir.join(archive_filename(family)))
    }

    pub fn command_line(&self, args: &[String]) -> String {
        let mut parts = Vec::with_capacity(args.len() + 1);
        parts.push(self.runner.program());
        parts.extend(args.iter().cloned());
        parts.join(" ")
    }

    fn taxon_args(&self, family: &str, include: &str) -> Vec<String> {
        vec![
            "download".to_string(),
            "genome".to_string(),
            "taxon".to_string(),
            family.to_string(),
            "--include".to_string(),
            include.to_string(),
            "--assembly-level".to_string(),
            self.assembly_level.clone(),
        ]
    }

    fn ensure_success(&self, args: &[String], output: &ToolOutput) -> Result<()> {
        if output.success {
            return Ok(());
        }
        Err(FetchError::ToolFailed {
            command: self.command_line(args),
            code: output.code,
            stderr: output.stderr.clone(),
        })
    }
}
