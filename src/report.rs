use crate::config::Config;
use crate::datasets::ContentKind;
use crate::extractor::OrganizedFile;
use crate::scanner::AnnotationKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyReport {
    pub family: String,
    pub record_count: u64,
    pub taxa: Vec<TaxonResult>,
    pub cds_directory: PathBuf,
    pub gff_directory: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_used: ConfigSnapshot,
}

/// Step at which a taxon stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStep {
    Download,
    Organize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonResult {
    pub taxon: String,
    pub success: bool,
    pub organized: Vec<OrganizedFile>,
    pub unmatched_listing: Vec<PathBuf>,
    pub failed_step: Option<FailedStep>,
    pub error: Option<String>,
}

impl TaxonResult {
    pub fn failed<S: Into<String>>(taxon: &str, step: FailedStep, error: S) -> Self {
        Self {
            taxon: taxon.to_string(),
            success: false,
            organized: Vec::new(),
            unmatched_listing: Vec::new(),
            failed_step: Some(step),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub tool_path: PathBuf,
    pub assembly_level: String,
    pub include: Vec<ContentKind>,
    pub work_directory: PathBuf,
}

impl From<&Config> for ConfigSnapshot {
    fn from(config: &Config) -> Self {
        Self {
            tool_path: config.datasets.tool_path.clone(),
            assembly_level: config.datasets.assembly_level.clone(),
            include: config.content_kinds(),
            work_directory: config.download.work_directory.clone(),
        }
    }
}

impl FamilyReport {
    pub fn new(family: &str, config: &Config) -> Self {
        let now = Utc::now();
        Self {
            family: family.to_string(),
            record_count: 0,
            taxa: Vec::new(),
            cds_directory: config.cds_directory(),
            gff_directory: config.gff_directory(),
            started_at: now,
            finished_at: now,
            config_used: ConfigSnapshot::from(config),
        }
    }

    pub fn taxa_total(&self) -> usize {
        self.taxa.len()
    }

    pub fn taxa_succeeded(&self) -> usize {
        self.taxa.iter().filter(|t| t.success).count()
    }

    pub fn is_success(&self) -> bool {
        self.taxa_succeeded() > 0
    }

    pub fn files_of_kind(&self, kind: AnnotationKind) -> Vec<&OrganizedFile> {
        self.taxa
            .iter()
            .flat_map(|t| t.organized.iter())
            .filter(|f| f.kind == kind)
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.taxa
            .iter()
            .filter_map(|t| t.error.as_ref().map(|e| format!("{}: {}", t.taxon, e)))
            .collect()
    }

    /// Step of the last failed taxon, if any failed.
    pub fn failed_step(&self) -> Option<FailedStep> {
        self.taxa.iter().rev().find_map(|t| t.failed_step)
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }
}
