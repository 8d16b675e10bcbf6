use crate::error::Result;
use crate::extractor::archive_extractor::ArchiveExtractor;
use crate::extractor::file_organizer::{FileOrganizer, OrganizeProgress, OrganizedFile};
use crate::scanner::AnnotationScanner;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Result of extracting and organizing one archive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizeOutcome {
    pub organized: Vec<OrganizedFile>,
    /// Files present in the scratch tree; collected only when nothing matched.
    pub unmatched_listing: Vec<PathBuf>,
    pub elapsed: Duration,
}

impl OrganizeOutcome {
    pub fn matched(&self) -> usize {
        self.organized.len()
    }

    pub fn is_success(&self) -> bool {
        self.matched() > 0
    }
}

/// Extract, scan, move, clean up.
#[derive(Debug, Clone)]
pub struct AnnotationPipeline {
    extractor: ArchiveExtractor,
    organizer: FileOrganizer,
}

impl AnnotationPipeline {
    pub fn new(extractor: ArchiveExtractor, organizer: FileOrganizer) -> Self {
        Self {
            extractor,
            organizer,
        }
    }

    pub fn extractor(&self) -> &ArchiveExtractor {
        &self.extractor
    }

    pub fn organizer(&self) -> &FileOrganizer {
        &self.organizer
    }

    /// Any error leaves the scratch directory and archive where they are;
    /// both are removed only after every move succeeded, even when nothing
    /// matched.
    pub fn extract_and_organize(
        &self,
        archive: &Path,
        family: &str,
        progress_callback: Option<&dyn Fn(&OrganizeProgress)>,
    ) -> Result<OrganizeOutcome> {
        let scratch = self.extractor.extract(archive, family)?;

        let scanner = AnnotationScanner::new(&scratch);
        let matches = scanner.scan()?;
        let (organized, progress) = self
            .organizer
            .organize(&matches, family, progress_callback)?;

        let mut unmatched_listing = Vec::new();
        if organized.is_empty() {
            warn!("No CDS or GFF files found for {}. This may indicate:", family);
            warn!("  - The genome assemblies don't have gene annotations");
            warn!("  - Annotations are in a different format");
            warn!("  - Only raw genome sequences are available");

            unmatched_listing = scanner.list_files()?;
            warn!("Available files in {} dataset:", family);
            for path in &unmatched_listing {
                warn!("  - {}", path.display());
            }
        }

        cleanup(&scratch, archive)?;

        Ok(OrganizeOutcome {
            organized,
            unmatched_listing,
            elapsed: progress.elapsed(),
        })
    }
}

fn cleanup(scratch: &Path, archive: &Path) -> Result<()> {
    fs::remove_dir_all(scratch)?;
    fs::remove_file(archive)?;
    info!(
        "Removed {} and {}",
        scratch.display(),
        archive.display()
    );
    Ok(())
}
