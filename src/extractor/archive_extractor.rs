use crate::error::{FetchError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

/// `temp_{family}`
pub fn scratch_dir_name(family: &str) -> String {
    format!("temp_{}", family)
}

/// Unpacks downloaded archives into per-family scratch directories.
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    work_dir: PathBuf,
}

impl ArchiveExtractor {
    pub fn new<P: Into<PathBuf>>(work_dir: P) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    pub fn scratch_dir(&self, family: &str) -> PathBuf {
        self.work_dir.join(scratch_dir_name(family))
    }

    /// Extracts every entry of `archive` into the family's scratch
    /// directory. A missing archive fails before anything is created.
    /// Existing scratch contents are overwritten entry by entry.
    pub fn extract(&self, archive: &Path, family: &str) -> Result<PathBuf> {
        if !archive.is_file() {
            return Err(FetchError::ArchiveNotFound {
                path: archive.display().to_string(),
            });
        }

        info!("Extracting and organizing files from {}...", archive.display());

        let file = fs::File::open(archive)?;
        let mut zip = ZipArchive::new(file).map_err(|e| FetchError::Archive {
            message: format!("Failed to read zip archive {}", archive.display()),
            source: e,
        })?;

        let scratch = self.scratch_dir(family);
        fs::create_dir_all(&scratch)?;

        debug!(
            "Unpacking {} entries into {}",
            zip.len(),
            scratch.display()
        );
        zip.extract(&scratch).map_err(|e| FetchError::Archive {
            message: format!("Failed to extract {}", archive.display()),
            source: e,
        })?;

        Ok(scratch)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::write_zip;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scratch_dir_name() {
        assert_eq!(scratch_dir_name("gobiidae"), "temp_gobiidae");
        let extractor = ArchiveExtractor::new("/work");
        assert_eq!(
            extractor.scratch_dir("gobiidae"),
            PathBuf::from("/work/temp_gobiidae")
        );
    }

    #[test]
    fn test_missing_archive_creates_nothing() {
        let work_dir = TempDir::new().unwrap();
        let extractor = ArchiveExtractor::new(work_dir.path());

        let result = extractor.extract(&work_dir.path().join("absent.zip"), "gobiidae");

        assert!(matches!(result, Err(FetchError::ArchiveNotFound { .. })));
        assert!(!extractor.scratch_dir("gobiidae").exists());
    }

    #[test]
    fn test_extract_nested_entries() {
        let work_dir = TempDir::new().unwrap();
        let archive = work_dir.path().join("data.zip");
        write_zip(
            &archive,
            &[
                ("ncbi_dataset/data/GCF_1/cds_from_genomic.fna", ">seq\nATG\n"),
                ("README.md", "readme"),
            ],
        );

        let extractor = ArchiveExtractor::new(work_dir.path());
        let scratch = extractor.extract(&archive, "gobiidae").unwrap();

        assert_eq!(scratch, work_dir.path().join("temp_gobiidae"));
        assert_eq!(
            fs::read_to_string(scratch.join("ncbi_dataset/data/GCF_1/cds_from_genomic.fna"))
                .unwrap(),
            ">seq\nATG\n"
        );
        assert!(scratch.join("README.md").exists());
    }

    #[test]
    fn test_corrupt_archive_is_error() {
        let work_dir = TempDir::new().unwrap();
        let archive = work_dir.path().join("broken.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let result = ArchiveExtractor::new(work_dir.path()).extract(&archive, "gobiidae");
        assert!(matches!(result, Err(FetchError::Archive { .. })));
    }
}
